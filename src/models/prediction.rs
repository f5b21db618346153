use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Direction, Outcome, PredictionKind};

/// Database row for the predictions table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub market_type: String,
    pub asset_symbol: Option<String>,
    pub asset_key: String,
    pub title: String,
    pub direction: String,
    pub prediction_type: String,
    pub duration_minutes: Option<i32>,
    pub target_date: Option<DateTime<Utc>>,
    pub reference_time: Option<DateTime<Utc>>,
    pub reference_price: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub data_source: Option<String>,
    pub outcome: Option<String>,
    pub evaluation_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_api_str(&self.direction)
    }

    /// The instant after which this prediction becomes eligible for
    /// evaluation: `reference_time + duration_minutes` when both are
    /// present, otherwise `target_date`.
    pub fn unlock_time(&self) -> Option<DateTime<Utc>> {
        match (self.reference_time, self.duration_minutes) {
            (Some(reference), Some(minutes)) => {
                Some(reference + Duration::minutes(minutes as i64))
            }
            _ => self.target_date,
        }
    }

}

/// Parameters for inserting a new prediction row.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: Uuid,
    pub category: String,
    pub market_type: String,
    pub asset_symbol: Option<String>,
    pub asset_key: String,
    pub title: String,
    pub direction: Direction,
    pub kind: PredictionKind,
    pub duration_minutes: Option<i32>,
    pub target_date: Option<DateTime<Utc>>,
    pub reference_time: Option<DateTime<Utc>>,
    pub reference_price: Option<Decimal>,
    pub data_source: Option<String>,
}

/// Outcome of a directional claim against a reference price.
///
/// Exact equality resolves to Incorrect for either direction — there is
/// no void/tie outcome.
pub fn judge_outcome(direction: Direction, reference: Decimal, final_price: Decimal) -> Outcome {
    let correct = match direction {
        Direction::Up => final_price > reference,
        Direction::Down => final_price < reference,
    };

    if correct {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_prediction() -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "Crypto".into(),
            market_type: "global".into(),
            asset_symbol: Some("BTC".into()),
            asset_key: "crypto:btc".into(),
            title: "Crypto: BTC - Up (5m)".into(),
            direction: "Up".into(),
            prediction_type: "intraday".into(),
            duration_minutes: Some(5),
            target_date: None,
            reference_time: Some(Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap()),
            reference_price: Some(Decimal::from(50_000)),
            final_price: None,
            data_source: None,
            outcome: None,
            evaluation_time: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_unlock_time_from_reference_and_duration() {
        let p = make_prediction();
        assert_eq!(
            p.unlock_time(),
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 12, 5, 0).unwrap())
        );
    }

    #[test]
    fn test_unlock_time_falls_back_to_target_date() {
        let mut p = make_prediction();
        p.duration_minutes = None;
        p.target_date = Some(Utc.with_ymd_and_hms(2025, 3, 4, 14, 30, 0).unwrap());
        assert_eq!(p.unlock_time(), p.target_date);
    }

    #[test]
    fn test_judge_outcome_directions() {
        let reference = Decimal::from(100);

        assert_eq!(
            judge_outcome(Direction::Up, reference, Decimal::from(101)),
            Outcome::Correct
        );
        assert_eq!(
            judge_outcome(Direction::Up, reference, Decimal::from(99)),
            Outcome::Incorrect
        );
        assert_eq!(
            judge_outcome(Direction::Down, reference, Decimal::from(99)),
            Outcome::Correct
        );
        assert_eq!(
            judge_outcome(Direction::Down, reference, Decimal::from(101)),
            Outcome::Incorrect
        );
    }

    #[test]
    fn test_judge_outcome_equality_is_incorrect() {
        let price = Decimal::new(12345, 2);
        assert_eq!(judge_outcome(Direction::Up, price, price), Outcome::Incorrect);
        assert_eq!(judge_outcome(Direction::Down, price, price), Outcome::Incorrect);
    }
}
