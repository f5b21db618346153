mod common;

use std::sync::Mutex;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use verivo::db::prediction_repo;
use verivo::models::{Category, Outcome, Prediction};
use verivo::validation::{run_batch, PriceEvaluator};

/// Deterministic evaluator: hands out scripted prices in order, repeating
/// the last one once the script runs out. `None` simulates a source that
/// cannot produce a price.
struct ScriptedEvaluator {
    category: Category,
    allows_data_unavailable: bool,
    prices: Mutex<Vec<Option<Decimal>>>,
}

impl ScriptedEvaluator {
    fn new(category: Category, allows_du: bool, prices: Vec<Option<Decimal>>) -> Self {
        Self {
            category,
            allows_data_unavailable: allows_du,
            prices: Mutex::new(prices),
        }
    }
}

impl PriceEvaluator for ScriptedEvaluator {
    fn category(&self) -> Category {
        self.category
    }

    fn allows_data_unavailable(&self) -> bool {
        self.allows_data_unavailable
    }

    async fn fetch_price(&self, _prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        let mut prices = self.prices.lock().unwrap();
        if prices.len() > 1 {
            Ok(prices.remove(0))
        } else {
            Ok(prices.first().copied().flatten())
        }
    }
}

/// Evaluator whose every fetch fails, for batch-isolation checks.
struct FailingEvaluator;

impl PriceEvaluator for FailingEvaluator {
    fn category(&self) -> Category {
        Category::Crypto
    }

    fn allows_data_unavailable(&self) -> bool {
        false
    }

    async fn fetch_price(&self, _prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        anyhow::bail!("price source exploded")
    }
}

#[tokio::test]
async fn test_unlocked_row_is_evaluated_correct() {
    let pool = common::setup_test_db().await;

    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Stocks",
        "stock:usa:aapl",
        "Up",
        "intraday",
        Some(5),
        Some(Decimal::from(100)),
        Some(Utc::now() - Duration::minutes(10)),
        None,
    )
    .await;

    let evaluator = ScriptedEvaluator::new(
        Category::Stocks,
        true,
        vec![Some(Decimal::from(105))],
    );
    let summary = run_batch(&pool, &evaluator, 50, Utc::now()).await.unwrap();
    assert!(summary.processed >= 1);

    let row = common::get_prediction(&pool, seeded.id).await;
    assert_eq!(row.outcome.as_deref(), Some("Correct"));
    assert_eq!(row.final_price, Some(Decimal::from(105)));
    assert!(row.evaluation_time.is_some());
}

#[tokio::test]
async fn test_exact_equality_resolves_incorrect() {
    let pool = common::setup_test_db().await;

    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Commodities",
        "commodity:xau",
        "Down",
        "intraday",
        Some(5),
        Some(Decimal::from(2400)),
        Some(Utc::now() - Duration::minutes(10)),
        None,
    )
    .await;

    let evaluator = ScriptedEvaluator::new(
        Category::Commodities,
        true,
        vec![Some(Decimal::from(2400))],
    );
    run_batch(&pool, &evaluator, 50, Utc::now()).await.unwrap();

    let row = common::get_prediction(&pool, seeded.id).await;
    assert_eq!(row.outcome.as_deref(), Some("Incorrect"));
    assert_eq!(row.final_price, Some(Decimal::from(2400)));
}

#[tokio::test]
async fn test_locked_row_is_untouched() {
    let pool = common::setup_test_db().await;

    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Forex",
        "forex:eur_usd",
        "Up",
        "intraday",
        Some(30),
        Some(Decimal::new(108, 2)),
        Some(Utc::now() - Duration::minutes(1)),
        None,
    )
    .await;

    let evaluator = ScriptedEvaluator::new(Category::Forex, false, vec![None]);
    run_batch(&pool, &evaluator, 50, Utc::now()).await.unwrap();

    let row = common::get_prediction(&pool, seeded.id).await;
    assert!(row.outcome.is_none());
    assert!(row.final_price.is_none());
}

#[tokio::test]
async fn test_opening_backfill_then_evaluate_in_same_run() {
    let pool = common::setup_test_db().await;

    // Opening-mode row whose session opened two hours ago: reference still
    // null, unlock (target_date) already passed.
    let opened_at = Utc::now() - Duration::hours(2);
    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Indices",
        "index:^nsei",
        "Up",
        "opening",
        None,
        None,
        Some(opened_at),
        Some(opened_at),
    )
    .await;

    // First fetch backfills the reference, second samples the final price.
    let evaluator = ScriptedEvaluator::new(
        Category::Indices,
        true,
        vec![Some(Decimal::from(24_000)), Some(Decimal::from(24_150))],
    );
    let summary = run_batch(&pool, &evaluator, 50, Utc::now()).await.unwrap();
    assert!(summary.processed >= 1);

    let row = common::get_prediction(&pool, seeded.id).await;
    assert_eq!(row.reference_price, Some(Decimal::from(24_000)));
    assert_eq!(row.final_price, Some(Decimal::from(24_150)));
    assert_eq!(row.outcome.as_deref(), Some("Correct"));
}

#[tokio::test]
async fn test_stale_unpriceable_row_marked_data_unavailable() {
    let pool = common::setup_test_db().await;

    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Crypto",
        "crypto:btc",
        "Up",
        "intraday",
        Some(5),
        Some(Decimal::from(50_000)),
        Some(Utc::now() - Duration::hours(3)),
        None,
    )
    .await;

    let evaluator = ScriptedEvaluator::new(Category::Crypto, true, vec![None]);
    run_batch(&pool, &evaluator, 50, Utc::now()).await.unwrap();

    let row = common::get_prediction(&pool, seeded.id).await;
    assert_eq!(row.outcome.as_deref(), Some("Data Unavailable"));
    assert!(row.final_price.is_none());
    assert!(row.evaluation_time.is_some());
}

#[tokio::test]
async fn test_stale_row_keeps_retrying_without_escape_hatch() {
    let pool = common::setup_test_db().await;

    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Forex",
        "forex:jpy_usd",
        "Up",
        "intraday",
        Some(5),
        Some(Decimal::new(64, 4)),
        Some(Utc::now() - Duration::hours(3)),
        None,
    )
    .await;

    let evaluator = ScriptedEvaluator::new(Category::Forex, false, vec![None]);
    run_batch(&pool, &evaluator, 50, Utc::now()).await.unwrap();

    let row = common::get_prediction(&pool, seeded.id).await;
    assert!(row.outcome.is_none(), "row should stay pending for the next run");
}

#[tokio::test]
async fn test_outcome_is_claimed_at_most_once() {
    let pool = common::setup_test_db().await;

    // Still locked: the claim guard is about the outcome column, not the
    // unlock window, and a locked row cannot be picked up by a concurrent
    // batch scan in another test.
    let seeded = common::seed_prediction(
        &pool,
        Uuid::new_v4(),
        "Stocks",
        "stock:india:reliance.ns",
        "Down",
        "intraday",
        Some(30),
        Some(Decimal::from(3000)),
        Some(Utc::now()),
        None,
    )
    .await;

    let first = prediction_repo::claim_outcome(
        &pool,
        seeded.id,
        Some(Decimal::from(2990)),
        Outcome::Correct,
        Utc::now(),
    )
    .await
    .unwrap();
    assert!(first);

    let second = prediction_repo::claim_outcome(
        &pool,
        seeded.id,
        Some(Decimal::from(3010)),
        Outcome::Incorrect,
        Utc::now(),
    )
    .await
    .unwrap();
    assert!(!second, "a resolved row must not be claimable again");

    let row = common::get_prediction(&pool, seeded.id).await;
    assert_eq!(row.outcome.as_deref(), Some("Correct"));
    assert_eq!(row.final_price, Some(Decimal::from(2990)));
}

#[tokio::test]
async fn test_row_failure_does_not_abort_batch() {
    let pool = common::setup_test_db().await;
    let user_id = Uuid::new_v4();

    let a = common::seed_prediction(
        &pool,
        user_id,
        "Crypto",
        "crypto:eth",
        "Up",
        "intraday",
        Some(5),
        Some(Decimal::from(3000)),
        Some(Utc::now() - Duration::minutes(10)),
        None,
    )
    .await;
    let b = common::seed_prediction(
        &pool,
        user_id,
        "Crypto",
        "crypto:sol",
        "Down",
        "intraday",
        Some(5),
        Some(Decimal::from(150)),
        Some(Utc::now() - Duration::minutes(10)),
        None,
    )
    .await;

    let summary = run_batch(&pool, &FailingEvaluator, 50, Utc::now()).await.unwrap();

    for id in [a.id, b.id] {
        let detail = summary
            .details
            .iter()
            .find(|d| d.id == id)
            .expect("both rows should have been attempted");
        assert!(detail.action.starts_with("error"));

        let row = common::get_prediction(&pool, id).await;
        assert!(row.outcome.is_none());
    }
}
