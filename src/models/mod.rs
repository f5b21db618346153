pub mod prediction;

pub use prediction::{judge_outcome, NewPrediction, Prediction};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Asset class of a prediction. Each category is validated by its own
/// scheduled worker against its own price source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Crypto,
    Forex,
    Commodities,
    Indices,
    Stocks,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Crypto,
        Category::Forex,
        Category::Commodities,
        Category::Indices,
        Category::Stocks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crypto => "Crypto",
            Category::Forex => "Forex",
            Category::Commodities => "Commodities",
            Category::Indices => "Indices",
            Category::Stocks => "Stocks",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "crypto" => Some(Category::Crypto),
            "forex" => Some(Category::Forex),
            "commodities" => Some(Category::Commodities),
            "indices" => Some(Category::Indices),
            "stocks" => Some(Category::Stocks),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MarketType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Stock,
    Index,
    Global,
}

impl MarketType {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stock" => Some(MarketType::Stock),
            "index" => Some(MarketType::Index),
            "global" => Some(MarketType::Global),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Stock => "stock",
            MarketType::Index => "index",
            MarketType::Global => "global",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PredictionKind
// ---------------------------------------------------------------------------

/// Reference-capture strategy: intraday predictions sample the reference
/// price at submission, opening predictions at the next market-session open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    Intraday,
    Opening,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Intraday => "intraday",
            PredictionKind::Opening => "opening",
        }
    }

    pub fn from_api_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "opening" => PredictionKind::Opening,
            _ => PredictionKind::Intraday,
        }
    }
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
    #[serde(rename = "Data Unavailable")]
    DataUnavailable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "Correct",
            Outcome::Incorrect => "Incorrect",
            Outcome::DataUnavailable => "Data Unavailable",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
