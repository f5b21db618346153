pub mod engine;
pub mod evaluators;
pub mod legacy;
pub mod scheduler;

pub use engine::{run_batch, run_category_batch, BatchSummary, RowDetail};
pub use evaluators::{
    CommodityEvaluator, CryptoEvaluator, ForexEvaluator, IndexEvaluator, PriceEvaluator,
    StockEvaluator,
};
pub use scheduler::spawn_validators;
