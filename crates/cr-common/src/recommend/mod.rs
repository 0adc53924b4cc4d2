pub mod engine;
pub mod scoring;

pub use engine::{
    EngineError, RankedCircle, RecommendConfig, RecommendEngine, SearchError, SearchOutcome,
};
pub use scoring::{score_circle, CircleScore, ScoringConfig, CATEGORY_BONUS};
