pub mod aggregate;
pub mod config;
pub mod engine;

pub use aggregate::{Aggregator, MatchSource, DEFAULT_SCORE};
pub use config::{ConfigError, ConfigStore, HorseTier, RateTier, ScoreConfig};
pub use engine::{compute_match_score, MatchScore, ScoreError, ScoreFactor, BASE_SCORE};
