// Library crate for the horserank companion service
// This file exposes the public API for integration tests

pub mod api;
pub mod config;
pub mod lcu;
pub mod monitor;
pub mod score;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use config::{AppSettings, ClientSettings, ClientSettingsPatch, SettingsStore};
pub use lcu::models::UserScore;
pub use lcu::{LcuClient, LcuError};
pub use monitor::{run_monitor, GameFlowState, LcuRuntime, Monitor};
pub use score::{
    compute_match_score, Aggregator, ConfigStore, MatchScore, MatchSource, ScoreConfig, ScoreError,
    ScoreFactor,
};
pub use shared::{AppError, AppState};
