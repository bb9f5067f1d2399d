use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scoring table `{0}` must not be empty")]
    EmptyTable(&'static str),

    #[error("scoring table `{0}` contains an empty tier list")]
    EmptyTierList(&'static str),

    #[error("adjustKda spread must be non-zero")]
    ZeroKdaSpread,

    #[error("failed to read score configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse score configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One outer tier of a nested rate table: when the player's share of the
/// team total exceeds `rate_limit` (percent), the first inner tier whose
/// kill floor the player beats decides the bonus. Table order is
/// authoritative; tiers are hand-ordered highest-first and never sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateTier {
    /// Percent of the team total, exclusive.
    pub rate_limit: f64,
    /// `[kill floor (exclusive), bonus]` pairs.
    pub score_conf: Vec<[f64; 2]>,
}

impl Default for RateTier {
    fn default() -> Self {
        Self {
            rate_limit: 0.0,
            score_conf: Vec::new(),
        }
    }
}

/// Score threshold and label for one reputation tier, ordered best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HorseTier {
    pub score: f64,
    pub name: String,
}

impl Default for HorseTier {
    fn default() -> Self {
        Self {
            score: 0.0,
            name: String::new(),
        }
    }
}

/// The complete weight table for match scoring. Hot-swappable behind
/// [`ConfigStore`]; all reads observe a full snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreConfig {
    pub enabled: bool,
    /// Matches shorter than this (seconds) are excluded from aggregation.
    pub game_min_duration: i64,
    /// Queue ids eligible for scoring.
    pub allow_queue_ids: Vec<i64>,
    /// `[kill bonus, assist bonus]`, kill takes precedence.
    pub first_blood: [f64; 2],
    pub penta_kills: [f64; 1],
    pub quadra_kills: [f64; 1],
    pub triple_kills: [f64; 1],
    /// `[rank1 bonus, rank2 bonus, rank4 penalty, rank5 penalty]`.
    pub join_team_rate_rank: [f64; 4],
    pub gold_earned_rank: [f64; 4],
    pub hurt_rank: [f64; 2],
    pub money_to_hurt_rate_rank: [f64; 2],
    pub vision_score_rank: [f64; 2],
    /// `[cs-per-minute floor, bonus]`, first qualifying tier wins.
    pub minions_killed: Vec<[f64; 2]>,
    pub kill_rate: Vec<RateTier>,
    pub hurt_rate: Vec<RateTier>,
    pub assist_rate: Vec<RateTier>,
    /// `[baseline, spread]` of the continuous KDA adjustment.
    pub adjust_kda: [f64; 2],
    /// Reputation tiers, best-first; the last threshold is an epsilon floor.
    pub horse: Vec<HorseTier>,
    /// Deliver the team summary as one merged chat message.
    pub merge_msg: bool,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            game_min_duration: 15 * 60,
            allow_queue_ids: vec![430, 420, 450, 440, 1700],
            first_blood: [10.0, 5.0],
            penta_kills: [20.0],
            quadra_kills: [10.0],
            triple_kills: [5.0],
            join_team_rate_rank: [10.0, 5.0, 5.0, 10.0],
            gold_earned_rank: [10.0, 5.0, 5.0, 10.0],
            hurt_rank: [10.0, 5.0],
            money_to_hurt_rate_rank: [10.0, 5.0],
            vision_score_rank: [10.0, 5.0],
            minions_killed: vec![[10.0, 20.0], [9.0, 10.0], [8.0, 5.0]],
            kill_rate: vec![
                RateTier {
                    rate_limit: 50.0,
                    score_conf: vec![[15.0, 40.0], [10.0, 20.0], [5.0, 10.0]],
                },
                RateTier {
                    rate_limit: 40.0,
                    score_conf: vec![[15.0, 20.0], [10.0, 10.0], [5.0, 5.0]],
                },
            ],
            hurt_rate: vec![
                RateTier {
                    rate_limit: 40.0,
                    score_conf: vec![[15.0, 40.0], [10.0, 20.0], [5.0, 10.0]],
                },
                RateTier {
                    rate_limit: 30.0,
                    score_conf: vec![[15.0, 20.0], [10.0, 10.0], [5.0, 5.0]],
                },
            ],
            assist_rate: vec![
                RateTier {
                    rate_limit: 50.0,
                    score_conf: vec![
                        [20.0, 30.0],
                        [18.0, 25.0],
                        [15.0, 20.0],
                        [10.0, 10.0],
                        [5.0, 5.0],
                    ],
                },
                RateTier {
                    rate_limit: 40.0,
                    score_conf: vec![[20.0, 15.0], [15.0, 10.0], [10.0, 5.0], [5.0, 3.0]],
                },
            ],
            adjust_kda: [2.0, 5.0],
            horse: vec![
                HorseTier {
                    score: 180.0,
                    name: "god-tier".into(),
                },
                HorseTier {
                    score: 150.0,
                    name: "smurf".into(),
                },
                HorseTier {
                    score: 125.0,
                    name: "top-tier".into(),
                },
                HorseTier {
                    score: 105.0,
                    name: "average".into(),
                },
                HorseTier {
                    score: 95.0,
                    name: "below-average".into(),
                },
                HorseTier {
                    score: 0.0001,
                    name: "bottom-tier".into(),
                },
            ],
            merge_msg: false,
        }
    }
}

impl ScoreConfig {
    /// A table the engine references but which is structurally empty would
    /// silently mis-score every match, so it refuses to load instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allow_queue_ids.is_empty() {
            return Err(ConfigError::EmptyTable("allowQueueIds"));
        }
        if self.minions_killed.is_empty() {
            return Err(ConfigError::EmptyTable("minionsKilled"));
        }
        if self.horse.is_empty() {
            return Err(ConfigError::EmptyTable("horse"));
        }
        for (name, table) in [
            ("killRate", &self.kill_rate),
            ("hurtRate", &self.hurt_rate),
            ("assistRate", &self.assist_rate),
        ] {
            if table.is_empty() {
                return Err(ConfigError::EmptyTable(name));
            }
            if table.iter().any(|tier| tier.score_conf.is_empty()) {
                return Err(ConfigError::EmptyTierList(name));
            }
        }
        if self.adjust_kda[1] == 0.0 {
            return Err(ConfigError::ZeroKdaSpread);
        }
        Ok(())
    }

    /// Index of the first tier whose threshold the score reaches, best-first.
    /// Scores below every threshold land in the last tier.
    pub fn horse_index(&self, score: f64) -> usize {
        self.horse
            .iter()
            .position(|tier| score >= tier.score)
            .unwrap_or(self.horse.len().saturating_sub(1))
    }

    pub fn horse_label(&self, score: f64) -> &str {
        &self.horse[self.horse_index(score)].name
    }
}

/// Shared handle to the current score configuration. Readers take a full
/// `Arc` snapshot; a background refresh swaps the pointer wholesale, so no
/// reader can observe a partially updated table.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<RwLock<Arc<ScoreConfig>>>,
}

impl ConfigStore {
    pub fn new(config: ScoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    pub fn snapshot(&self) -> Arc<ScoreConfig> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn swap(&self, config: ScoreConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Arc::new(config);
        Ok(())
    }
}

/// Loads the score table from a JSON file, or the built-in defaults when the
/// file does not exist. Parse and validation failures are errors: starting
/// with a broken table is worse than not starting.
pub fn load_score_config(path: &std::path::Path) -> Result<ScoreConfig, ConfigError> {
    if !path.exists() {
        return Ok(ScoreConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let config: ScoreConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

/// How often the weight table is re-read from disk.
const REFRESH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Background refresh: periodically re-reads the score table and swaps the
/// snapshot when it changed. A refresh that fails to load or validate is
/// logged and skipped; only startup treats that as fatal.
pub async fn run_refresh_task(store: ConfigStore, path: std::path::PathBuf) {
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    // The first tick fires immediately; startup already loaded the table.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match load_score_config(&path) {
            Ok(config) => {
                if config != *store.snapshot() {
                    match store.swap(config) {
                        Ok(()) => tracing::info!("score configuration reloaded"),
                        Err(err) => tracing::warn!(error = %err, "score configuration swap rejected"),
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "score configuration refresh failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_validates() {
        ScoreConfig::default().validate().expect("default is valid");
    }

    #[test]
    fn empty_rate_table_is_fatal() {
        let mut cfg = ScoreConfig::default();
        cfg.kill_rate.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptyTable("killRate"))
        ));
    }

    #[test]
    fn empty_inner_tier_list_is_fatal() {
        let mut cfg = ScoreConfig::default();
        cfg.assist_rate[0].score_conf.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptyTierList("assistRate"))
        ));
    }

    #[test]
    fn zero_kda_spread_is_fatal() {
        let mut cfg = ScoreConfig::default();
        cfg.adjust_kda[1] = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroKdaSpread)));
    }

    #[test]
    fn horse_mapping_picks_the_first_reached_threshold() {
        let cfg = ScoreConfig::default();
        assert_eq!(cfg.horse_label(200.0), "god-tier");
        assert_eq!(cfg.horse_label(150.0), "smurf");
        assert_eq!(cfg.horse_label(100.0), "below-average");
        assert_eq!(cfg.horse_label(10.0), "bottom-tier");
        // Below every threshold still maps to the last tier.
        assert_eq!(cfg.horse_label(0.0), "bottom-tier");
    }

    #[test]
    fn store_swap_replaces_the_whole_snapshot() {
        let store = ConfigStore::new(ScoreConfig::default()).expect("store");
        let before = store.snapshot();

        let mut next = ScoreConfig::default();
        next.first_blood = [42.0, 5.0];
        store.swap(next).expect("swap");

        // The earlier snapshot is untouched; new reads see the new table.
        assert_eq!(before.first_blood, [10.0, 5.0]);
        assert_eq!(store.snapshot().first_blood, [42.0, 5.0]);
    }

    #[test]
    fn store_swap_rejects_invalid_tables() {
        let store = ConfigStore::new(ScoreConfig::default()).expect("store");
        let mut bad = ScoreConfig::default();
        bad.horse.clear();
        assert!(store.swap(bad).is_err());
        assert!(!store.snapshot().horse.is_empty());
    }

    #[test]
    fn wire_casing_round_trips() {
        let raw = serde_json::to_string(&ScoreConfig::default()).expect("encode");
        assert!(raw.contains("\"allowQueueIds\""));
        assert!(raw.contains("\"moneyToHurtRateRank\""));
        let back: ScoreConfig = serde_json::from_str(&raw).expect("decode");
        assert_eq!(back, ScoreConfig::default());
    }
}
