use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// User-facing toggles, persisted as JSON next to the app's other local
/// state and editable through the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub auto_accept_game: bool,
    /// Champion id to lock in automatically; 0 disables.
    pub auto_pick_champ_id: i64,
    /// Champion id to ban automatically; 0 disables.
    pub auto_ban_champ_id: i64,
    pub auto_send_team_horse: bool,
    pub should_send_self_horse: bool,
    /// Display labels per reputation tier, best-first.
    pub horse_names: Vec<String>,
    /// Which tiers get announced in champ select, best-first.
    pub choose_send_horse_msg: Vec<bool>,
    pub choose_champ_send_msg_delay_sec: u64,
    pub should_in_game_save_msg_to_clipboard: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            auto_accept_game: false,
            auto_pick_champ_id: 0,
            auto_ban_champ_id: 0,
            auto_send_team_horse: true,
            should_send_self_horse: true,
            horse_names: vec![
                "god-tier".into(),
                "smurf".into(),
                "top-tier".into(),
                "average".into(),
                "below-average".into(),
                "bottom-tier".into(),
            ],
            choose_send_horse_msg: vec![true; 6],
            choose_champ_send_msg_delay_sec: 3,
            should_in_game_save_msg_to_clipboard: true,
        }
    }
}

/// Partial update from the HTTP API; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettingsPatch {
    pub auto_accept_game: Option<bool>,
    pub auto_pick_champ_id: Option<i64>,
    pub auto_ban_champ_id: Option<i64>,
    pub auto_send_team_horse: Option<bool>,
    pub should_send_self_horse: Option<bool>,
    pub horse_names: Option<Vec<String>>,
    pub choose_send_horse_msg: Option<Vec<bool>>,
    pub choose_champ_send_msg_delay_sec: Option<u64>,
    pub should_in_game_save_msg_to_clipboard: Option<bool>,
}

impl ClientSettings {
    fn apply(&mut self, patch: ClientSettingsPatch) {
        if let Some(v) = patch.auto_accept_game {
            self.auto_accept_game = v;
        }
        if let Some(v) = patch.auto_pick_champ_id {
            self.auto_pick_champ_id = v;
        }
        if let Some(v) = patch.auto_ban_champ_id {
            self.auto_ban_champ_id = v;
        }
        if let Some(v) = patch.auto_send_team_horse {
            self.auto_send_team_horse = v;
        }
        if let Some(v) = patch.should_send_self_horse {
            self.should_send_self_horse = v;
        }
        if let Some(v) = patch.horse_names {
            self.horse_names = v;
        }
        if let Some(v) = patch.choose_send_horse_msg {
            self.choose_send_horse_msg = v;
        }
        if let Some(v) = patch.choose_champ_send_msg_delay_sec {
            self.choose_champ_send_msg_delay_sec = v;
        }
        if let Some(v) = patch.should_in_game_save_msg_to_clipboard {
            self.should_in_game_save_msg_to_clipboard = v;
        }
    }

    /// Label for a reputation tier index, falling back to the score table's
    /// own label when the user list is shorter.
    pub fn horse_name<'a>(&'a self, index: usize, fallback: &'a str) -> &'a str {
        self.horse_names
            .get(index)
            .map(String::as_str)
            .unwrap_or(fallback)
    }

    pub fn should_announce_tier(&self, index: usize) -> bool {
        self.choose_send_horse_msg.get(index).copied().unwrap_or(true)
    }
}

/// Process-level settings resolved once at startup from the environment
/// (with `.env` support).
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub http_addr: String,
    pub lockfile_path: PathBuf,
    pub settings_path: PathBuf,
    pub score_config_path: PathBuf,
}

impl AppSettings {
    pub fn from_env() -> Self {
        let http_addr =
            std::env::var("HORSERANK_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:4396".into());
        let lockfile_path = std::env::var("LCU_LOCKFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                PathBuf::from("C:/Riot Games/League of Legends/lockfile")
            });
        let config_dir = std::env::var("HORSERANK_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("horserank")
            });
        Self {
            http_addr,
            lockfile_path,
            settings_path: config_dir.join("settings.json"),
            score_config_path: config_dir.join("score.json"),
        }
    }
}

/// Shared handle to the user settings. Reads are full snapshots; updates
/// replace the snapshot and persist to disk.
#[derive(Clone)]
pub struct SettingsStore {
    path: PathBuf,
    inner: Arc<RwLock<Arc<ClientSettings>>>,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable. A broken settings file is only ever a warning.
    pub fn load(path: &Path) -> Self {
        let settings = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "settings file unreadable; using defaults");
                    ClientSettings::default()
                }
            },
            Err(_) => ClientSettings::default(),
        };
        Self {
            path: path.to_path_buf(),
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    pub fn snapshot(&self) -> Arc<ClientSettings> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Applies a partial update and persists the result.
    pub fn update(&self, patch: ClientSettingsPatch) -> std::io::Result<Arc<ClientSettings>> {
        let next = {
            let mut slot = self
                .inner
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut settings = (**slot).clone();
            settings.apply(patch);
            let next = Arc::new(settings);
            *slot = next.clone();
            next
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&*next).expect("settings serialize");
        std::fs::write(&self.path, raw)?;
        Ok(next)
    }
}
