//! Configuration sections

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where progress is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database file; defaults to `~/.keyquest/progress.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// How long a writer waits for another writer's lock
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// How wall-clock time is cut into days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSettings {
    /// Fixed offset from UTC applied before computing day keys
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Shop prices, caps and power-up tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSettings {
    #[serde(default = "default_streak_freeze_price")]
    pub streak_freeze_price: i64,

    /// Most streak freezes a user may hold
    #[serde(default = "default_max_streak_freezes")]
    pub max_streak_freezes: u32,

    /// Upper bound for a transaction history page
    #[serde(default = "default_history_limit_max")]
    pub history_limit_max: usize,

    #[serde(default = "default_xp_boost_minutes")]
    pub xp_boost_minutes: u32,

    /// Charges added per coin charm activation
    #[serde(default = "default_coin_charm_uses")]
    pub coin_charm_uses: u32,
}

fn default_streak_freeze_price() -> i64 {
    50
}

fn default_max_streak_freezes() -> u32 {
    3
}

fn default_history_limit_max() -> usize {
    100
}

fn default_xp_boost_minutes() -> u32 {
    30
}

fn default_coin_charm_uses() -> u32 {
    3
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            streak_freeze_price: default_streak_freeze_price(),
            max_streak_freezes: default_max_streak_freezes(),
            history_limit_max: default_history_limit_max(),
            xp_boost_minutes: default_xp_boost_minutes(),
            coin_charm_uses: default_coin_charm_uses(),
        }
    }
}
