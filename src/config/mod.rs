//! Configuration loading and management

mod io;
mod sections;

pub use io::write_config_text;
pub use sections::{ClockSettings, RewardSettings, StorageSettings};

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::clock::MAX_UTC_OFFSET_MINUTES;
use crate::domain::ActivationRules;
use crate::progression::ProgressionSettings;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub clock: ClockSettings,

    #[serde(default)]
    pub rewards: RewardSettings,
}

impl Config {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let offset = self.clock.utc_offset_minutes;
        if offset.abs() > MAX_UTC_OFFSET_MINUTES {
            bail!(
                "clock.utc_offset_minutes must be within +/-{} (got {})",
                MAX_UTC_OFFSET_MINUTES,
                offset
            );
        }
        if self.rewards.streak_freeze_price <= 0 {
            bail!("rewards.streak_freeze_price must be positive");
        }
        if self.rewards.history_limit_max == 0 {
            bail!("rewards.history_limit_max must be at least 1");
        }
        if self.rewards.xp_boost_minutes == 0 {
            bail!("rewards.xp_boost_minutes must be at least 1");
        }
        if self.rewards.coin_charm_uses == 0 {
            bail!("rewards.coin_charm_uses must be at least 1");
        }
        Ok(())
    }

    /// Database file, falling back to `~/.keyquest/progress.db`
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("progress.db"))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    pub fn progression_settings(&self) -> ProgressionSettings {
        ProgressionSettings {
            streak_freeze_price: self.rewards.streak_freeze_price,
            max_streak_freezes: self.rewards.max_streak_freezes,
            history_limit_max: self.rewards.history_limit_max,
            activation: ActivationRules {
                xp_boost_ms: i64::from(self.rewards.xp_boost_minutes) * 60 * 1000,
                coin_charm_uses: self.rewards.coin_charm_uses,
            },
        }
    }
}
