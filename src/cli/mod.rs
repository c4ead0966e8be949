//! CLI command implementations

pub mod challenge;
pub mod init;
pub mod powerups;
pub mod streak;
pub mod wallet;

use std::sync::Arc;

use anyhow::{Context, Result};

use keyquest::clock::SystemClock;
use keyquest::config::Config;
use keyquest::store::ProgressDb;
use keyquest::{ProgressionEngine, ProgressionEvent};

/// Open the configured database and wrap it in an engine
pub fn open_engine(config: &Config) -> Result<ProgressionEngine> {
    let db_path = config.database_path();
    let db = ProgressDb::open(&db_path, config.busy_timeout())
        .with_context(|| format!("Failed to open progress db: {}", db_path.display()))?;
    let clock = Arc::new(SystemClock::new(config.clock.utc_offset_minutes));
    Ok(ProgressionEngine::with_settings(
        db,
        clock,
        config.progression_settings(),
    ))
}

pub fn print_events(events: &[ProgressionEvent]) {
    for event in events {
        println!("  * {}", event.describe());
    }
}

/// `YYYY-MM-DD HH:MM` in UTC for a millisecond timestamp
pub fn format_ms(ts_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts_ms.to_string())
}
