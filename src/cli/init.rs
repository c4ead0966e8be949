//! Init command implementation

use anyhow::{Result, bail};
use std::path::Path;
use tracing::info;

use keyquest::config::{Config, write_config_text};

/// Default configuration content for keyquest init
pub const DEFAULT_CONFIG: &str = r#"# Keyquest Configuration
# ======================

# ============================================================================
# STORAGE
# ============================================================================
#
#   database_path   - SQLite file (default: ~/.keyquest/progress.db)
#   busy_timeout_ms - How long a write waits for another writer (default: 5000)

[storage]
busy_timeout_ms = 5000

# ============================================================================
# CLOCK
# ============================================================================
#
# Days roll over at midnight UTC shifted by this many minutes.
# Must be within +/-840 (UTC-14 .. UTC+14).

[clock]
utc_offset_minutes = 0

# ============================================================================
# REWARDS
# ============================================================================

[rewards]
streak_freeze_price = 50
max_streak_freezes = 3
history_limit_max = 100
xp_boost_minutes = 30
coin_charm_uses = 3
"#;

/// Write the default config to `path`
pub fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_config_text(path, DEFAULT_CONFIG)?;

    // Make sure what we wrote is something we can read back
    Config::from_file(path)?;

    info!("Created {}", path.display());
    println!("Created {}", path.display());
    Ok(())
}
