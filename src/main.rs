use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use keyquest::config::Config;
use keyquest::{ProgressionEngine, UserId};

mod cli;

#[derive(Parser)]
#[command(name = "keyquest")]
#[command(about = "Keyquest - daily typing challenges, streaks and rewards")]
#[command(version)]
struct Cli {
    /// User handle to act as
    #[arg(short, long, global = true, default_value = "local")]
    user: String,

    /// Path to the config file (defaults to ~/.keyquest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show today's challenge and your progress on it
    Challenge,

    /// Submit an attempt at today's challenge
    Attempt {
        /// Measured value (WPM, accuracy %, keystrokes, ...)
        value: f64,
    },

    /// Claim today's challenge rewards
    Claim,

    /// Show your streak
    Streak,

    /// Record today's practice toward your streak
    Activity,

    /// Use a streak freeze to protect today
    Freeze,

    /// Buy a streak freeze with coins
    BuyFreeze,

    /// Credit coins
    Award {
        amount: i64,
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// Spend coins
    Spend {
        amount: i64,
        #[arg(long, default_value = "shop")]
        source: String,
    },

    /// Show coin balance, XP and level
    Balance,

    /// Show recent ledger entries
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Check the ledger chain against the cached balance
    Verify,

    /// List active power-ups and inventory
    PowerUps,

    /// Activate an owned power-up (xp_boost, coin_charm)
    Activate { kind: String },

    /// Add power-up items to the inventory
    Grant { item: String, quantity: u32 },

    /// Set premium status
    Premium {
        /// Last day (YYYY-MM-DD) premium stays active
        #[arg(long)]
        until: Option<String>,

        /// Remove premium
        #[arg(long, conflicts_with = "until")]
        off: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { force } = cli.command {
        let path = cli.config.unwrap_or_else(Config::global_config_path);
        return cli::init::init_command(&path, force);
    }

    let config = Config::load(cli.config.as_deref())?;
    let user = UserId::new(cli.user.clone()).ok_or_else(|| anyhow!("Invalid user handle: '{}'", cli.user))?;
    let engine = cli::open_engine(&config)?;

    // SQLite calls block; keep them off the async workers
    tokio::task::spawn_blocking(move || dispatch(&engine, &user, cli.command))
        .await
        .context("Command task panicked")?
}

fn dispatch(engine: &ProgressionEngine, user: &UserId, command: Commands) -> Result<()> {
    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Challenge => cli::challenge::challenge_command(engine, user),
        Commands::Attempt { value } => cli::challenge::attempt_command(engine, user, value),
        Commands::Claim => cli::challenge::claim_command(engine, user),
        Commands::Streak => cli::streak::streak_command(engine, user),
        Commands::Activity => cli::streak::activity_command(engine, user),
        Commands::Freeze => cli::streak::freeze_command(engine, user),
        Commands::BuyFreeze => cli::streak::buy_freeze_command(engine, user),
        Commands::Award { amount, source } => cli::wallet::award_command(engine, user, amount, &source),
        Commands::Spend { amount, source } => cli::wallet::spend_command(engine, user, amount, &source),
        Commands::Balance => cli::wallet::balance_command(engine, user),
        Commands::History { limit } => cli::wallet::history_command(engine, user, limit),
        Commands::Verify => cli::wallet::verify_command(engine, user),
        Commands::PowerUps => cli::powerups::list_command(engine, user),
        Commands::Activate { kind } => cli::powerups::activate_command(engine, user, &kind),
        Commands::Grant { item, quantity } => cli::powerups::grant_command(engine, user, &item, quantity),
        Commands::Premium { until, off } => cli::wallet::premium_command(engine, user, until.as_deref(), off),
    }
}
