//! SQLite connection and schema management for progression state
//!
//! Manages the `~/.keyquest/progress.db` database with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::domain::DayKey;
use crate::error::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Database wrapper shared by the progression engine
#[derive(Clone)]
pub struct ProgressDb {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressDb {
    /// Open or create the progress database at a specific path
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while another handle holds the write lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn, busy_timeout)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, Duration::from_millis(0))
    }

    fn from_connection(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(busy_timeout)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a reference to the connection (for queries)
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Progress DB lock poisoned")
    }

    /// Run `f` against the connection without opening a write transaction
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn();
        f(&conn)
    }

    /// Run `f` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken before the first read, so a read-then-write
    /// in `f` is never interleaved with another writer. The transaction
    /// commits when `f` returns `Ok` and rolls back otherwise.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Highest applied schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        let version =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
                r.get(0)
            })?;
        Ok(version)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: power-ups and the inventory they are activated from
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS inventory (
                    user_id TEXT NOT NULL,
                    item TEXT NOT NULL,
                    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                    PRIMARY KEY (user_id, item)
                );

                -- One row per user and kind; effect columns depend on shape
                CREATE TABLE IF NOT EXISTS power_ups (
                    user_id TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    shape TEXT NOT NULL CHECK (shape IN ('timed', 'consumable')),
                    multiplier INTEGER,
                    expires_at INTEGER,
                    remaining_uses INTEGER,
                    activated_at INTEGER NOT NULL,
                    PRIMARY KEY (user_id, kind)
                );
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }
}

/// Conversion error for a column that holds an unexpected value
pub(crate) fn bad_column(column: usize, message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into().into(),
    )
}

/// Parse a stored `YYYY-MM-DD` column
pub(crate) fn day_column(column: usize, raw: &str) -> rusqlite::Result<DayKey> {
    DayKey::parse(raw).ok_or_else(|| bad_column(column, format!("invalid day key '{}'", raw)))
}

/// SQL schema for the progress database
const SCHEMA_SQL: &str = r#"
-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- Premium status, written by the billing collaborator
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    is_premium INTEGER NOT NULL DEFAULT 0,
    premium_expires_at INTEGER,
    created_at INTEGER NOT NULL
);

-- Cached projection of the ledger
CREATE TABLE IF NOT EXISTS balances (
    user_id TEXT PRIMARY KEY,
    coins INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
    xp INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
    updated_at INTEGER NOT NULL
);

-- Append-only ledger; seq orders a user's entries
CREATE TABLE IF NOT EXISTS ledger_entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    entry_type TEXT NOT NULL
        CHECK (entry_type IN ('earn', 'spend', 'purchase', 'premium_bonus')),
    amount INTEGER NOT NULL,
    xp INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
    source TEXT NOT NULL,
    balance_before INTEGER NOT NULL,
    balance_after INTEGER NOT NULL CHECK (balance_after >= 0),
    created_at INTEGER NOT NULL,
    CHECK (balance_after = balance_before + amount)
);
CREATE INDEX IF NOT EXISTS idx_ledger_user ON ledger_entries(user_id, seq);

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_update
BEFORE UPDATE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_delete
BEFORE DELETE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

-- One challenge per calendar day, immutable once created
CREATE TABLE IF NOT EXISTS challenges (
    day_key TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    target_value INTEGER NOT NULL,
    target_keys TEXT,
    reward_bronze INTEGER NOT NULL,
    reward_silver INTEGER NOT NULL,
    reward_gold INTEGER NOT NULL,
    reward_xp INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

-- Per user, per day
CREATE TABLE IF NOT EXISTS challenge_progress (
    user_id TEXT NOT NULL,
    day_key TEXT NOT NULL REFERENCES challenges(day_key),
    best_value REAL NOT NULL DEFAULT 0,
    attempt_count INTEGER NOT NULL DEFAULT 0,
    tier TEXT NOT NULL DEFAULT 'pending',
    rewards_claimed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER,
    claimed_at INTEGER,
    PRIMARY KEY (user_id, day_key)
);
CREATE INDEX IF NOT EXISTS idx_progress_day ON challenge_progress(day_key);

-- Streak state (freeze_used_dates is a JSON array of day keys)
CREATE TABLE IF NOT EXISTS streaks (
    user_id TEXT PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_activity_date TEXT,
    freeze_count INTEGER NOT NULL DEFAULT 0,
    freeze_used_dates TEXT NOT NULL DEFAULT '[]',
    total_days_active INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    CHECK (longest_streak >= current_streak)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProgressionError;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("progress.db");
        let db = ProgressDb::open(&db_path, Duration::from_millis(100)).unwrap();

        let conn = db.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "users",
            "balances",
            "ledger_entries",
            "challenges",
            "challenge_progress",
            "streaks",
            "inventory",
            "power_ups",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
        drop(stmt);
        drop(conn);
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("progress.db");
        drop(ProgressDb::open(&db_path, Duration::from_millis(100)).unwrap());
        let db = ProgressDb::open(&db_path, Duration::from_millis(100)).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let db = ProgressDb::open_in_memory().unwrap();
        let result: Result<()> = db.write(|tx| {
            tx.execute(
                "INSERT INTO users (user_id, created_at) VALUES ('u1', 0)",
                [],
            )?;
            Err(ProgressionError::Validation("abort".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_ledger_rows_are_immutable() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        conn.execute(
            "INSERT INTO ledger_entries
                (entry_id, user_id, entry_type, amount, source, balance_before, balance_after, created_at)
             VALUES ('e1', 'u1', 'earn', 10, 'test', 0, 10, 0)",
            [],
        )
        .unwrap();

        assert!(conn.execute("UPDATE ledger_entries SET amount = 20", []).is_err());
        assert!(conn.execute("DELETE FROM ledger_entries", []).is_err());
    }

    #[test]
    fn test_ledger_checks_reject_bad_arithmetic() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let broken = conn.execute(
            "INSERT INTO ledger_entries
                (entry_id, user_id, entry_type, amount, source, balance_before, balance_after, created_at)
             VALUES ('e1', 'u1', 'earn', 10, 'test', 0, 11, 0)",
            [],
        );
        assert!(broken.is_err());

        let negative = conn.execute(
            "INSERT INTO ledger_entries
                (entry_id, user_id, entry_type, amount, source, balance_before, balance_after, created_at)
             VALUES ('e2', 'u1', 'spend', -5, 'test', 0, -5, 0)",
            [],
        );
        assert!(negative.is_err());
    }
}
