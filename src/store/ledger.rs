//! Ledger postings and balance reads
//!
//! Every coin or XP change goes through [`post`], which appends one entry
//! and refreshes the cached balance row in the caller's transaction.

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use super::db::bad_column;
use crate::domain::ledger::{audit_entries, validate_source};
use crate::domain::{Balance, EntryType, LedgerAudit, LedgerEntry, Posting, UserId};
use crate::error::{ProgressionError, Result};

const ENTRY_COLUMNS: &str = "seq, entry_id, user_id, entry_type, amount, xp, source, \
                             balance_before, balance_after, created_at";

/// Append `posting` for `user` and update the cached balance.
///
/// Must run inside a write transaction: the balance read and the insert
/// form one unit. A debit that would leave the balance negative fails with
/// [`ProgressionError::InsufficientFunds`] before anything is written.
pub fn post(conn: &Connection, user: &UserId, posting: &Posting, now_ms: i64) -> Result<LedgerEntry> {
    validate_source(&posting.source).map_err(ProgressionError::Validation)?;
    if posting.xp < 0 {
        return Err(ProgressionError::Validation("xp delta must not be negative".into()));
    }

    let before = balance(conn, user)?;
    let balance_after = before.coins + posting.amount;
    if balance_after < 0 {
        return Err(ProgressionError::InsufficientFunds {
            balance: before.coins,
            required: -posting.amount,
        });
    }

    let entry_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO ledger_entries
            (entry_id, user_id, entry_type, amount, xp, source, balance_before, balance_after, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry_id,
            user.as_str(),
            posting.entry_type.as_str(),
            posting.amount,
            posting.xp,
            posting.source,
            before.coins,
            balance_after,
            now_ms,
        ],
    )?;
    let seq = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO balances (user_id, coins, xp, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
            coins = excluded.coins,
            xp = excluded.xp,
            updated_at = excluded.updated_at",
        params![user.as_str(), balance_after, before.xp + posting.xp, now_ms],
    )?;

    debug!(
        user = %user,
        entry_type = posting.entry_type.as_str(),
        amount = posting.amount,
        xp = posting.xp,
        balance_after,
        "Posted ledger entry"
    );

    Ok(LedgerEntry {
        seq,
        entry_id,
        user_id: user.clone(),
        entry_type: posting.entry_type,
        amount: posting.amount,
        xp: posting.xp,
        source: posting.source.clone(),
        balance_before: before.coins,
        balance_after,
        created_at: now_ms,
    })
}

/// Cached balance, zero for a user with no postings
pub fn balance(conn: &Connection, user: &UserId) -> Result<Balance> {
    let row = conn
        .query_row(
            "SELECT coins, xp FROM balances WHERE user_id = ?1",
            [user.as_str()],
            |r| {
                Ok(Balance {
                    coins: r.get(0)?,
                    xp: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row.unwrap_or_default())
}

/// Most recent entries first
pub fn history(conn: &Connection, user: &UserId, limit: usize) -> Result<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM ledger_entries WHERE user_id = ?1 ORDER BY seq DESC LIMIT ?2",
        ENTRY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params![user.as_str(), limit as i64], row_to_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Every entry for `user`, oldest first
pub fn entries(conn: &Connection, user: &UserId) -> Result<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM ledger_entries WHERE user_id = ?1 ORDER BY seq ASC",
        ENTRY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map([user.as_str()], row_to_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Walk the user's ledger and compare it with the cached balance
pub fn audit(conn: &Connection, user: &UserId) -> Result<LedgerAudit> {
    let entries = entries(conn, user)?;
    let cached = balance(conn, user)?;
    Ok(audit_entries(&entries, cached))
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let user_raw: String = row.get(2)?;
    let type_raw: String = row.get(3)?;
    Ok(LedgerEntry {
        seq: row.get(0)?,
        entry_id: row.get(1)?,
        user_id: UserId::new(user_raw).ok_or_else(|| bad_column(2, "invalid user id"))?,
        entry_type: EntryType::from_str(&type_raw)
            .ok_or_else(|| bad_column(3, format!("unknown entry type '{}'", type_raw)))?,
        amount: row.get(4)?,
        xp: row.get(5)?,
        source: row.get(6)?,
        balance_before: row.get(7)?,
        balance_after: row.get(8)?,
        created_at: row.get(9)?,
    })
}
