//! Active power-ups per user

use rusqlite::{Connection, OptionalExtension, params};

use super::db::bad_column;
use crate::domain::{PowerUp, PowerUpEffect, PowerUpKind, UserId};
use crate::error::Result;

const POWER_UP_COLUMNS: &str = "kind, shape, multiplier, expires_at, remaining_uses, activated_at";

pub fn get_power_up(conn: &Connection, user: &UserId, kind: PowerUpKind) -> Result<Option<PowerUp>> {
    let sql = format!(
        "SELECT {} FROM power_ups WHERE user_id = ?1 AND kind = ?2",
        POWER_UP_COLUMNS
    );
    let power_up = conn
        .query_row(&sql, params![user.as_str(), kind.as_str()], row_to_power_up)
        .optional()?;
    Ok(power_up)
}

/// All stored power-ups, live or not
pub fn list_power_ups(conn: &Connection, user: &UserId) -> Result<Vec<PowerUp>> {
    let sql = format!(
        "SELECT {} FROM power_ups WHERE user_id = ?1 ORDER BY kind",
        POWER_UP_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let power_ups = stmt
        .query_map([user.as_str()], row_to_power_up)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(power_ups)
}

pub fn save_power_up(conn: &Connection, user: &UserId, power_up: &PowerUp) -> Result<()> {
    let (shape, multiplier, expires_at, remaining_uses) = match power_up.effect {
        PowerUpEffect::Timed {
            multiplier,
            expires_at,
        } => ("timed", Some(multiplier), Some(expires_at), None),
        PowerUpEffect::Consumable { remaining_uses } => {
            ("consumable", None, None, Some(remaining_uses))
        }
    };

    conn.execute(
        "INSERT INTO power_ups
            (user_id, kind, shape, multiplier, expires_at, remaining_uses, activated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id, kind) DO UPDATE SET
            shape = excluded.shape,
            multiplier = excluded.multiplier,
            expires_at = excluded.expires_at,
            remaining_uses = excluded.remaining_uses,
            activated_at = excluded.activated_at",
        params![
            user.as_str(),
            power_up.kind.as_str(),
            shape,
            multiplier,
            expires_at,
            remaining_uses,
            power_up.activated_at,
        ],
    )?;
    Ok(())
}

/// Delete expired or exhausted power-ups. Returns how many were removed.
pub fn prune_power_ups(conn: &Connection, user: &UserId, now_ms: i64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM power_ups
         WHERE user_id = ?1
           AND ((shape = 'timed' AND expires_at <= ?2)
             OR (shape = 'consumable' AND remaining_uses <= 0))",
        params![user.as_str(), now_ms],
    )?;
    Ok(removed)
}

fn row_to_power_up(row: &rusqlite::Row<'_>) -> rusqlite::Result<PowerUp> {
    let kind_raw: String = row.get(0)?;
    let shape: String = row.get(1)?;
    let kind = PowerUpKind::from_str(&kind_raw)
        .ok_or_else(|| bad_column(0, format!("unknown power-up '{}'", kind_raw)))?;

    let effect = match shape.as_str() {
        "timed" => PowerUpEffect::Timed {
            multiplier: row.get(2)?,
            expires_at: row.get(3)?,
        },
        "consumable" => PowerUpEffect::Consumable {
            remaining_uses: row.get(4)?,
        },
        other => return Err(bad_column(1, format!("unknown power-up shape '{}'", other))),
    };

    Ok(PowerUp {
        kind,
        effect,
        activated_at: row.get(5)?,
    })
}
