//! Daily challenge rows and per-user progress

use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use super::db::{bad_column, day_column};
use crate::domain::{Challenge, ChallengeCategory, ChallengeProgress, DayKey, RewardTable, Tier, UserId};
use crate::error::Result;

/// Insert `challenge` unless its day already has one, then return the stored row.
///
/// The first creator wins; later callers read back the existing challenge.
pub fn ensure_challenge(conn: &Connection, challenge: &Challenge, now_ms: i64) -> Result<Challenge> {
    let target_keys = challenge
        .target_keys
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO challenges
            (day_key, category, title, description, target_value, target_keys,
             reward_bronze, reward_silver, reward_gold, reward_xp, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            challenge.day.to_string(),
            challenge.category.as_str(),
            challenge.title,
            challenge.description,
            challenge.target_value,
            target_keys,
            challenge.rewards.bronze,
            challenge.rewards.silver,
            challenge.rewards.gold,
            challenge.rewards.xp,
            now_ms,
        ],
    )?;
    if inserted == 1 {
        info!(day = %challenge.day, category = challenge.category.as_str(), "Created daily challenge");
    }

    get_challenge(conn, challenge.day)?.ok_or_else(|| {
        rusqlite::Error::QueryReturnedNoRows.into()
    })
}

pub fn get_challenge(conn: &Connection, day: DayKey) -> Result<Option<Challenge>> {
    let row = conn
        .query_row(
            "SELECT day_key, category, title, description, target_value, target_keys,
                    reward_bronze, reward_silver, reward_gold, reward_xp
             FROM challenges WHERE day_key = ?1",
            [day.to_string()],
            |r| {
                let day_raw: String = r.get(0)?;
                let category_raw: String = r.get(1)?;
                let keys_raw: Option<String> = r.get(5)?;
                Ok((
                    day_raw,
                    category_raw,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, u32>(4)?,
                    keys_raw,
                    RewardTable {
                        bronze: r.get(6)?,
                        silver: r.get(7)?,
                        gold: r.get(8)?,
                        xp: r.get(9)?,
                    },
                ))
            },
        )
        .optional()?;

    let Some((day_raw, category_raw, title, description, target_value, keys_raw, rewards)) = row
    else {
        return Ok(None);
    };

    let category = ChallengeCategory::from_str(&category_raw)
        .ok_or_else(|| bad_column(1, format!("unknown category '{}'", category_raw)))?;
    let target_keys = keys_raw
        .map(|raw| serde_json::from_str::<Vec<String>>(&raw))
        .transpose()?;

    Ok(Some(Challenge {
        day: day_column(0, &day_raw)?,
        category,
        title,
        description,
        target_value,
        target_keys,
        rewards,
    }))
}

pub fn get_progress(conn: &Connection, user: &UserId, day: DayKey) -> Result<Option<ChallengeProgress>> {
    let progress = conn
        .query_row(
            "SELECT best_value, attempt_count, tier, rewards_claimed, completed_at, claimed_at
             FROM challenge_progress WHERE user_id = ?1 AND day_key = ?2",
            params![user.as_str(), day.to_string()],
            |r| {
                let tier_raw: String = r.get(2)?;
                Ok(ChallengeProgress {
                    user_id: user.clone(),
                    day,
                    best_value: r.get(0)?,
                    attempt_count: r.get(1)?,
                    tier: Tier::from_str(&tier_raw)
                        .ok_or_else(|| bad_column(2, format!("unknown tier '{}'", tier_raw)))?,
                    rewards_claimed: r.get(3)?,
                    completed_at: r.get(4)?,
                    claimed_at: r.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(progress)
}

/// Insert or replace the progress row
pub fn save_progress(conn: &Connection, progress: &ChallengeProgress) -> Result<()> {
    conn.execute(
        "INSERT INTO challenge_progress
            (user_id, day_key, best_value, attempt_count, tier, rewards_claimed, completed_at, claimed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id, day_key) DO UPDATE SET
            best_value = excluded.best_value,
            attempt_count = excluded.attempt_count,
            tier = excluded.tier,
            rewards_claimed = excluded.rewards_claimed,
            completed_at = excluded.completed_at,
            claimed_at = excluded.claimed_at",
        params![
            progress.user_id.as_str(),
            progress.day.to_string(),
            progress.best_value,
            progress.attempt_count,
            progress.tier.as_str(),
            progress.rewards_claimed,
            progress.completed_at,
            progress.claimed_at,
        ],
    )?;
    Ok(())
}

/// Flip `rewards_claimed` if it is still unset. Returns whether this call flipped it.
pub fn mark_claimed(conn: &Connection, user: &UserId, day: DayKey, now_ms: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE challenge_progress SET rewards_claimed = 1, claimed_at = ?3
         WHERE user_id = ?1 AND day_key = ?2 AND rewards_claimed = 0",
        params![user.as_str(), day.to_string(), now_ms],
    )?;
    Ok(changed == 1)
}
