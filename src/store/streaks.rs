//! Streak state persistence

use rusqlite::{Connection, OptionalExtension, params};

use super::db::day_column;
use crate::domain::{DayKey, StreakState, UserId};
use crate::error::Result;

pub fn get_streak(conn: &Connection, user: &UserId) -> Result<Option<StreakState>> {
    let row = conn
        .query_row(
            "SELECT current_streak, longest_streak, last_activity_date, freeze_count,
                    freeze_used_dates, total_days_active
             FROM streaks WHERE user_id = ?1",
            [user.as_str()],
            |r| {
                let last: Option<String> = r.get(2)?;
                let last_activity_date = last.map(|raw| day_column(2, &raw)).transpose()?;
                Ok((
                    StreakState {
                        current_streak: r.get(0)?,
                        longest_streak: r.get(1)?,
                        last_activity_date,
                        freeze_count: r.get(3)?,
                        freeze_used_dates: Vec::new(),
                        total_days_active: r.get(5)?,
                    },
                    r.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((mut state, frozen_raw)) = row else {
        return Ok(None);
    };
    state.freeze_used_dates = serde_json::from_str::<Vec<DayKey>>(&frozen_raw)?;
    Ok(Some(state))
}

pub fn save_streak(conn: &Connection, user: &UserId, state: &StreakState, now_ms: i64) -> Result<()> {
    let frozen = serde_json::to_string(&state.freeze_used_dates)?;
    conn.execute(
        "INSERT INTO streaks
            (user_id, current_streak, longest_streak, last_activity_date, freeze_count,
             freeze_used_dates, total_days_active, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id) DO UPDATE SET
            current_streak = excluded.current_streak,
            longest_streak = excluded.longest_streak,
            last_activity_date = excluded.last_activity_date,
            freeze_count = excluded.freeze_count,
            freeze_used_dates = excluded.freeze_used_dates,
            total_days_active = excluded.total_days_active,
            updated_at = excluded.updated_at",
        params![
            user.as_str(),
            state.current_streak,
            state.longest_streak,
            state.last_activity_date.map(|d| d.to_string()),
            state.freeze_count,
            frozen,
            state.total_days_active,
            now_ms,
        ],
    )?;
    Ok(())
}
