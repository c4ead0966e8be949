//! Streak commands

use anyhow::Result;

use keyquest::domain::streak::multiplier;
use keyquest::{ProgressionEngine, ProgressionError, UserId};

use super::print_events;

pub fn streak_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let state = match engine.get_streak(user) {
        Ok(state) => state,
        Err(ProgressionError::StreakNotFound) => {
            println!("No streak yet. Run `keyquest activity` after practicing.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let today = engine.today();

    println!("Streak for {}\n", user);
    println!(
        "  Current:  {} days (x{} reward)",
        state.effective_streak(today),
        multiplier(state.current_streak)
    );
    println!("  Longest:  {} days", state.longest_streak);
    println!("  Active:   {} days total", state.total_days_active);
    println!("  Freezes:  {}", state.freeze_count);
    if let Some(last) = state.last_activity_date {
        println!("  Last day: {}{}", last, if state.was_frozen(last) { " (frozen)" } else { "" });
    }
    if engine.is_streak_at_risk(user)? {
        println!("\n  Your streak is at risk: practice today to keep it.");
    }
    Ok(())
}

pub fn activity_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let result = engine.record_activity(user)?;
    if result.reward.is_none() {
        println!("Already counted today ({} day streak).", result.streak.current_streak);
        return Ok(());
    }
    println!("Day counted: {} day streak", result.streak.current_streak);
    print_events(&result.events);
    Ok(())
}

pub fn freeze_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let used = engine.use_streak_freeze(user)?;
    println!(
        "Today is frozen. Streak stays at {} days, {} freezes left.",
        used.streak.current_streak, used.streak.freeze_count
    );
    print_events(&used.events);
    Ok(())
}

pub fn buy_freeze_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let purchase = engine.purchase_streak_freeze(user)?;
    println!(
        "Bought a streak freeze for {} coins. You now hold {}. Balance: {}",
        -purchase.entry.amount, purchase.streak.freeze_count, purchase.entry.balance_after
    );
    Ok(())
}
