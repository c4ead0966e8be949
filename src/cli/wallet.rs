//! Coin, ledger and premium commands

use anyhow::{Context, Result, anyhow};

use keyquest::clock::day_start_ms;
use keyquest::domain::levels::progress_to_next;
use keyquest::{DayKey, PremiumStatus, ProgressionEngine, UserId};

use super::format_ms;

pub fn award_command(engine: &ProgressionEngine, user: &UserId, amount: i64, source: &str) -> Result<()> {
    let posted = engine.award_coins(user, amount, source)?;
    println!(
        "{:+} coins ({}). Balance: {}",
        posted.entry.amount,
        posted.entry.entry_type.as_str(),
        posted.balance.coins
    );
    Ok(())
}

pub fn spend_command(engine: &ProgressionEngine, user: &UserId, amount: i64, source: &str) -> Result<()> {
    let posted = engine.spend_coins(user, amount, source)?;
    println!("Spent {} coins. Balance: {}", amount, posted.balance.coins);
    Ok(())
}

pub fn balance_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let balance = engine.get_coin_balance(user)?;
    println!("Coins: {}", balance.coins);
    println!(
        "XP:    {} (level {} {}, {:.0}% to next)",
        balance.xp,
        balance.level(),
        balance.title(),
        progress_to_next(balance.xp) * 100.0
    );
    Ok(())
}

pub fn history_command(engine: &ProgressionEngine, user: &UserId, limit: usize) -> Result<()> {
    let entries = engine.get_transaction_history(user, limit)?;
    if entries.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    println!("Transactions ({}):\n", entries.len());
    for entry in entries {
        println!(
            "  {}  {:>14}  {:>+6}  {:>6} -> {:<6}  {}",
            format_ms(entry.created_at),
            entry.entry_type.as_str(),
            entry.amount,
            entry.balance_before,
            entry.balance_after,
            entry.source
        );
    }
    Ok(())
}

pub fn verify_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let audit = engine.verify_ledger(user)?;
    println!("Checked {} entries", audit.entries_checked);
    if audit.is_consistent() {
        println!("Ledger OK: balance {}", audit.ledger_balance.coins);
        return Ok(());
    }

    for brk in &audit.chain_breaks {
        println!(
            "  chain break at #{}: expected before {}, found {}",
            brk.seq, brk.expected_before, brk.actual_before
        );
    }
    for seq in &audit.arithmetic_errors {
        println!("  bad arithmetic at #{}", seq);
    }
    for seq in &audit.negative_balances {
        println!("  negative balance at #{}", seq);
    }
    if audit.ledger_balance != audit.cached_balance {
        println!(
            "  cached balance {} differs from ledger {}",
            audit.cached_balance.coins, audit.ledger_balance.coins
        );
    }
    Err(anyhow!("Ledger verification failed for {}", user))
}

pub fn premium_command(engine: &ProgressionEngine, user: &UserId, until: Option<&str>, off: bool) -> Result<()> {
    let status = if off {
        PremiumStatus::free()
    } else {
        let expires_at = until
            .map(|raw| {
                DayKey::parse(raw)
                    .map(|day| day_start_ms(day.next(), 0))
                    .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
            })
            .transpose()?;
        PremiumStatus::active_until(expires_at)
    };
    engine.set_premium(user, status)?;

    match (status.is_premium, status.expires_at) {
        (false, _) => println!("Premium removed for {}", user),
        (true, Some(expiry)) => println!("Premium active for {} until {}", user, format_ms(expiry)),
        (true, None) => println!("Premium active for {}", user),
    }
    Ok(())
}
