//! Daily challenge commands

use anyhow::Result;

use keyquest::{ProgressionEngine, UserId};

use super::print_events;

pub fn challenge_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let challenge = engine.get_todays_challenge()?;
    println!("{} - {} ({})\n", challenge.day, challenge.title, challenge.category.as_str());
    println!("  {}", challenge.description);
    println!(
        "  Target: {} {}",
        challenge.target_value,
        challenge.category.unit()
    );
    if let Some(keys) = &challenge.target_keys {
        println!("  Keys:   {}", keys.join(" "));
    }
    println!(
        "  Rewards: bronze {} / silver {} / gold {} coins, {} XP",
        challenge.rewards.bronze, challenge.rewards.silver, challenge.rewards.gold, challenge.rewards.xp
    );

    match engine.get_challenge_progress(user)? {
        Some(progress) => {
            println!(
                "\n  Progress: {} (best {:.1}, {} attempts){}",
                progress.tier.label(),
                progress.best_value,
                progress.attempt_count,
                if progress.rewards_claimed { ", claimed" } else { "" }
            );
        }
        None => println!("\n  No attempts yet."),
    }
    Ok(())
}

pub fn attempt_command(engine: &ProgressionEngine, user: &UserId, value: f64) -> Result<()> {
    let result = engine.submit_challenge_attempt(user, value)?;
    println!(
        "Attempt {}: {} (best {:.1} / target {})",
        result.progress.attempt_count,
        result.attempt_tier.label(),
        result.progress.best_value,
        result.challenge.target_value
    );
    print_events(&result.events);
    Ok(())
}

pub fn claim_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let claim = engine.claim_challenge_rewards(user)?;
    println!("Claimed {} rewards for {}", claim.tier.label(), claim.day);
    print_events(&claim.events);
    println!("Balance: {} coins, {} XP", claim.balance.coins, claim.balance.xp);
    Ok(())
}
