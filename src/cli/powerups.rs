//! Power-up commands

use anyhow::{Result, anyhow};

use keyquest::{PowerUpEffect, PowerUpKind, ProgressionEngine, UserId};

use super::format_ms;

fn parse_kind(raw: &str) -> Result<PowerUpKind> {
    PowerUpKind::from_str(raw).ok_or_else(|| {
        let known: Vec<&str> = PowerUpKind::ALL.iter().map(|k| k.as_str()).collect();
        anyhow!("Unknown power-up '{}' (expected one of: {})", raw, known.join(", "))
    })
}

pub fn list_command(engine: &ProgressionEngine, user: &UserId) -> Result<()> {
    let active = engine.active_power_ups(user)?;
    if active.is_empty() {
        println!("No active power-ups.");
    } else {
        println!("Active:");
        for power_up in active {
            match power_up.effect {
                PowerUpEffect::Timed {
                    multiplier,
                    expires_at,
                } => println!(
                    "  {}  x{} until {}",
                    power_up.kind.label(),
                    multiplier,
                    format_ms(expires_at)
                ),
                PowerUpEffect::Consumable { remaining_uses } => {
                    println!("  {}  {} uses left", power_up.kind.label(), remaining_uses)
                }
            }
        }
    }

    println!("\nInventory:");
    for kind in PowerUpKind::ALL {
        println!("  {:<12} {}", kind.as_str(), engine.inventory_count(user, kind)?);
    }
    Ok(())
}

pub fn activate_command(engine: &ProgressionEngine, user: &UserId, kind: &str) -> Result<()> {
    let power_up = engine.activate_power_up(user, parse_kind(kind)?)?;
    println!("{} activated", power_up.kind.label());
    Ok(())
}

pub fn grant_command(engine: &ProgressionEngine, user: &UserId, item: &str, quantity: u32) -> Result<()> {
    let kind = parse_kind(item)?;
    let total = engine.grant_power_up(user, kind, quantity)?;
    println!("{} now holds {} x {}", user, total, kind.as_str());
    Ok(())
}
