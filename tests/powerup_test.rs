//! Integration tests for power-up activation and use

mod common;

use common::{TestStore, clock_on, user};
use keyquest::progression::COIN_CHARM_SOURCE;
use keyquest::{PowerUpEffect, PowerUpKind, ProgressionError};

const MINUTE: i64 = 60 * 1000;

#[test]
fn test_activation_consumes_inventory_and_stacks() {
    let store = TestStore::new();
    let clock = clock_on("2024-03-05");
    let engine = store.engine(&clock);
    let u = user("alice");

    engine.grant_power_up(&u, PowerUpKind::XpBoost, 2).unwrap();
    let first = engine.activate_power_up(&u, PowerUpKind::XpBoost).unwrap();
    clock.advance_ms(10 * MINUTE);
    let second = engine.activate_power_up(&u, PowerUpKind::XpBoost).unwrap();

    let (
        PowerUpEffect::Timed { expires_at: first_expiry, .. },
        PowerUpEffect::Timed { expires_at: second_expiry, .. },
    ) = (first.effect, second.effect)
    else {
        panic!("xp boost must be timed");
    };
    assert_eq!(second_expiry - first_expiry, 30 * MINUTE);
    assert_eq!(engine.inventory_count(&u, PowerUpKind::XpBoost).unwrap(), 0);

    assert!(matches!(
        engine.activate_power_up(&u, PowerUpKind::XpBoost),
        Err(ProgressionError::NotOwned(_))
    ));
}

#[test]
fn test_coin_charm_runs_out() {
    let store = TestStore::new();
    let clock = clock_on("2024-03-05");
    let u = user("alice");

    store.engine(&clock).grant_power_up(&u, PowerUpKind::CoinCharm, 1).unwrap();
    store.engine(&clock).activate_power_up(&u, PowerUpKind::CoinCharm).unwrap();

    // Three charged claims on consecutive days, then none
    let mut bonus_days = 0;
    for _ in 0..4 {
        let engine = store.engine(&clock);
        engine.submit_challenge_attempt(&u, 1_000.0).unwrap();
        let claim = engine.claim_challenge_rewards(&u).unwrap();
        if claim.entries.iter().any(|e| e.source == COIN_CHARM_SOURCE) {
            bonus_days += 1;
        }
        clock.advance_days(1);
    }
    assert_eq!(bonus_days, 3);

    let engine = store.engine(&clock);
    assert!(engine.active_power_ups(&u).unwrap().is_empty());
    assert!(engine.verify_ledger(&u).unwrap().is_consistent());
}

#[test]
fn test_failed_activation_keeps_inventory() {
    let store = TestStore::new();
    let clock = clock_on("2024-03-05");
    let engine = store.engine(&clock);
    let u = user("alice");

    engine.grant_power_up(&u, PowerUpKind::CoinCharm, 1).unwrap();
    assert!(matches!(
        engine.activate_power_up(&u, PowerUpKind::XpBoost),
        Err(ProgressionError::NotOwned("xp_boost"))
    ));
    assert_eq!(engine.inventory_count(&u, PowerUpKind::CoinCharm).unwrap(), 1);
    assert!(engine.active_power_ups(&u).unwrap().is_empty());
}
