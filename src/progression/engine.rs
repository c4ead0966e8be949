//! Progression engine - orchestrates challenges, streaks and the ledger
//!
//! Every mutating operation reads the clock once and runs as a single
//! `BEGIN IMMEDIATE` transaction, so it either fully applies or leaves the
//! store untouched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::events::ProgressionEvent;
use crate::clock::Clock;
use crate::domain::levels::level_up;
use crate::domain::powerup::coin_charm_bonus;
use crate::domain::progress::apply_attempt;
use crate::domain::streak::{self, StreakTransition};
use crate::domain::tier::payout_for;
use crate::domain::{
    ActivationRules, Balance, Challenge, ChallengeProgress, DayKey, LedgerAudit, LedgerEntry, Payout,
    Posting, PowerUp, PowerUpKind, PremiumStatus, StreakState, Tier, UserId, challenge_for,
};
use crate::error::{ProgressionError, Result};
use crate::store::{ProgressDb, challenges, ledger, powerups, streaks, users};

/// Ledger source tag for the daily streak reward
pub const STREAK_REWARD_SOURCE: &str = "streak:daily";
/// Ledger source tag for streak freeze purchases
pub const FREEZE_PURCHASE_SOURCE: &str = "shop:streak_freeze";
/// Ledger source tag for the coin charm bonus
pub const COIN_CHARM_SOURCE: &str = "powerup:coin_charm";

/// Tunables for shop prices, caps and power-up durations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionSettings {
    pub streak_freeze_price: i64,
    pub max_streak_freezes: u32,
    pub history_limit_max: usize,
    pub activation: ActivationRules,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            streak_freeze_price: 50,
            max_streak_freezes: 3,
            history_limit_max: 100,
            activation: ActivationRules::default(),
        }
    }
}

/// Result of submitting a challenge attempt
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub challenge: Challenge,
    pub progress: ChallengeProgress,
    /// Tier this attempt reached on its own
    pub attempt_tier: Tier,
    pub events: Vec<ProgressionEvent>,
}

/// Result of claiming the day's challenge rewards
#[derive(Debug, Clone)]
pub struct ClaimResult {
    pub day: DayKey,
    pub tier: Tier,
    pub payout: Payout,
    /// Challenge payout first, then any power-up bonus
    pub entries: Vec<LedgerEntry>,
    pub balance: Balance,
    pub events: Vec<ProgressionEvent>,
}

/// Result of recording the day's activity
#[derive(Debug, Clone)]
pub struct ActivityResult {
    pub streak: StreakState,
    pub transition: StreakTransition,
    /// Daily reward posting, absent when the day was already counted
    pub reward: Option<LedgerEntry>,
    pub events: Vec<ProgressionEvent>,
}

/// A single ledger posting and the balance it left behind
#[derive(Debug, Clone)]
pub struct Posted {
    pub entry: LedgerEntry,
    pub balance: Balance,
}

/// Result of spending a freeze on today
#[derive(Debug, Clone)]
pub struct FreezeUse {
    pub streak: StreakState,
    pub day: DayKey,
    pub events: Vec<ProgressionEvent>,
}

/// Result of buying a streak freeze
#[derive(Debug, Clone)]
pub struct FreezePurchase {
    pub streak: StreakState,
    pub entry: LedgerEntry,
}

/// Facade over the store for one database
pub struct ProgressionEngine {
    db: ProgressDb,
    clock: Arc<dyn Clock>,
    settings: ProgressionSettings,
}

impl ProgressionEngine {
    pub fn new(db: ProgressDb, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(db, clock, ProgressionSettings::default())
    }

    pub fn with_settings(db: ProgressDb, clock: Arc<dyn Clock>, settings: ProgressionSettings) -> Self {
        Self { db, clock, settings }
    }

    pub fn db(&self) -> &ProgressDb {
        &self.db
    }

    pub fn settings(&self) -> &ProgressionSettings {
        &self.settings
    }

    /// The current day key
    pub fn today(&self) -> DayKey {
        self.clock.as_of().today
    }

    // ========================================
    // CHALLENGES
    // ========================================

    /// Today's challenge, as stored or as it will be created
    pub fn get_todays_challenge(&self) -> Result<Challenge> {
        let today = self.clock.as_of().today;
        let stored = self.db.read(|conn| challenges::get_challenge(conn, today))?;
        Ok(stored.unwrap_or_else(|| challenge_for(today)))
    }

    /// Persist today's challenge if no caller has yet, and return it
    pub fn ensure_todays_challenge(&self) -> Result<Challenge> {
        let as_of = self.clock.as_of();
        let generated = challenge_for(as_of.today);
        self.db
            .write(|tx| challenges::ensure_challenge(tx, &generated, as_of.now_ms))
    }

    /// Record an attempt at today's challenge.
    ///
    /// The recorded tier and best value never go down; the attempt counter
    /// always goes up.
    pub fn submit_challenge_attempt(&self, user: &UserId, value: f64) -> Result<AttemptResult> {
        if !value.is_finite() || value < 0.0 {
            return Err(ProgressionError::Validation(format!(
                "attempt value must be a finite, non-negative number (got {})",
                value
            )));
        }

        let as_of = self.clock.as_of();
        let generated = challenge_for(as_of.today);

        let result = self.db.write(|tx| {
            let challenge = challenges::ensure_challenge(tx, &generated, as_of.now_ms)?;
            let existing = challenges::get_progress(tx, user, as_of.today)?;
            let outcome = apply_attempt(
                existing.as_ref(),
                user,
                as_of.today,
                value,
                challenge.target_value,
                as_of.now_ms,
            );
            challenges::save_progress(tx, &outcome.progress)?;

            let mut events = Vec::new();
            if outcome.first_completion() {
                events.push(ProgressionEvent::ChallengeCompleted {
                    day: as_of.today,
                    tier: outcome.progress.tier,
                });
            } else if outcome.improved() {
                events.push(ProgressionEvent::TierImproved {
                    day: as_of.today,
                    from: outcome.previous_tier,
                    to: outcome.progress.tier,
                });
            }

            Ok(AttemptResult {
                challenge,
                progress: outcome.progress,
                attempt_tier: outcome.attempt_tier,
                events,
            })
        })?;

        info!(
            user = %user,
            day = %as_of.today,
            value,
            tier = result.progress.tier.as_str(),
            attempts = result.progress.attempt_count,
            "Challenge attempt recorded"
        );
        Ok(result)
    }

    /// The user's progress on today's challenge, if any attempt was made
    pub fn get_challenge_progress(&self, user: &UserId) -> Result<Option<ChallengeProgress>> {
        let today = self.clock.as_of().today;
        self.db.read(|conn| challenges::get_progress(conn, user, today))
    }

    /// Pay out today's challenge rewards exactly once.
    ///
    /// The claimed check, the ledger postings and the claimed flag commit
    /// together; a concurrent duplicate sees `AlreadyClaimed`.
    pub fn claim_challenge_rewards(&self, user: &UserId) -> Result<ClaimResult> {
        let as_of = self.clock.as_of();
        let today = as_of.today;
        let now = as_of.now_ms;

        let result = self.db.write(|tx| {
            let progress =
                challenges::get_progress(tx, user, today)?.ok_or(ProgressionError::NoProgress(today))?;
            if progress.rewards_claimed {
                return Err(ProgressionError::AlreadyClaimed(today));
            }
            if !progress.tier.is_completed() {
                return Err(ProgressionError::NotCompleted(today));
            }
            let challenge = challenges::get_challenge(tx, today)?.ok_or_else(|| {
                ProgressionError::Corrupt(format!("progress for {} has no challenge", today))
            })?;

            let premium = users::premium_status(tx, user)?.is_active(now);
            let payout = payout_for(progress.tier, &challenge.rewards, premium)
                .ok_or(ProgressionError::NotCompleted(today))?;

            powerups::prune_power_ups(tx, user, now)?;
            let xp_multiplier = powerups::get_power_up(tx, user, PowerUpKind::XpBoost)?
                .and_then(|boost| boost.multiplier_at(now))
                .unwrap_or(1);
            let xp = payout.xp * i64::from(xp_multiplier);

            let before = ledger::balance(tx, user)?;
            let source = format!("challenge:{}", today);
            // Payout coins already include the premium multiplier
            let posting = if payout.premium {
                Posting::premium_bonus(payout.coins, source)
            } else {
                Posting::earn(payout.coins, source)
            };
            let mut entries = vec![ledger::post(tx, user, &posting.with_xp(xp), now)?];

            if let Some(charm) = powerups::get_power_up(tx, user, PowerUpKind::CoinCharm)? {
                if let Some(used) = charm.consume() {
                    let bonus = coin_charm_bonus(challenge.rewards.coins_for(progress.tier));
                    let charm_posting = Posting::earn(bonus, COIN_CHARM_SOURCE).with_premium(premium);
                    entries.push(ledger::post(tx, user, &charm_posting, now)?);
                    powerups::save_power_up(tx, user, &used)?;
                    powerups::prune_power_ups(tx, user, now)?;
                }
            }

            if !challenges::mark_claimed(tx, user, today, now)? {
                return Err(ProgressionError::AlreadyClaimed(today));
            }

            let balance = ledger::balance(tx, user)?;
            let mut events = vec![ProgressionEvent::RewardsClaimed {
                day: today,
                tier: progress.tier,
                coins: entries.iter().map(|e| e.amount).sum(),
                xp,
            }];
            events.extend(entries.iter().map(ProgressionEvent::posted));
            if let Some(up) = level_up(before.xp, balance.xp) {
                events.push(ProgressionEvent::LevelUp(up));
            }

            Ok(ClaimResult {
                day: today,
                tier: progress.tier,
                payout,
                entries,
                balance,
                events,
            })
        })?;

        info!(
            user = %user,
            day = %today,
            tier = result.tier.as_str(),
            coins = result.payout.coins,
            premium = result.payout.premium,
            balance = result.balance.coins,
            "Challenge rewards claimed"
        );
        Ok(result)
    }

    // ========================================
    // STREAKS
    // ========================================

    pub fn get_streak(&self, user: &UserId) -> Result<StreakState> {
        self.db
            .read(|conn| streaks::get_streak(conn, user))?
            .ok_or(ProgressionError::StreakNotFound)
    }

    /// True when yesterday was covered but today is neither practiced nor frozen
    pub fn is_streak_at_risk(&self, user: &UserId) -> Result<bool> {
        let today = self.clock.as_of().today;
        let state = self.db.read(|conn| streaks::get_streak(conn, user))?;
        Ok(state.is_some_and(|s| s.is_at_risk(today)))
    }

    /// Count today toward the user's streak and pay the daily reward.
    ///
    /// Recording the same day twice is a no-op.
    pub fn record_activity(&self, user: &UserId) -> Result<ActivityResult> {
        let as_of = self.clock.as_of();

        let result = self.db.write(|tx| {
            let existing = streaks::get_streak(tx, user)?;
            let update = streak::record_activity(existing.as_ref(), as_of.today);

            if !update.transition.counted_day() {
                return Ok(ActivityResult {
                    streak: update.state,
                    transition: update.transition,
                    reward: None,
                    events: Vec::new(),
                });
            }

            streaks::save_streak(tx, user, &update.state, as_of.now_ms)?;

            let mut events = Vec::new();
            match update.transition {
                StreakTransition::ExtendedWithFreeze { frozen_day } => {
                    events.push(ProgressionEvent::FreezeConsumed { day: frozen_day });
                    events.push(ProgressionEvent::StreakExtended {
                        count: update.state.current_streak,
                    });
                }
                StreakTransition::Reset { previous } => {
                    events.push(ProgressionEvent::StreakReset { previous });
                }
                StreakTransition::Started | StreakTransition::Extended => {
                    events.push(ProgressionEvent::StreakExtended {
                        count: update.state.current_streak,
                    });
                }
                StreakTransition::Unchanged => {}
            }
            if let Some(days) = update.milestone() {
                events.push(ProgressionEvent::MilestoneReached { days });
            }

            let premium = users::premium_status(tx, user)?.is_active(as_of.now_ms);
            let posting = Posting::earn(update.daily_reward(), STREAK_REWARD_SOURCE).with_premium(premium);
            let entry = ledger::post(tx, user, &posting, as_of.now_ms)?;
            events.push(ProgressionEvent::posted(&entry));

            Ok(ActivityResult {
                streak: update.state,
                transition: update.transition,
                reward: Some(entry),
                events,
            })
        })?;

        if result.transition.counted_day() {
            info!(
                user = %user,
                day = %as_of.today,
                current = result.streak.current_streak,
                longest = result.streak.longest_streak,
                transition = ?result.transition,
                "Streak activity recorded"
            );
        } else {
            debug!(user = %user, day = %as_of.today, "Activity already recorded today");
        }
        Ok(result)
    }

    /// Spend one freeze to protect today without activity.
    ///
    /// Practice recorded later the same day still counts toward the streak.
    pub fn use_streak_freeze(&self, user: &UserId) -> Result<FreezeUse> {
        let as_of = self.clock.as_of();

        let used = self.db.write(|tx| {
            let existing = streaks::get_streak(tx, user)?.ok_or(ProgressionError::StreakNotFound)?;
            let next = streak::use_freeze(&existing, as_of.today)?;
            streaks::save_streak(tx, user, &next, as_of.now_ms)?;
            Ok(FreezeUse {
                streak: next,
                day: as_of.today,
                events: vec![ProgressionEvent::FreezeConsumed { day: as_of.today }],
            })
        });

        match &used {
            Ok(used) => info!(
                user = %user,
                day = %as_of.today,
                freezes_left = used.streak.freeze_count,
                "Streak freeze used"
            ),
            Err(e) => warn!(user = %user, error = %e, "Streak freeze refused"),
        }
        used
    }

    /// Buy one streak freeze with coins
    pub fn purchase_streak_freeze(&self, user: &UserId) -> Result<FreezePurchase> {
        let as_of = self.clock.as_of();
        let price = self.settings.streak_freeze_price;
        let cap = self.settings.max_streak_freezes;

        let purchase = self.db.write(|tx| {
            let existing = streaks::get_streak(tx, user)?.unwrap_or_default();
            let next = streak::add_freeze(&existing, cap)?;
            let entry = ledger::post(
                tx,
                user,
                &Posting::purchase(price, FREEZE_PURCHASE_SOURCE),
                as_of.now_ms,
            )?;
            streaks::save_streak(tx, user, &next, as_of.now_ms)?;
            Ok(FreezePurchase { streak: next, entry })
        })?;

        info!(
            user = %user,
            price,
            freezes = purchase.streak.freeze_count,
            balance = purchase.entry.balance_after,
            "Streak freeze purchased"
        );
        Ok(purchase)
    }

    // ========================================
    // COINS
    // ========================================

    /// Credit coins. Premium accounts receive the doubled amount as `premium_bonus`.
    pub fn award_coins(&self, user: &UserId, amount: i64, source: &str) -> Result<Posted> {
        if amount <= 0 {
            return Err(ProgressionError::Validation(format!(
                "award amount must be positive (got {})",
                amount
            )));
        }
        let as_of = self.clock.as_of();

        self.db.write(|tx| {
            let premium = users::premium_status(tx, user)?.is_active(as_of.now_ms);
            let posting = Posting::earn(amount, source).with_premium(premium);
            let entry = ledger::post(tx, user, &posting, as_of.now_ms)?;
            let balance = ledger::balance(tx, user)?;
            Ok(Posted { entry, balance })
        })
    }

    /// Debit coins, failing with `InsufficientFunds` rather than going negative
    pub fn spend_coins(&self, user: &UserId, amount: i64, source: &str) -> Result<Posted> {
        if amount <= 0 {
            return Err(ProgressionError::Validation(format!(
                "spend amount must be positive (got {})",
                amount
            )));
        }
        let as_of = self.clock.as_of();

        let posted = self.db.write(|tx| {
            let entry = ledger::post(tx, user, &Posting::spend(amount, source), as_of.now_ms)?;
            let balance = ledger::balance(tx, user)?;
            Ok(Posted { entry, balance })
        });
        if let Err(ProgressionError::InsufficientFunds { balance, required }) = &posted {
            warn!(user = %user, balance, required, "Spend refused");
        }
        posted
    }

    pub fn get_coin_balance(&self, user: &UserId) -> Result<Balance> {
        self.db.read(|conn| ledger::balance(conn, user))
    }

    /// Newest entries first, at most `limit`
    pub fn get_transaction_history(&self, user: &UserId, limit: usize) -> Result<Vec<LedgerEntry>> {
        if limit == 0 || limit > self.settings.history_limit_max {
            return Err(ProgressionError::Validation(format!(
                "history limit must be between 1 and {} (got {})",
                self.settings.history_limit_max, limit
            )));
        }
        self.db.read(|conn| ledger::history(conn, user, limit))
    }

    /// Replay the user's ledger and compare it with the cached balance
    pub fn verify_ledger(&self, user: &UserId) -> Result<LedgerAudit> {
        let audit = self.db.read(|conn| ledger::audit(conn, user))?;
        if !audit.is_consistent() {
            warn!(
                user = %user,
                chain_breaks = audit.chain_breaks.len(),
                ledger = audit.ledger_balance.coins,
                cached = audit.cached_balance.coins,
                "Ledger inconsistency detected"
            );
        }
        Ok(audit)
    }

    // ========================================
    // POWER-UPS
    // ========================================

    /// Activate one owned power-up, extending it if already running
    pub fn activate_power_up(&self, user: &UserId, kind: PowerUpKind) -> Result<PowerUp> {
        let as_of = self.clock.as_of();
        let rules = self.settings.activation;

        let power_up = self.db.write(|tx| {
            powerups::prune_power_ups(tx, user, as_of.now_ms)?;
            if !users::take_item(tx, user, kind.as_str())? {
                return Err(ProgressionError::NotOwned(kind.as_str()));
            }
            let existing = powerups::get_power_up(tx, user, kind)?;
            let next = PowerUp::activate(existing.as_ref(), kind, as_of.now_ms, &rules);
            powerups::save_power_up(tx, user, &next)?;
            Ok(next)
        })?;

        info!(user = %user, kind = kind.as_str(), effect = ?power_up.effect, "Power-up activated");
        Ok(power_up)
    }

    /// Live power-ups; expired or exhausted ones are pruned first
    pub fn active_power_ups(&self, user: &UserId) -> Result<Vec<PowerUp>> {
        let now = self.clock.as_of().now_ms;
        self.db.write(|tx| {
            let pruned = powerups::prune_power_ups(tx, user, now)?;
            if pruned > 0 {
                debug!(user = %user, pruned, "Pruned dead power-ups");
            }
            powerups::list_power_ups(tx, user)
        })
    }

    // ========================================
    // COLLABORATOR HOOKS
    // ========================================

    pub fn premium_status(&self, user: &UserId) -> Result<PremiumStatus> {
        self.db.read(|conn| users::premium_status(conn, user))
    }

    /// Record premium status reported by the billing collaborator
    pub fn set_premium(&self, user: &UserId, status: PremiumStatus) -> Result<()> {
        let now = self.clock.as_of().now_ms;
        self.db.write(|tx| users::set_premium(tx, user, status, now))?;
        info!(user = %user, premium = status.is_premium, expires_at = ?status.expires_at, "Premium status updated");
        Ok(())
    }

    /// Add power-up items to the user's inventory (shop collaborator)
    pub fn grant_power_up(&self, user: &UserId, kind: PowerUpKind, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(ProgressionError::Validation("grant quantity must be positive".into()));
        }
        self.db
            .write(|tx| users::grant_item(tx, user, kind.as_str(), quantity))
    }

    pub fn inventory_count(&self, user: &UserId, kind: PowerUpKind) -> Result<u32> {
        self.db.read(|conn| users::item_quantity(conn, user, kind.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::EntryType;
    use crate::error::ErrorKind;

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    fn user() -> UserId {
        UserId::new("typist").unwrap()
    }

    fn engine_on(d: &str) -> (ProgressionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::on_day(day(d)));
        let db = ProgressDb::open_in_memory().unwrap();
        (ProgressionEngine::new(db, clock.clone()), clock)
    }

    #[test]
    fn test_todays_challenge_is_generated_then_stored() {
        let (engine, _clock) = engine_on("2024-03-15");
        let preview = engine.get_todays_challenge().unwrap();
        let stored = engine.ensure_todays_challenge().unwrap();
        assert_eq!(preview, stored);
        assert_eq!(engine.get_todays_challenge().unwrap(), stored);
    }

    #[test]
    fn test_attempt_events() {
        // 2024-03-15: endurance, target 600
        let (engine, _clock) = engine_on("2024-03-15");
        let u = user();

        let first = engine.submit_challenge_attempt(&u, 300.0).unwrap();
        assert_eq!(first.progress.tier, Tier::Bronze);
        assert!(matches!(
            first.events.as_slice(),
            [ProgressionEvent::ChallengeCompleted {
                tier: Tier::Bronze,
                ..
            }]
        ));

        let second = engine.submit_challenge_attempt(&u, 600.0).unwrap();
        assert!(matches!(
            second.events.as_slice(),
            [ProgressionEvent::TierImproved {
                from: Tier::Bronze,
                to: Tier::Gold,
                ..
            }]
        ));

        let worse = engine.submit_challenge_attempt(&u, 10.0).unwrap();
        assert!(worse.events.is_empty());
        assert_eq!(worse.progress.tier, Tier::Gold);
        assert_eq!(worse.progress.attempt_count, 3);
    }

    #[test]
    fn test_attempt_rejects_bad_values() {
        let (engine, _clock) = engine_on("2024-03-15");
        for value in [f64::NAN, f64::INFINITY, -1.0] {
            let err = engine.submit_challenge_attempt(&user(), value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(engine.get_challenge_progress(&user()).unwrap().is_none());
    }

    #[test]
    fn test_claim_failures() {
        let (engine, _clock) = engine_on("2024-03-15");
        let u = user();

        assert!(matches!(
            engine.claim_challenge_rewards(&u),
            Err(ProgressionError::NoProgress(_))
        ));

        engine.submit_challenge_attempt(&u, 10.0).unwrap();
        assert!(matches!(
            engine.claim_challenge_rewards(&u),
            Err(ProgressionError::NotCompleted(_))
        ));

        engine.submit_challenge_attempt(&u, 450.0).unwrap();
        let claim = engine.claim_challenge_rewards(&u).unwrap();
        // Silver on 2024-03-15 pays 78 coins and 26 XP
        assert_eq!(claim.tier, Tier::Silver);
        assert_eq!(claim.balance.coins, 78);
        assert_eq!(claim.balance.xp, 26);

        assert!(matches!(
            engine.claim_challenge_rewards(&u),
            Err(ProgressionError::AlreadyClaimed(_))
        ));
        assert_eq!(engine.get_coin_balance(&u).unwrap().coins, 78);
    }

    #[test]
    fn test_claim_is_for_today_only() {
        let (engine, clock) = engine_on("2024-03-15");
        let u = user();
        engine.submit_challenge_attempt(&u, 600.0).unwrap();
        clock.advance_days(1);
        assert!(matches!(
            engine.claim_challenge_rewards(&u),
            Err(ProgressionError::NoProgress(_))
        ));
    }

    #[test]
    fn test_record_activity_pays_daily_reward_once() {
        let (engine, _clock) = engine_on("2024-05-01");
        let u = user();

        let first = engine.record_activity(&u).unwrap();
        assert_eq!(first.transition, StreakTransition::Started);
        assert_eq!(first.reward.as_ref().map(|e| e.amount), Some(5));
        assert_eq!(first.reward.as_ref().map(|e| e.source.as_str()), Some(STREAK_REWARD_SOURCE));

        let again = engine.record_activity(&u).unwrap();
        assert_eq!(again.transition, StreakTransition::Unchanged);
        assert!(again.reward.is_none());
        assert_eq!(engine.get_coin_balance(&u).unwrap().coins, 5);
    }

    #[test]
    fn test_milestone_event_on_seventh_day() {
        let (engine, clock) = engine_on("2024-05-01");
        let u = user();
        for _ in 0..6 {
            engine.record_activity(&u).unwrap();
            clock.advance_days(1);
        }
        let seventh = engine.record_activity(&u).unwrap();
        assert_eq!(seventh.streak.current_streak, 7);
        assert!(seventh.events.contains(&ProgressionEvent::MilestoneReached { days: 7 }));
        // Multiplier kicks in at seven days
        assert_eq!(seventh.reward.map(|e| e.amount), Some(10));
    }

    #[test]
    fn test_premium_daily_reward_is_doubled() {
        let (engine, _clock) = engine_on("2024-05-01");
        let u = user();
        engine.set_premium(&u, PremiumStatus::active_until(None)).unwrap();
        let result = engine.record_activity(&u).unwrap();
        let entry = result.reward.unwrap();
        assert_eq!(entry.entry_type, EntryType::PremiumBonus);
        assert_eq!(entry.amount, 10);
    }

    #[test]
    fn test_expired_premium_is_ignored() {
        let (engine, clock) = engine_on("2024-05-01");
        let u = user();
        let expiry = clock.now_ms() - 1;
        engine.set_premium(&u, PremiumStatus::active_until(Some(expiry))).unwrap();
        let posted = engine.award_coins(&u, 40, "lesson:1").unwrap();
        assert_eq!(posted.entry.entry_type, EntryType::Earn);
        assert_eq!(posted.balance.coins, 40);
    }

    #[test]
    fn test_streak_queries() {
        let (engine, clock) = engine_on("2024-05-01");
        let u = user();
        assert!(matches!(engine.get_streak(&u), Err(ProgressionError::StreakNotFound)));
        assert!(!engine.is_streak_at_risk(&u).unwrap());

        engine.record_activity(&u).unwrap();
        assert!(!engine.is_streak_at_risk(&u).unwrap());
        clock.advance_days(1);
        assert!(engine.is_streak_at_risk(&u).unwrap());
        clock.advance_days(1);
        assert!(!engine.is_streak_at_risk(&u).unwrap());
    }

    #[test]
    fn test_purchase_and_use_freeze() {
        let (engine, clock) = engine_on("2024-05-01");
        let u = user();
        engine.award_coins(&u, 100, "grant").unwrap();
        engine.record_activity(&u).unwrap();

        let purchase = engine.purchase_streak_freeze(&u).unwrap();
        assert_eq!(purchase.streak.freeze_count, 1);
        assert_eq!(purchase.entry.entry_type, EntryType::Purchase);
        assert_eq!(purchase.entry.amount, -50);
        assert_eq!(purchase.entry.source, FREEZE_PURCHASE_SOURCE);

        clock.advance_days(1);
        let frozen = engine.use_streak_freeze(&u).unwrap();
        assert_eq!(frozen.streak.freeze_count, 0);
        assert_eq!(frozen.streak.current_streak, 1);
        assert_eq!(frozen.streak.total_days_active, 1);
        assert_eq!(frozen.events, vec![ProgressionEvent::FreezeConsumed { day: day("2024-05-02") }]);

        assert!(matches!(
            engine.use_streak_freeze(&u),
            Err(ProgressionError::Freeze(streak::FreezeRefusal::NoFreezes))
        ));

        clock.advance_days(1);
        let next = engine.record_activity(&u).unwrap();
        assert_eq!(next.streak.current_streak, 2);
    }

    #[test]
    fn test_freeze_purchase_without_funds_changes_nothing() {
        let (engine, _clock) = engine_on("2024-05-01");
        let u = user();
        engine.award_coins(&u, 30, "grant").unwrap();

        assert!(matches!(
            engine.purchase_streak_freeze(&u),
            Err(ProgressionError::InsufficientFunds { .. })
        ));
        assert!(matches!(engine.get_streak(&u), Err(ProgressionError::StreakNotFound)));
        assert_eq!(engine.get_coin_balance(&u).unwrap().coins, 30);
    }

    #[test]
    fn test_freeze_cap() {
        let clock = Arc::new(ManualClock::on_day(day("2024-05-01")));
        let settings = ProgressionSettings {
            max_streak_freezes: 1,
            streak_freeze_price: 10,
            ..Default::default()
        };
        let engine = ProgressionEngine::with_settings(ProgressDb::open_in_memory().unwrap(), clock, settings);
        let u = user();
        engine.award_coins(&u, 100, "grant").unwrap();

        engine.purchase_streak_freeze(&u).unwrap();
        assert!(matches!(
            engine.purchase_streak_freeze(&u),
            Err(ProgressionError::Freeze(streak::FreezeRefusal::LimitReached(1)))
        ));
        assert_eq!(engine.get_coin_balance(&u).unwrap().coins, 90);
    }

    #[test]
    fn test_award_and_spend_validation() {
        let (engine, _clock) = engine_on("2024-05-01");
        let u = user();
        assert_eq!(engine.award_coins(&u, 0, "x").unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(engine.spend_coins(&u, -5, "x").unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            engine.get_transaction_history(&u, 0).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            engine.get_transaction_history(&u, 101).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(engine.get_transaction_history(&u, 100).unwrap().is_empty());
    }

    #[test]
    fn test_power_up_requires_inventory() {
        let (engine, _clock) = engine_on("2024-05-01");
        let u = user();
        assert!(matches!(
            engine.activate_power_up(&u, PowerUpKind::XpBoost),
            Err(ProgressionError::NotOwned("xp_boost"))
        ));

        engine.grant_power_up(&u, PowerUpKind::XpBoost, 1).unwrap();
        engine.activate_power_up(&u, PowerUpKind::XpBoost).unwrap();
        assert_eq!(engine.inventory_count(&u, PowerUpKind::XpBoost).unwrap(), 0);
        assert_eq!(engine.active_power_ups(&u).unwrap().len(), 1);
    }

    #[test]
    fn test_xp_boost_doubles_claim_xp_and_expires() {
        let (engine, clock) = engine_on("2024-03-15");
        let u = user();
        engine.grant_power_up(&u, PowerUpKind::XpBoost, 1).unwrap();
        engine.activate_power_up(&u, PowerUpKind::XpBoost).unwrap();

        engine.submit_challenge_attempt(&u, 600.0).unwrap();
        let claim = engine.claim_challenge_rewards(&u).unwrap();
        assert_eq!(claim.balance.xp, 52);
        assert_eq!(claim.payout.xp, 26);

        clock.advance_ms(engine.settings().activation.xp_boost_ms);
        assert!(engine.active_power_ups(&u).unwrap().is_empty());
    }

    #[test]
    fn test_coin_charm_adds_bonus_entry() {
        let (engine, _clock) = engine_on("2024-03-15");
        let u = user();
        engine.grant_power_up(&u, PowerUpKind::CoinCharm, 1).unwrap();
        engine.activate_power_up(&u, PowerUpKind::CoinCharm).unwrap();

        engine.submit_challenge_attempt(&u, 600.0).unwrap();
        let claim = engine.claim_challenge_rewards(&u).unwrap();
        // Gold pays 104; the charm adds 25% of that
        assert_eq!(claim.entries.len(), 2);
        assert_eq!(claim.entries[1].amount, 26);
        assert_eq!(claim.entries[1].source, COIN_CHARM_SOURCE);
        assert_eq!(claim.balance.coins, 130);

        let remaining = engine.active_power_ups(&u).unwrap();
        assert_eq!(
            remaining[0].effect,
            crate::domain::PowerUpEffect::Consumable { remaining_uses: 2 }
        );
        assert!(engine.verify_ledger(&u).unwrap().is_consistent());
    }

    #[test]
    fn test_claim_level_up_event() {
        let (engine, _clock) = engine_on("2024-03-15");
        let u = user();
        engine
            .db()
            .write(|tx| ledger::post(tx, &u, &Posting::earn(1, "seed").with_xp(90), 0))
            .unwrap();

        engine.submit_challenge_attempt(&u, 600.0).unwrap();
        let claim = engine.claim_challenge_rewards(&u).unwrap();
        assert_eq!(claim.balance.level(), 2);
        assert!(claim.events.iter().any(|e| matches!(
            e,
            ProgressionEvent::LevelUp(up) if up.old_level == 1 && up.new_level == 2
        )));
        assert!(claim
            .events
            .iter()
            .any(|e| matches!(e, ProgressionEvent::RewardsClaimed { coins: 104, .. })));
    }
}
