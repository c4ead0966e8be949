//! Per-user, per-day challenge progress

use serde::{Deserialize, Serialize};

use super::date::DayKey;
use super::tier::{Tier, merge_tier, resolve_tier};
use super::user::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub user_id: UserId,
    pub day: DayKey,
    pub best_value: f64,
    pub attempt_count: u32,
    pub tier: Tier,
    pub rewards_claimed: bool,
    /// First time the tier left pending (ms since epoch)
    pub completed_at: Option<i64>,
    pub claimed_at: Option<i64>,
}

/// Result of folding one attempt into the progress row
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub progress: ChallengeProgress,
    /// Tier this attempt reached on its own
    pub attempt_tier: Tier,
    /// Recorded tier before the attempt
    pub previous_tier: Tier,
}

impl AttemptOutcome {
    /// The attempt raised the recorded tier
    pub fn improved(&self) -> bool {
        self.progress.tier > self.previous_tier
    }

    /// The attempt was the first to leave pending
    pub fn first_completion(&self) -> bool {
        !self.previous_tier.is_completed() && self.progress.tier.is_completed()
    }
}

/// Fold an attempt of `value` against `target` into `existing`.
///
/// Best value and tier only ever move up; the attempt counter always does.
pub fn apply_attempt(
    existing: Option<&ChallengeProgress>,
    user_id: &UserId,
    day: DayKey,
    value: f64,
    target: u32,
    now_ms: i64,
) -> AttemptOutcome {
    let mut progress = existing.cloned().unwrap_or_else(|| ChallengeProgress {
        user_id: user_id.clone(),
        day,
        best_value: 0.0,
        attempt_count: 0,
        tier: Tier::Pending,
        rewards_claimed: false,
        completed_at: None,
        claimed_at: None,
    });

    let previous_tier = progress.tier;
    let attempt_tier = resolve_tier(value, target);

    progress.attempt_count += 1;
    progress.best_value = progress.best_value.max(value);
    progress.tier = merge_tier(previous_tier, attempt_tier);
    if progress.tier.is_completed() && progress.completed_at.is_none() {
        progress.completed_at = Some(now_ms);
    }

    AttemptOutcome {
        progress,
        attempt_tier,
        previous_tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("typist").unwrap()
    }

    fn today() -> DayKey {
        DayKey::parse("2024-06-01").unwrap()
    }

    #[test]
    fn test_first_attempt_creates_progress() {
        let outcome = apply_attempt(None, &user(), today(), 21.0, 40, 1_000);
        assert_eq!(outcome.progress.attempt_count, 1);
        assert_eq!(outcome.progress.tier, Tier::Bronze);
        assert_eq!(outcome.progress.completed_at, Some(1_000));
        assert!(outcome.first_completion());
        assert!(outcome.improved());
    }

    #[test]
    fn test_worse_attempt_never_downgrades() {
        let gold = apply_attempt(None, &user(), today(), 42.0, 40, 1_000);
        let worse = apply_attempt(Some(&gold.progress), &user(), today(), 19.0, 40, 2_000);
        assert_eq!(worse.attempt_tier, Tier::Pending);
        assert_eq!(worse.progress.tier, Tier::Gold);
        assert_eq!(worse.progress.best_value, 42.0);
        assert_eq!(worse.progress.attempt_count, 2);
        assert_eq!(worse.progress.completed_at, Some(1_000));
        assert!(!worse.improved());
    }

    #[test]
    fn test_pending_attempt_leaves_completed_at_unset() {
        let outcome = apply_attempt(None, &user(), today(), 5.0, 40, 1_000);
        assert_eq!(outcome.progress.tier, Tier::Pending);
        assert_eq!(outcome.progress.completed_at, None);
        assert!(!outcome.first_completion());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: stored tier after V1 then V2 is max(tier(V1), tier(V2))
        #[test]
        fn test_tier_is_max_of_attempts(v1 in 0.0f64..200.0, v2 in 0.0f64..200.0, target in 1u32..150) {
            let user = UserId::new("p").unwrap();
            let day = DayKey::parse("2024-06-01").unwrap();
            let first = apply_attempt(None, &user, day, v1, target, 1);
            let second = apply_attempt(Some(&first.progress), &user, day, v2, target, 2);
            prop_assert_eq!(
                second.progress.tier,
                resolve_tier(v1, target).max(resolve_tier(v2, target))
            );
        }
    }
}
