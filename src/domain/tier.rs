//! Reward tiers and payout resolution
//!
//! A tier is the qualitative rank of a performance relative to a target.
//! Tiers are totally ordered (`Pending < Bronze < Silver < Gold`), so the
//! monotonic "never downgrade" rule is a plain `max`.

use serde::{Deserialize, Serialize};

/// Coin multiplier for premium accounts. Applies to coins, never to XP.
pub const PREMIUM_COIN_MULTIPLIER: i64 = 2;

const GOLD_RATIO: f64 = 1.0;
const SILVER_RATIO: f64 = 0.75;
const BRONZE_RATIO: f64 = 0.5;

/// Reward rank reached by an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Pending,
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        *self != Self::Pending
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Not yet",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }
}

/// Coins per tier plus the flat XP award for completing the challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    pub bronze: i64,
    pub silver: i64,
    pub gold: i64,
    pub xp: i64,
}

impl RewardTable {
    /// Coins listed for `tier` (zero for pending)
    pub fn coins_for(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Pending => 0,
            Tier::Bronze => self.bronze,
            Tier::Silver => self.silver,
            Tier::Gold => self.gold,
        }
    }
}

/// Resolved reward for a completed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub coins: i64,
    pub xp: i64,
    /// Coins already include the premium multiplier
    pub premium: bool,
}

/// Resolve the tier reached by `value` against `target`.
///
/// A zero target is trivially met by any non-negative value.
pub fn resolve_tier(value: f64, target: u32) -> Tier {
    if !value.is_finite() || value < 0.0 {
        return Tier::Pending;
    }
    if target == 0 {
        return Tier::Gold;
    }

    let ratio = value / f64::from(target);
    if ratio >= GOLD_RATIO {
        Tier::Gold
    } else if ratio >= SILVER_RATIO {
        Tier::Silver
    } else if ratio >= BRONZE_RATIO {
        Tier::Bronze
    } else {
        Tier::Pending
    }
}

/// Merge a newly resolved tier into the recorded one without ever downgrading
pub fn merge_tier(recorded: Tier, attempt: Tier) -> Tier {
    recorded.max(attempt)
}

/// Look up the payout for `tier`. Pending tiers pay nothing.
pub fn payout_for(tier: Tier, table: &RewardTable, is_premium: bool) -> Option<Payout> {
    if !tier.is_completed() {
        return None;
    }

    let base = table.coins_for(tier);
    let coins = if is_premium {
        base * PREMIUM_COIN_MULTIPLIER
    } else {
        base
    };

    Some(Payout {
        coins,
        xp: table.xp,
        premium: is_premium,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RewardTable {
        RewardTable {
            bronze: 50,
            silver: 75,
            gold: 100,
            xp: 25,
        }
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(resolve_tier(42.0, 40), Tier::Gold);
        assert_eq!(resolve_tier(40.0, 40), Tier::Gold);
        assert_eq!(resolve_tier(30.0, 40), Tier::Silver);
        assert_eq!(resolve_tier(21.0, 40), Tier::Bronze);
        assert_eq!(resolve_tier(20.0, 40), Tier::Bronze);
        assert_eq!(resolve_tier(19.0, 40), Tier::Pending);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(resolve_tier(0.0, 0), Tier::Gold);
        assert_eq!(resolve_tier(f64::NAN, 40), Tier::Pending);
        assert_eq!(resolve_tier(-5.0, 40), Tier::Pending);
    }

    #[test]
    fn test_tier_ordering_and_merge() {
        assert!(Tier::Pending < Tier::Bronze);
        assert!(Tier::Bronze < Tier::Silver);
        assert!(Tier::Silver < Tier::Gold);
        assert_eq!(merge_tier(Tier::Gold, Tier::Bronze), Tier::Gold);
        assert_eq!(merge_tier(Tier::Bronze, Tier::Silver), Tier::Silver);
    }

    #[test]
    fn test_payout_premium_doubles_coins_only() {
        let regular = payout_for(Tier::Gold, &table(), false).unwrap();
        assert_eq!(regular.coins, 100);
        assert_eq!(regular.xp, 25);

        let premium = payout_for(Tier::Gold, &table(), true).unwrap();
        assert_eq!(premium.coins, 200);
        assert_eq!(premium.xp, 25);
        assert!(premium.premium);
    }

    #[test]
    fn test_no_payout_for_pending() {
        assert!(payout_for(Tier::Pending, &table(), true).is_none());
    }

    #[test]
    fn test_tier_string_roundtrip() {
        for tier in [Tier::Pending, Tier::Bronze, Tier::Silver, Tier::Gold] {
            assert_eq!(Tier::from_str(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::from_str("platinum"), None);
    }
}
