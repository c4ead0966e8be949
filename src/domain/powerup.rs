//! Power-ups
//!
//! Two shapes exist: timed boosts that multiply a reward until they expire,
//! and consumables that carry a number of remaining uses. Each kind has a
//! fixed shape, so callers match on [`PowerUpEffect`] rather than probing
//! optional fields.

use serde::{Deserialize, Serialize};

/// XP multiplier while an XP boost is running
pub const XP_BOOST_MULTIPLIER: u32 = 2;

/// Extra coins granted by a coin charm, as a percentage of the base reward
pub const COIN_CHARM_BONUS_PERCENT: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Timed: doubles challenge XP
    XpBoost,
    /// Consumable: adds a coin bonus to each claim
    CoinCharm,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 2] = [Self::XpBoost, Self::CoinCharm];

    /// Also the inventory item name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XpBoost => "xp_boost",
            Self::CoinCharm => "coin_charm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "xp_boost" => Some(Self::XpBoost),
            "coin_charm" => Some(Self::CoinCharm),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::XpBoost => "XP Boost",
            Self::CoinCharm => "Coin Charm",
        }
    }
}

/// Shape-specific state of an active power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PowerUpEffect {
    Timed { multiplier: u32, expires_at: i64 },
    Consumable { remaining_uses: u32 },
}

/// Durations and charges granted per activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationRules {
    pub xp_boost_ms: i64,
    pub coin_charm_uses: u32,
}

impl Default for ActivationRules {
    fn default() -> Self {
        Self {
            xp_boost_ms: 30 * 60 * 1000,
            coin_charm_uses: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub effect: PowerUpEffect,
    pub activated_at: i64,
}

impl PowerUp {
    /// Create a power-up, or extend `existing` if it is still live.
    ///
    /// Timed boosts stack their duration from the later of now and the
    /// current expiry. Consumables add their charges.
    pub fn activate(
        existing: Option<&PowerUp>,
        kind: PowerUpKind,
        now_ms: i64,
        rules: &ActivationRules,
    ) -> PowerUp {
        let live = existing.filter(|p| p.kind == kind && p.is_live(now_ms));

        let effect = match kind {
            PowerUpKind::XpBoost => {
                let start = match live.map(|p| p.effect) {
                    Some(PowerUpEffect::Timed { expires_at, .. }) => expires_at.max(now_ms),
                    _ => now_ms,
                };
                PowerUpEffect::Timed {
                    multiplier: XP_BOOST_MULTIPLIER,
                    expires_at: start + rules.xp_boost_ms,
                }
            }
            PowerUpKind::CoinCharm => {
                let carried = match live.map(|p| p.effect) {
                    Some(PowerUpEffect::Consumable { remaining_uses }) => remaining_uses,
                    _ => 0,
                };
                PowerUpEffect::Consumable {
                    remaining_uses: carried + rules.coin_charm_uses,
                }
            }
        };

        PowerUp {
            kind,
            effect,
            activated_at: live.map(|p| p.activated_at).unwrap_or(now_ms),
        }
    }

    /// Still usable at `now_ms`
    pub fn is_live(&self, now_ms: i64) -> bool {
        match self.effect {
            PowerUpEffect::Timed { expires_at, .. } => expires_at > now_ms,
            PowerUpEffect::Consumable { remaining_uses } => remaining_uses > 0,
        }
    }

    /// Multiplier to apply at `now_ms`, if this is a running timed boost
    pub fn multiplier_at(&self, now_ms: i64) -> Option<u32> {
        match self.effect {
            PowerUpEffect::Timed {
                multiplier,
                expires_at,
            } if expires_at > now_ms => Some(multiplier),
            _ => None,
        }
    }

    /// Spend one use of a consumable. Timed boosts are not consumed.
    ///
    /// Returns `None` when there was nothing to consume.
    pub fn consume(&self) -> Option<PowerUp> {
        match self.effect {
            PowerUpEffect::Consumable { remaining_uses } if remaining_uses > 0 => Some(PowerUp {
                effect: PowerUpEffect::Consumable {
                    remaining_uses: remaining_uses - 1,
                },
                ..*self
            }),
            _ => None,
        }
    }
}

/// Coin bonus a charm adds on top of `base_coins`, at least one coin
pub fn coin_charm_bonus(base_coins: i64) -> i64 {
    (base_coins * COIN_CHARM_BONUS_PERCENT / 100).max(1)
}
