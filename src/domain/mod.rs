//! Core domain types and pure progression rules
//!
//! Nothing in this module touches the database or the wall clock. Every
//! rule takes its as-of day or timestamp as an argument.

pub mod challenge;
pub mod date;
pub mod ledger;
pub mod levels;
pub mod powerup;
pub mod progress;
pub mod streak;
pub mod tier;
pub mod user;

pub use challenge::{Challenge, ChallengeCategory, challenge_for};
pub use date::DayKey;
pub use ledger::{Balance, EntryType, LedgerAudit, LedgerEntry, Posting};
pub use levels::LevelUp;
pub use powerup::{ActivationRules, PowerUp, PowerUpEffect, PowerUpKind};
pub use progress::{AttemptOutcome, ChallengeProgress};
pub use streak::{FreezeRefusal, StreakState, StreakTransition, StreakUpdate};
pub use tier::{Payout, RewardTable, Tier};
pub use user::{PremiumStatus, UserId};
