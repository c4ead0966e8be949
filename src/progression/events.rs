//! Events produced by mutating operations, for callers to render

use crate::domain::{DayKey, EntryType, LedgerEntry, LevelUp, Tier};

/// Something noteworthy that happened during an operation
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionEvent {
    /// The day's challenge left pending for the first time
    ChallengeCompleted { day: DayKey, tier: Tier },
    /// A better attempt raised the recorded tier
    TierImproved { day: DayKey, from: Tier, to: Tier },
    /// Coins and XP for the day's tier were paid out
    RewardsClaimed { day: DayKey, tier: Tier, coins: i64, xp: i64 },
    /// A new day was counted; `count` is the streak after it
    StreakExtended { count: u32 },
    /// The streak broke and restarted at one
    StreakReset { previous: u32 },
    /// A freeze covered `day`, automatically or on request
    FreezeConsumed { day: DayKey },
    /// The streak hit one of the milestone lengths
    MilestoneReached { days: u32 },
    /// A ledger entry was written
    CoinsPosted {
        entry_type: EntryType,
        amount: i64,
        source: String,
        balance_after: i64,
    },
    /// Claimed XP crossed a level boundary
    LevelUp(LevelUp),
}

impl ProgressionEvent {
    pub(crate) fn posted(entry: &LedgerEntry) -> Self {
        Self::CoinsPosted {
            entry_type: entry.entry_type,
            amount: entry.amount,
            source: entry.source.clone(),
            balance_after: entry.balance_after,
        }
    }

    /// One-line description for terminal output
    pub fn describe(&self) -> String {
        match self {
            Self::ChallengeCompleted { day, tier } => {
                format!("Challenge for {} completed at {}", day, tier.label())
            }
            Self::TierImproved { from, to, .. } => {
                format!("Tier improved: {} -> {}", from.label(), to.label())
            }
            Self::RewardsClaimed { tier, coins, xp, .. } => {
                format!("{} rewards claimed: {} coins, {} XP", tier.label(), coins, xp)
            }
            Self::StreakExtended { count } => format!("Streak extended to {} days", count),
            Self::StreakReset { previous } => {
                format!("Streak reset (was {} days)", previous)
            }
            Self::FreezeConsumed { day } => format!("Streak freeze used for {}", day),
            Self::MilestoneReached { days } => format!("Milestone reached: {} day streak!", days),
            Self::CoinsPosted {
                entry_type,
                amount,
                source,
                balance_after,
            } => format!(
                "{:+} coins ({}, {}), balance {}",
                amount,
                entry_type.as_str(),
                source,
                balance_after
            ),
            Self::LevelUp(up) => format!("Level up! {} -> {} ({})", up.old_level, up.new_level, up.new_title),
        }
    }
}
