//! Coin/XP ledger model
//!
//! The ledger is an append-only log. A user's balance is the running sum of
//! their entries; the cached balance row is only a projection of it.

use serde::{Deserialize, Serialize};

use super::levels::{level_for_xp, title_for_level};
use super::tier::PREMIUM_COIN_MULTIPLIER;
use super::user::UserId;

/// Longest accepted source tag
pub const MAX_SOURCE_LEN: usize = 64;

/// Kind of balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Earn,
    Spend,
    Purchase,
    /// Earn posted for a premium account, amount already multiplied
    PremiumBonus,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
            Self::Purchase => "purchase",
            Self::PremiumBonus => "premium_bonus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "earn" => Some(Self::Earn),
            "spend" => Some(Self::Spend),
            "purchase" => Some(Self::Purchase),
            "premium_bonus" => Some(Self::PremiumBonus),
            _ => None,
        }
    }

    /// Debits carry negative amounts
    pub fn is_debit(&self) -> bool {
        matches!(self, Self::Spend | Self::Purchase)
    }
}

/// A balance mutation about to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub entry_type: EntryType,
    /// Signed coin delta
    pub amount: i64,
    /// XP delta (never negative)
    pub xp: i64,
    pub source: String,
}

impl Posting {
    pub fn earn(amount: i64, source: impl Into<String>) -> Self {
        Self {
            entry_type: EntryType::Earn,
            amount,
            xp: 0,
            source: source.into(),
        }
    }

    /// Debit of `amount` coins (`amount` is given positive)
    pub fn spend(amount: i64, source: impl Into<String>) -> Self {
        Self {
            entry_type: EntryType::Spend,
            amount: -amount,
            xp: 0,
            source: source.into(),
        }
    }

    /// Shop purchase costing `price` coins
    pub fn purchase(price: i64, source: impl Into<String>) -> Self {
        Self {
            entry_type: EntryType::Purchase,
            amount: -price,
            xp: 0,
            source: source.into(),
        }
    }

    /// Coins that were already resolved for a premium account
    pub fn premium_bonus(amount: i64, source: impl Into<String>) -> Self {
        Self {
            entry_type: EntryType::PremiumBonus,
            amount,
            xp: 0,
            source: source.into(),
        }
    }

    pub fn with_xp(mut self, xp: i64) -> Self {
        self.xp = xp;
        self
    }

    /// Apply the premium multiplier to an earn posting.
    ///
    /// Only `Earn` is affected; the result is typed `PremiumBonus` so the
    /// multiplier is never applied a second time.
    pub fn with_premium(self, is_premium: bool) -> Self {
        if is_premium && self.entry_type == EntryType::Earn {
            Self {
                entry_type: EntryType::PremiumBonus,
                amount: self.amount * PREMIUM_COIN_MULTIPLIER,
                ..self
            }
        } else {
            self
        }
    }
}

/// Check a caller-supplied source tag
pub fn validate_source(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("source tag must not be empty".to_string());
    }
    if source.len() > MAX_SOURCE_LEN {
        return Err(format!("source tag longer than {} bytes", MAX_SOURCE_LEN));
    }
    Ok(())
}

/// One immutable ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Store sequence number; orders a user's entries
    pub seq: i64,
    pub entry_id: String,
    pub user_id: UserId,
    pub entry_type: EntryType,
    pub amount: i64,
    pub xp: i64,
    pub source: String,
    pub balance_before: i64,
    pub balance_after: i64,
    /// ms since epoch
    pub created_at: i64,
}

/// Cached balance projection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub coins: i64,
    pub xp: i64,
}

impl Balance {
    pub fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    pub fn title(&self) -> &'static str {
        title_for_level(self.level())
    }
}

/// A place where consecutive entries do not chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBreak {
    pub seq: i64,
    pub expected_before: i64,
    pub actual_before: i64,
}

/// Result of walking a user's ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerAudit {
    pub entries_checked: usize,
    pub chain_breaks: Vec<ChainBreak>,
    /// Entries whose own arithmetic is wrong (`after != before + amount`)
    pub arithmetic_errors: Vec<i64>,
    pub negative_balances: Vec<i64>,
    pub ledger_balance: Balance,
    pub cached_balance: Balance,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.chain_breaks.is_empty()
            && self.arithmetic_errors.is_empty()
            && self.negative_balances.is_empty()
            && self.ledger_balance == self.cached_balance
    }
}

/// Walk `entries` (oldest first) and compare the result with `cached`
pub fn audit_entries(entries: &[LedgerEntry], cached: Balance) -> LedgerAudit {
    let mut audit = LedgerAudit {
        cached_balance: cached,
        ..Default::default()
    };

    let mut running = 0i64;
    let mut xp = 0i64;
    for entry in entries {
        if entry.balance_before != running {
            audit.chain_breaks.push(ChainBreak {
                seq: entry.seq,
                expected_before: running,
                actual_before: entry.balance_before,
            });
        }
        if entry.balance_after != entry.balance_before + entry.amount {
            audit.arithmetic_errors.push(entry.seq);
        }
        if entry.balance_after < 0 {
            audit.negative_balances.push(entry.seq);
        }
        running = entry.balance_after;
        xp += entry.xp;
        audit.entries_checked += 1;
    }

    audit.ledger_balance = Balance { coins: running, xp };
    audit
}
