//! Error types for progression operations

use thiserror::Error;

use crate::domain::{DayKey, FreezeRefusal};

/// Errors returned by the progression engine and its store
///
/// Business outcomes (already claimed, insufficient funds, ...) are explicit
/// variants so callers can branch on them; see [`ProgressionError::kind`].
#[derive(Error, Debug)]
pub enum ProgressionError {
    /// Input rejected before any state change
    #[error("Invalid input: {0}")]
    Validation(String),

    /// No attempt was recorded for the day
    #[error("No challenge progress for {0}")]
    NoProgress(DayKey),

    /// The user has never recorded activity
    #[error("No streak recorded yet")]
    StreakNotFound,

    /// Rewards requested before any tier was reached
    #[error("Challenge for {0} is not completed yet")]
    NotCompleted(DayKey),

    /// Rewards for the day were paid out already
    #[error("Rewards for {0} were already claimed")]
    AlreadyClaimed(DayKey),

    /// A debit would take the balance below zero
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    /// Streak freeze could not be used or bought
    #[error("Streak freeze refused: {0}")]
    Freeze(#[from] FreezeRefusal),

    /// Power-up activation without an inventory item
    #[error("No {0} in inventory")]
    NotOwned(&'static str),

    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database directory could not be prepared
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for ProgressionError {
    fn from(e: serde_json::Error) -> Self {
        ProgressionError::Corrupt(e.to_string())
    }
}

/// Coarse classification of a [`ProgressionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    StateConflict,
    Storage,
}

impl ProgressionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NoProgress(_) | Self::StreakNotFound => ErrorKind::NotFound,
            Self::NotCompleted(_)
            | Self::AlreadyClaimed(_)
            | Self::InsufficientFunds { .. }
            | Self::Freeze(_)
            | Self::NotOwned(_) => ErrorKind::StateConflict,
            Self::Database(_) | Self::Io(_) | Self::Corrupt(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProgressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let day = DayKey::parse("2024-01-01").unwrap();
        assert_eq!(ProgressionError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(ProgressionError::NoProgress(day).kind(), ErrorKind::NotFound);
        assert_eq!(ProgressionError::AlreadyClaimed(day).kind(), ErrorKind::StateConflict);
        assert_eq!(
            ProgressionError::from(FreezeRefusal::NoFreezes).kind(),
            ErrorKind::StateConflict
        );
    }

    #[test]
    fn test_messages() {
        let err = ProgressionError::InsufficientFunds {
            balance: 30,
            required: 50,
        };
        assert_eq!(err.to_string(), "Insufficient funds: balance 30, required 50");
    }
}
