//! Progression facade
//!
//! Ties the pure rules in [`crate::domain`] to the SQLite store.

mod engine;
mod events;

pub use engine::{
    ActivityResult, AttemptResult, COIN_CHARM_SOURCE, ClaimResult, FREEZE_PURCHASE_SOURCE, FreezePurchase,
    FreezeUse, Posted, ProgressionEngine, ProgressionSettings, STREAK_REWARD_SOURCE,
};
pub use events::ProgressionEvent;
