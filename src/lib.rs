//! Keyquest - progression and rewards for typing practice
//!
//! Keyquest issues one deterministic challenge per day, tracks daily
//! streaks with freezes, resolves tiered rewards, and records every coin
//! and XP change in an append-only ledger.
//!
//! ## Layers
//!
//! 1. **Domain** (`domain`): pure rules. Challenge generation, tier
//!    resolution, streak transitions and ledger arithmetic, all taking an
//!    explicit as-of day.
//!
//! 2. **Store** (`store`): SQLite tables and per-operation transactions.
//!
//! 3. **Progression** (`progression`): the facade that reads the clock once
//!    per call and composes the two.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod progression;
pub mod store;

pub use domain::*;
pub use error::{ErrorKind, ProgressionError};
pub use progression::{ProgressionEngine, ProgressionEvent, ProgressionSettings};
