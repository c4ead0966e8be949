//! SQLite persistence for progression state
//!
//! Submodules expose free functions over a `&Connection`. Writers call them
//! from inside [`ProgressDb::write`] so each operation is one transaction.

mod db;

pub mod challenges;
pub mod ledger;
pub mod powerups;
pub mod streaks;
pub mod users;

pub use db::{ProgressDb, SCHEMA_VERSION};
