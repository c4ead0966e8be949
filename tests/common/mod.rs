//! Shared test utilities for progression integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use keyquest::clock::ManualClock;
use keyquest::store::ProgressDb;
use keyquest::{DayKey, ProgressionEngine, UserId};

/// A database file in a temp dir that several handles can open
pub struct TestStore {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("progress.db");
        Self { _dir: dir, path }
    }

    /// Open an independent connection to the database
    pub fn open(&self) -> ProgressDb {
        ProgressDb::open(&self.path, Duration::from_secs(10)).expect("Failed to open progress db")
    }

    /// A fresh engine on its own connection, sharing `clock`
    pub fn engine(&self, clock: &Arc<ManualClock>) -> ProgressionEngine {
        ProgressionEngine::new(self.open(), clock.clone())
    }
}

pub fn day(s: &str) -> DayKey {
    DayKey::parse(s).expect("valid day key")
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

pub fn clock_on(s: &str) -> Arc<ManualClock> {
    Arc::new(ManualClock::on_day(day(s)))
}
