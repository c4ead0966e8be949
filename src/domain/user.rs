//! User identity and premium entitlement
//!
//! Users are owned by the identity provider. The engine only ever sees the
//! opaque handle it was given plus a read-only view of premium status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest user handle accepted from the identity provider
pub const MAX_USER_ID_LEN: usize = 128;

/// Opaque, authenticated user handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap a handle supplied by the identity provider.
    ///
    /// Returns `None` for empty, oversized, or whitespace-padded handles.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_USER_ID_LEN || id.trim() != id {
            return None;
        }
        Some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Premium subscription state (boolean + optional expiry)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumStatus {
    pub is_premium: bool,
    /// Expiry in ms since epoch; `None` means no expiry
    pub expires_at: Option<i64>,
}

impl PremiumStatus {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn active_until(expires_at: Option<i64>) -> Self {
        Self {
            is_premium: true,
            expires_at,
        }
    }

    /// Whether the entitlement applies at `now_ms`
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.is_premium && self.expires_at.is_none_or(|expiry| expiry > now_ms)
    }
}
