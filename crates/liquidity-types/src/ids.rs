//! Identifiers used throughout the liquidity engine.
//!
//! Every id is a plain integer or string so that state is fully
//! reproducible from a genesis snapshot. Nothing here draws randomness.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ESCROW_ACCOUNT, POOL_RESERVE_ACCOUNT_PREFIX};

// ---------------------------------------------------------------------------
// PoolId
// ---------------------------------------------------------------------------

/// Pool identifier. Assigned sequentially starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PoolId(pub u64);

impl PoolId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RequestSeq
// ---------------------------------------------------------------------------

/// Global submission sequence of a batched request.
///
/// Sequences are unique across every pool and request kind, so they double as
/// the deterministic age order used for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RequestSeq(pub u64);

impl RequestSeq {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BatchIndex
// ---------------------------------------------------------------------------

/// Per-pool batch counter. The first batch of a pool has index 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchIndex(pub u64);

impl BatchIndex {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An address in the bank. User accounts are arbitrary strings; module
/// accounts use the reserved `liquidity/` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The module account holding every in-flight batch escrow.
    #[must_use]
    pub fn escrow() -> Self {
        Self(ESCROW_ACCOUNT.to_string())
    }

    /// The reserve account of one pool.
    #[must_use]
    pub fn pool_reserve(pool_id: PoolId) -> Self {
        Self(format!("{POOL_RESERVE_ACCOUNT_PREFIX}{}", pool_id.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
