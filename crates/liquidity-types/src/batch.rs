//! Per-pool batch types for the block-windowed execution model.
//!
//! Each pool owns exactly one batch, which cycles through
//! **COLLECTING → EXECUTABLE → SETTLING → COLLECTING**.
//!
//! During COLLECTING, requests are appended in submission order.
//! Once `unit_batch_height` blocks have passed the batch becomes EXECUTABLE
//! and is executed at the end of that block. During SETTLING, dust
//! remainders are refunded and finished requests are dropped before the
//! batch reopens under the next index.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BatchIndex, DepositRequest, PoolId, RequestSeq, SwapRequest, WithdrawRequest};

/// The three phases of a pool batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchPhase {
    /// Accepting requests.
    Collecting,
    /// Window elapsed; will execute at the end of the current block.
    /// Requests submitted now still join it.
    Executable,
    /// Matching done; refunding dust and pruning finished requests.
    Settling,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collecting => write!(f, "COLLECTING"),
            Self::Executable => write!(f, "EXECUTABLE"),
            Self::Settling => write!(f, "SETTLING"),
        }
    }
}

impl BatchPhase {
    /// Return the next phase in the cycle.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Collecting => Self::Executable,
            Self::Executable => Self::Settling,
            Self::Settling => Self::Collecting,
        }
    }
}

// ---------------------------------------------------------------------------
// PoolBatch
// ---------------------------------------------------------------------------

/// The pending requests of one pool.
///
/// Each list is kept in ascending [`RequestSeq`] order, which is also the
/// order of execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBatch {
    pub pool_id: PoolId,
    pub index: BatchIndex,
    pub begin_height: u64,
    pub phase: BatchPhase,
    pub deposits: Vec<DepositRequest>,
    pub withdrawals: Vec<WithdrawRequest>,
    pub swaps: Vec<SwapRequest>,
}

impl PoolBatch {
    /// The first batch of a new pool.
    #[must_use]
    pub fn new(pool_id: PoolId, begin_height: u64) -> Self {
        Self {
            pool_id,
            index: BatchIndex(1),
            begin_height,
            phase: BatchPhase::Collecting,
            deposits: Vec::new(),
            withdrawals: Vec::new(),
            swaps: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.phase == BatchPhase::Executable
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty() && self.withdrawals.is_empty() && self.swaps.is_empty()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.deposits.len() + self.withdrawals.len() + self.swaps.len()
    }

    /// Every sequence number in this batch, ascending.
    #[must_use]
    pub fn sequences(&self) -> Vec<RequestSeq> {
        let mut seqs: Vec<RequestSeq> = self
            .deposits
            .iter()
            .map(|d| d.seq)
            .chain(self.withdrawals.iter().map(|w| w.seq))
            .chain(self.swaps.iter().map(|s| s.seq))
            .collect();
        seqs.sort_unstable();
        seqs
    }

    /// True if every request list is in strictly ascending sequence order.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        fn ascending(seqs: impl Iterator<Item = RequestSeq>) -> bool {
            let seqs: Vec<RequestSeq> = seqs.collect();
            seqs.windows(2).all(|w| w[0] < w[1])
        }
        ascending(self.deposits.iter().map(|d| d.seq))
            && ascending(self.withdrawals.iter().map(|w| w.seq))
            && ascending(self.swaps.iter().map(|s| s.seq))
    }
}
