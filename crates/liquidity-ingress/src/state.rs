//! Runtime state of the liquidity module.

use liquidity_types::RequestSeq;

use crate::escrow::EscrowManager;
use crate::lifecycle::BatchLifecycleManager;
use crate::registry::PoolRegistry;

/// Everything the module keeps between blocks, apart from bank balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityState {
    pub registry: PoolRegistry,
    pub lifecycle: BatchLifecycleManager,
    pub escrow: EscrowManager,
    /// Sequence number the next accepted request receives.
    pub next_request_seq: RequestSeq,
}

impl Default for LiquidityState {
    fn default() -> Self {
        Self {
            registry: PoolRegistry::new(),
            lifecycle: BatchLifecycleManager::new(),
            escrow: EscrowManager::new(),
            next_request_seq: RequestSeq(1),
        }
    }
}

impl LiquidityState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next sequence number.
    pub fn take_seq(&mut self) -> RequestSeq {
        let seq = self.next_request_seq;
        self.next_request_seq = seq.next();
        seq
    }
}
