//! Batch lifecycle: collection windows, execution readiness and settlement.
//!
//! Each pool owns exactly one batch, cycling through
//! `Collecting -> Executable -> Settling -> Collecting`. Requests may be
//! appended while the batch is collecting or executable; a request that
//! arrives in the executing block joins the batch that executes in it.

use std::collections::BTreeMap;

use liquidity_matchcore::dust_threshold;
use liquidity_types::{
    AccountId, BatchPhase, Coin, DepositRequest, LiquidityError, LiquidityEvent, Params, Pool,
    PoolBatch, PoolId, RequestStatus, Result, SwapRequest, Transfer, WithdrawRequest,
};

/// Owner of every pool's current batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchLifecycleManager {
    batches: BTreeMap<PoolId, PoolBatch>,
}

impl BatchLifecycleManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from snapshot batches.
    #[must_use]
    pub fn from_batches(batches: impl IntoIterator<Item = PoolBatch>) -> Self {
        Self {
            batches: batches.into_iter().map(|b| (b.pool_id, b)).collect(),
        }
    }

    /// Open the first batch of a freshly created pool.
    pub fn open_batch(&mut self, pool_id: PoolId, height: u64) -> Result<()> {
        if self.batches.contains_key(&pool_id) {
            return Err(LiquidityError::InvariantViolation {
                reason: format!("{pool_id} already has a batch"),
            });
        }
        self.batches.insert(pool_id, PoolBatch::new(pool_id, height));
        Ok(())
    }

    // =================================================================
    // Submission
    // =================================================================

    pub fn push_deposit(&mut self, request: DepositRequest) -> Result<()> {
        self.open_for(request.pool_id)?.deposits.push(request);
        Ok(())
    }

    pub fn push_withdrawal(&mut self, request: WithdrawRequest) -> Result<()> {
        self.open_for(request.pool_id)?.withdrawals.push(request);
        Ok(())
    }

    pub fn push_swap(&mut self, request: SwapRequest) -> Result<()> {
        self.open_for(request.pool_id)?.swaps.push(request);
        Ok(())
    }

    /// Fails unless the pool's batch can take new requests.
    pub fn ensure_accepting(&self, pool_id: PoolId) -> Result<()> {
        let batch = self.get(pool_id)?;
        if batch.phase == BatchPhase::Settling {
            return Err(LiquidityError::WrongBatchPhase {
                expected: BatchPhase::Collecting,
                actual: batch.phase,
            });
        }
        Ok(())
    }

    fn open_for(&mut self, pool_id: PoolId) -> Result<&mut PoolBatch> {
        self.ensure_accepting(pool_id)?;
        self.batches
            .get_mut(&pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))
    }

    // =================================================================
    // Phase transitions
    // =================================================================

    /// Mark every batch whose window has elapsed as executable.
    ///
    /// Returns the ids of all executable batches, ascending.
    pub fn advance_batches(&mut self, height: u64, params: &Params) -> Vec<PoolId> {
        let mut ready = Vec::new();
        for batch in self.batches.values_mut() {
            if batch.phase == BatchPhase::Collecting
                && height.saturating_sub(batch.begin_height) >= params.unit_batch_height
            {
                batch.phase = BatchPhase::Executable;
                tracing::debug!(
                    pool = %batch.pool_id,
                    batch = %batch.index,
                    height,
                    requests = batch.request_count(),
                    "Batch executable"
                );
            }
            if batch.is_executable() {
                ready.push(batch.pool_id);
            }
        }
        ready
    }

    /// Refund swap remainders too small to trade again.
    ///
    /// Runs on a settling batch against the pool state it produced. Each
    /// refunded swap is marked executed and to-be-deleted; the escrowed
    /// offer and unspent fee go back to the requester.
    pub fn settle_swaps(
        batch: &mut PoolBatch,
        pool: &Pool,
        params: &Params,
    ) -> Result<(Vec<Transfer>, Vec<LiquidityEvent>)> {
        if batch.phase != BatchPhase::Settling {
            return Err(LiquidityError::WrongBatchPhase {
                expected: BatchPhase::Settling,
                actual: batch.phase,
            });
        }
        let escrow = AccountId::escrow();
        let mut transfers = Vec::new();
        let mut events = Vec::new();
        for swap in batch.swaps.iter_mut().filter(|s| !s.status.executed) {
            let dust = dust_threshold(pool, swap.direction, params)?;
            if swap.remaining_offer >= dust {
                continue;
            }
            let refund = swap.escrowed();
            if !refund.is_zero() {
                transfers.push(Transfer::send(
                    escrow.clone(),
                    swap.requester.clone(),
                    Coin::new(swap.offer_denom.clone(), refund),
                    Some(swap.seq),
                ));
            }
            tracing::debug!(
                seq = %swap.seq,
                pool = %pool.id,
                remaining = %swap.remaining_offer,
                dust = %dust,
                "Swap remainder refunded"
            );
            events.push(LiquidityEvent::SwapRemainderRefunded {
                seq: swap.seq,
                pool_id: pool.id,
                offer_refunded: swap.remaining_offer,
                fee_refunded: swap.remaining_offer_fee,
            });
            swap.status = RequestStatus {
                to_be_deleted: true,
                ..RequestStatus::done(!swap.filled_offer().is_zero())
            };
        }
        Ok((transfers, events))
    }

    /// Store a settled batch and reopen it for collection at `height`.
    ///
    /// Finished requests are dropped; partially filled swaps stay with
    /// their reduced remainder.
    pub fn complete_batch(&mut self, mut batch: PoolBatch, height: u64) -> Result<()> {
        if batch.phase != BatchPhase::Settling {
            return Err(LiquidityError::WrongBatchPhase {
                expected: BatchPhase::Settling,
                actual: batch.phase,
            });
        }
        let slot = self
            .batches
            .get_mut(&batch.pool_id)
            .ok_or(LiquidityError::PoolNotFound(batch.pool_id))?;
        if slot.index != batch.index {
            return Err(LiquidityError::InvariantViolation {
                reason: format!(
                    "settled {} but {} holds {}",
                    batch.index, batch.pool_id, slot.index
                ),
            });
        }

        let finished = |s: &RequestStatus| s.executed || s.to_be_deleted;
        batch.deposits.retain(|d| !finished(&d.status));
        batch.withdrawals.retain(|w| !finished(&w.status));
        batch.swaps.retain(|s| !finished(&s.status));
        batch.index = batch.index.next();
        batch.begin_height = height;
        batch.phase = BatchPhase::Collecting;
        *slot = batch;
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    pub fn get(&self, pool_id: PoolId) -> Result<&PoolBatch> {
        self.batches
            .get(&pool_id)
            .ok_or(LiquidityError::PoolNotFound(pool_id))
    }

    /// Batches in ascending pool id order.
    pub fn iter(&self) -> impl Iterator<Item = &PoolBatch> {
        self.batches.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
