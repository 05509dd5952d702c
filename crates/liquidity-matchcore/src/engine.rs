//! Pure batch execution for one pool.
//!
//! ```text
//! execute_batch(&Pool, &PoolBatch, &Params) -> BatchResult
//! ```
//!
//! Deposits run first, then withdrawals, then swap matching, each list in
//! ascending sequence order. A request whose math fails is refunded from
//! escrow and the batch carries on; only fatal errors abort. When swap
//! matching itself fails, orders priced out of range are refunded and the
//! rest matched again. Nothing is
//! applied here: the result carries the new pool, the updated batch and the
//! transfers the executor must apply.

use liquidity_types::{
    AccountId, BatchIndex, BatchPhase, Coin, LiquidityError, LiquidityEvent, Params, Pool,
    PoolBatch, RequestSeq, RequestStatus, Result, SwapRequest, Transfer,
};
use rust_decimal::Decimal;

use crate::determinism::compute_result_hash;
use crate::matcher::{SwapOutcome, match_swaps};
use crate::pool_math::{compute_deposit, compute_withdrawal, order_price_in_range};

/// Everything one executed batch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// Pool state after every request of the batch.
    pub pool: Pool,
    /// The batch in `Settling`, with per-request status and remainders.
    pub batch: PoolBatch,
    /// Bank movements, in execution order.
    pub transfers: Vec<Transfer>,
    pub events: Vec<LiquidityEvent>,
    /// Matching rounds that filled at least one swap.
    pub rounds: u32,
    pub last_price: Option<Decimal>,
    pub result_hash: [u8; 32],
}

impl BatchResult {
    #[must_use]
    pub fn batch_index(&self) -> BatchIndex {
        self.batch.index
    }

    #[must_use]
    pub fn result_hash_hex(&self) -> String {
        hex::encode(self.result_hash)
    }
}

/// Execute an executable batch against its pool.
pub fn execute_batch(pool: &Pool, batch: &PoolBatch, params: &Params) -> Result<BatchResult> {
    if batch.phase != BatchPhase::Executable {
        return Err(LiquidityError::WrongBatchPhase {
            expected: BatchPhase::Executable,
            actual: batch.phase,
        });
    }
    if batch.pool_id != pool.id {
        return Err(LiquidityError::InvariantViolation {
            reason: format!("batch of {} executed against {}", batch.pool_id, pool.id),
        });
    }

    let mut working = pool.clone();
    let mut batch = batch.clone();
    let mut transfers = Vec::new();
    let mut events = Vec::new();
    let escrow = AccountId::escrow();

    // =================================================================
    // Deposits
    // =================================================================
    for deposit in batch.deposits.iter_mut().filter(|d| !d.status.executed) {
        match compute_deposit(&working, deposit.deposit_x, deposit.deposit_y, params) {
            Ok(out) => {
                push_send(
                    &mut transfers,
                    &escrow,
                    &working.reserve_account,
                    &working.denom_x,
                    out.accepted_x,
                    deposit.seq,
                );
                push_send(
                    &mut transfers,
                    &escrow,
                    &working.reserve_account,
                    &working.denom_y,
                    out.accepted_y,
                    deposit.seq,
                );
                push_send(
                    &mut transfers,
                    &escrow,
                    &deposit.depositor,
                    &working.denom_x,
                    out.refund_x,
                    deposit.seq,
                );
                push_send(
                    &mut transfers,
                    &escrow,
                    &deposit.depositor,
                    &working.denom_y,
                    out.refund_y,
                    deposit.seq,
                );
                transfers.push(Transfer::mint(
                    deposit.depositor.clone(),
                    Coin::new(working.pool_coin_denom.clone(), out.minted),
                    Some(deposit.seq),
                ));
                working.reserve_x += out.accepted_x;
                working.reserve_y += out.accepted_y;
                working.pool_coin_supply += out.minted;
                deposit.status = RequestStatus::done(true);
                events.push(LiquidityEvent::DepositAccepted {
                    seq: deposit.seq,
                    pool_id: working.id,
                    accepted_x: out.accepted_x,
                    accepted_y: out.accepted_y,
                    refunded_x: out.refund_x,
                    refunded_y: out.refund_y,
                    minted: out.minted,
                });
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::warn!(
                    seq = %deposit.seq,
                    pool = %working.id,
                    error = %err,
                    "Deposit refunded"
                );
                push_send(
                    &mut transfers,
                    &escrow,
                    &deposit.depositor,
                    &working.denom_x,
                    deposit.deposit_x,
                    deposit.seq,
                );
                push_send(
                    &mut transfers,
                    &escrow,
                    &deposit.depositor,
                    &working.denom_y,
                    deposit.deposit_y,
                    deposit.seq,
                );
                deposit.status = RequestStatus::done(false);
                events.push(LiquidityEvent::RequestRefunded {
                    seq: deposit.seq,
                    pool_id: working.id,
                    reason: err.to_string(),
                });
            }
        }
    }

    // =================================================================
    // Withdrawals
    // =================================================================
    for withdrawal in batch.withdrawals.iter_mut().filter(|w| !w.status.executed) {
        match compute_withdrawal(&working, withdrawal.pool_coin_amount, params) {
            Ok(out) => {
                transfers.push(Transfer::burn(
                    escrow.clone(),
                    Coin::new(working.pool_coin_denom.clone(), out.burned),
                    Some(withdrawal.seq),
                ));
                push_send(
                    &mut transfers,
                    &working.reserve_account,
                    &withdrawal.withdrawer,
                    &working.denom_x,
                    out.withdrawn_x,
                    withdrawal.seq,
                );
                push_send(
                    &mut transfers,
                    &working.reserve_account,
                    &withdrawal.withdrawer,
                    &working.denom_y,
                    out.withdrawn_y,
                    withdrawal.seq,
                );
                working.reserve_x -= out.withdrawn_x;
                working.reserve_y -= out.withdrawn_y;
                working.pool_coin_supply -= out.burned;
                withdrawal.status = RequestStatus::done(true);
                events.push(LiquidityEvent::WithdrawExecuted {
                    seq: withdrawal.seq,
                    pool_id: working.id,
                    burned: out.burned,
                    withdrawn_x: out.withdrawn_x,
                    withdrawn_y: out.withdrawn_y,
                });
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::warn!(
                    seq = %withdrawal.seq,
                    pool = %working.id,
                    error = %err,
                    "Withdrawal refunded"
                );
                push_send(
                    &mut transfers,
                    &escrow,
                    &withdrawal.withdrawer,
                    &working.pool_coin_denom,
                    withdrawal.pool_coin_amount,
                    withdrawal.seq,
                );
                withdrawal.status = RequestStatus::done(false);
                events.push(LiquidityEvent::RequestRefunded {
                    seq: withdrawal.seq,
                    pool_id: working.id,
                    reason: err.to_string(),
                });
            }
        }
    }

    // =================================================================
    // Swaps
    // =================================================================
    let swaps = match_or_refund(
        &mut working,
        &mut batch.swaps,
        params,
        &mut transfers,
        &mut events,
    )?;
    transfers.extend(swaps.transfers);
    events.extend(swaps.events);

    let result_hash = compute_result_hash(&working, batch.index, &transfers);
    batch.phase = BatchPhase::Settling;
    events.push(LiquidityEvent::BatchExecuted {
        pool_id: working.id,
        batch_index: batch.index,
        rounds: swaps.rounds,
        last_price: swaps.last_price,
        result_hash: hex::encode(result_hash),
    });

    tracing::info!(
        pool = %working.id,
        batch = %batch.index,
        deposits = batch.deposits.len(),
        withdrawals = batch.withdrawals.len(),
        swaps = batch.swaps.len(),
        rounds = swaps.rounds,
        "Batch executed"
    );

    Ok(BatchResult {
        pool: working,
        batch,
        transfers,
        events,
        rounds: swaps.rounds,
        last_price: swaps.last_price,
        result_hash,
    })
}

/// Match the batch's swaps, refunding the orders that make matching fail.
///
/// On a non-fatal error, pending swaps whose limit lies outside the accepted
/// range of the current pool price are refunded and the rest are matched
/// again. If that fails too, every pending swap is refunded.
fn match_or_refund(
    pool: &mut Pool,
    swaps: &mut [SwapRequest],
    params: &Params,
    transfers: &mut Vec<Transfer>,
    events: &mut Vec<LiquidityEvent>,
) -> Result<SwapOutcome> {
    let err = match try_match(pool, swaps, params) {
        Ok(outcome) => return Ok(outcome),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => err,
    };
    tracing::warn!(pool = %pool.id, error = %err, "Swap matching failed");
    for swap in swaps.iter_mut().filter(|s| !s.status.executed) {
        if !order_price_in_range(pool, swap.order_price).unwrap_or(false) {
            refund_swap(pool, swap, &err, transfers, events);
        }
    }

    match try_match(pool, swaps, params) {
        Ok(outcome) => Ok(outcome),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            tracing::warn!(
                pool = %pool.id,
                error = %err,
                "Swap matching failed again, refunding batch"
            );
            for swap in swaps.iter_mut().filter(|s| !s.status.executed) {
                refund_swap(pool, swap, &err, transfers, events);
            }
            Ok(SwapOutcome::default())
        }
    }
}

/// [`match_swaps`] that leaves `pool` and `swaps` untouched on error.
fn try_match(pool: &mut Pool, swaps: &mut [SwapRequest], params: &Params) -> Result<SwapOutcome> {
    let mut staged_pool = pool.clone();
    let mut staged_swaps = swaps.to_vec();
    let outcome = match_swaps(&mut staged_pool, &mut staged_swaps, params)?;
    *pool = staged_pool;
    swaps.clone_from_slice(&staged_swaps);
    Ok(outcome)
}

fn refund_swap(
    pool: &Pool,
    swap: &mut SwapRequest,
    reason: &LiquidityError,
    transfers: &mut Vec<Transfer>,
    events: &mut Vec<LiquidityEvent>,
) {
    tracing::warn!(seq = %swap.seq, pool = %pool.id, limit = %swap.order_price, "Swap refunded");
    push_send(
        transfers,
        &AccountId::escrow(),
        &swap.requester,
        &swap.offer_denom,
        swap.escrowed(),
        swap.seq,
    );
    swap.status = RequestStatus::done(!swap.filled_offer().is_zero());
    events.push(LiquidityEvent::RequestRefunded {
        seq: swap.seq,
        pool_id: pool.id,
        reason: reason.to_string(),
    });
}

/// Queue a send of `amount` unless it is zero.
fn push_send(
    transfers: &mut Vec<Transfer>,
    from: &AccountId,
    to: &AccountId,
    denom: &str,
    amount: Decimal,
    seq: RequestSeq,
) {
    if amount > Decimal::ZERO {
        transfers.push(Transfer::send(
            from.clone(),
            to.clone(),
            Coin::new(denom, amount),
            Some(seq),
        ));
    }
}
