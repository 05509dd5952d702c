//! Block-end execution of every executable batch.
//!
//! 1. Run the pure engine for each executable pool and settle dust swaps
//! 2. Check the invariants of every result
//! 3. Release escrow and apply all transfers to the bank in one step
//! 4. Commit the new pools and reopen their batches
//!
//! Steps 1 and 2 touch nothing. If any pool fails them, the block changes
//! no state at all.

use liquidity_ingress::{Bank, BatchLifecycleManager, LiquidityState};
use liquidity_matchcore::{execute_batch, BatchResult};
use liquidity_types::{
    BatchIndex, LiquidityError, LiquidityEvent, Params, Pool, PoolId, Result, Transfer,
};
use rust_decimal::Decimal;

/// Summary of one executed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    pub pool_id: PoolId,
    pub batch_index: BatchIndex,
    pub rounds: u32,
    pub last_price: Option<Decimal>,
    /// Hex SHA-256 over the pool state and the engine's transfers.
    pub result_hash: String,
    pub reserve_x: Decimal,
    pub reserve_y: Decimal,
    pub pool_coin_supply: Decimal,
}

/// Everything a block end produced, in pool id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    pub height: u64,
    pub reports: Vec<PoolReport>,
    pub transfers: Vec<Transfer>,
    pub events: Vec<LiquidityEvent>,
}

struct Settled {
    result: BatchResult,
    refunds: Vec<Transfer>,
    refund_events: Vec<LiquidityEvent>,
}

/// Execute every executable batch at `height` and commit the results.
pub fn execute_batches(
    state: &mut LiquidityState,
    bank: &mut impl Bank,
    height: u64,
    params: &Params,
) -> Result<BlockOutcome> {
    let mut settled = Vec::new();
    for batch in state.lifecycle.iter().filter(|b| b.is_executable()) {
        let before = state.registry.get(batch.pool_id)?;
        let mut result = execute_batch(before, batch, params)?;
        let (refunds, refund_events) =
            BatchLifecycleManager::settle_swaps(&mut result.batch, &result.pool, params)?;
        let entry = Settled {
            result,
            refunds,
            refund_events,
        };
        if let Err(err) = check_result(before, &entry) {
            tracing::error!(pool = %batch.pool_id, height, error = %err, "Batch rejected");
            return Err(err);
        }
        settled.push(entry);
    }

    let mut outcome = BlockOutcome {
        height,
        ..BlockOutcome::default()
    };
    if settled.is_empty() {
        return Ok(outcome);
    }

    // =================================================================
    // Commit: stage on copies, then apply the bank update last
    // =================================================================
    let mut registry = state.registry.clone();
    let mut lifecycle = state.lifecycle.clone();
    let mut escrow = state.escrow.clone();
    for entry in settled {
        let Settled {
            result,
            refunds,
            refund_events,
        } = entry;
        outcome.reports.push(PoolReport {
            pool_id: result.pool.id,
            batch_index: result.batch_index(),
            rounds: result.rounds,
            last_price: result.last_price,
            result_hash: result.result_hash_hex(),
            reserve_x: result.pool.reserve_x,
            reserve_y: result.pool.reserve_y,
            pool_coin_supply: result.pool.pool_coin_supply,
        });
        outcome.transfers.extend(result.transfers);
        outcome.transfers.extend(refunds);
        outcome.events.extend(result.events);
        outcome.events.extend(refund_events);
        registry.commit(result.pool)?;
        lifecycle.complete_batch(result.batch, height)?;
    }
    escrow.release(&outcome.transfers)?;
    bank.apply_transfers(&outcome.transfers)?;

    state.registry = registry;
    state.lifecycle = lifecycle;
    state.escrow = escrow;

    tracing::info!(
        height,
        pools = outcome.reports.len(),
        transfers = outcome.transfers.len(),
        "Block settled"
    );
    Ok(outcome)
}

/// Net change of `denom` on the pool's reserve account implied by `transfers`.
fn reserve_delta<'a>(
    pool: &Pool,
    denom: &str,
    transfers: impl IntoIterator<Item = &'a Transfer>,
) -> Decimal {
    transfers
        .into_iter()
        .filter(|t| t.coin().denom == denom)
        .map(|t| {
            let mut delta = Decimal::ZERO;
            if t.destination() == Some(&pool.reserve_account) {
                delta += t.coin().amount;
            }
            if t.source() == Some(&pool.reserve_account) {
                delta -= t.coin().amount;
            }
            delta
        })
        .sum()
}

/// Invariants a result must satisfy before anything is committed.
fn check_result(before: &Pool, entry: &Settled) -> Result<()> {
    let after = &entry.result.pool;
    let transfers = || entry.result.transfers.iter().chain(&entry.refunds);

    if !after.is_healthy() {
        return Err(LiquidityError::InvariantViolation {
            reason: format!("{} would be left with an empty reserve or supply", after.id),
        });
    }
    for (denom, old, new) in [
        (&before.denom_x, before.reserve_x, after.reserve_x),
        (&before.denom_y, before.reserve_y, after.reserve_y),
    ] {
        let moved = reserve_delta(before, denom, transfers());
        if new - old != moved {
            return Err(LiquidityError::InvariantViolation {
                reason: format!(
                    "{}: reserve {denom} moved {} but transfers move {moved}",
                    before.id,
                    new - old
                ),
            });
        }
    }

    let mut minted = Decimal::ZERO;
    let mut burned = Decimal::ZERO;
    for transfer in transfers().filter(|t| t.coin().denom == before.pool_coin_denom) {
        match transfer {
            Transfer::Mint { coin, .. } => minted += coin.amount,
            Transfer::Burn { coin, .. } => burned += coin.amount,
            Transfer::Send { .. } => {}
        }
    }
    if after.pool_coin_supply - before.pool_coin_supply != minted - burned {
        return Err(LiquidityError::SupplyInvariantViolation {
            reason: format!(
                "{}: pool coin supply moved {} but mint - burn is {}",
                before.id,
                after.pool_coin_supply - before.pool_coin_supply,
                minted - burned
            ),
        });
    }
    Ok(())
}
