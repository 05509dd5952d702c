//! Genesis export and import.
//!
//! Export is a plain snapshot of the runtime state. Import validates the
//! snapshot on its own, then against the bank: every reserve account, pool
//! coin supply and the escrow account must hold exactly what the snapshot
//! claims. Escrow records are rebuilt from the pending requests.

use liquidity_ingress::{
    Bank, BatchLifecycleManager, EscrowManager, LiquidityState, PoolRegistry,
};
use liquidity_types::{GenesisState, LiquidityError, Params, PoolRecord, Result};

/// Snapshot the module state under `params`.
pub fn export_genesis(state: &LiquidityState, params: &Params) -> Result<GenesisState> {
    let pools = state
        .registry
        .iter()
        .map(|pool| {
            Ok(PoolRecord {
                pool: pool.clone(),
                batch: state.lifecycle.get(pool.id)?.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(GenesisState {
        params: params.clone(),
        pools,
        next_pool_id: state.registry.next_pool_id(),
        next_request_seq: state.next_request_seq,
    })
}

/// Rebuild the module state from a snapshot checked against `bank`.
pub fn import_genesis(genesis: &GenesisState, bank: &impl Bank) -> Result<LiquidityState> {
    genesis.validate()?;

    for PoolRecord { pool, .. } in &genesis.pools {
        for (denom, reserve) in [
            (&pool.denom_x, pool.reserve_x),
            (&pool.denom_y, pool.reserve_y),
        ] {
            let held = bank.balance(&pool.reserve_account, denom);
            if held != reserve {
                return Err(LiquidityError::InvalidGenesis(format!(
                    "{} reserve account holds {held} {denom}, snapshot says {reserve}",
                    pool.id
                )));
            }
        }
        let supply = bank.total_supply(&pool.pool_coin_denom);
        if supply != pool.pool_coin_supply {
            return Err(LiquidityError::InvalidGenesis(format!(
                "{} pool coin supply is {supply}, snapshot says {}",
                pool.id, pool.pool_coin_supply
            )));
        }
    }

    let escrow = EscrowManager::from_batches(genesis.pools.iter().map(|r| (&r.pool, &r.batch)))?;
    escrow
        .verify_against(bank)
        .map_err(|err| LiquidityError::InvalidGenesis(err.to_string()))?;

    tracing::info!(
        pools = genesis.pools.len(),
        pending = escrow.count(),
        next_pool_id = %genesis.next_pool_id,
        next_request_seq = %genesis.next_request_seq,
        "Genesis imported"
    );
    Ok(LiquidityState {
        registry: PoolRegistry::from_pools(
            genesis.pools.iter().map(|r| r.pool.clone()),
            genesis.next_pool_id,
        ),
        lifecycle: BatchLifecycleManager::from_batches(
            genesis.pools.iter().map(|r| r.batch.clone()),
        ),
        escrow,
        next_request_seq: genesis.next_request_seq,
    })
}
