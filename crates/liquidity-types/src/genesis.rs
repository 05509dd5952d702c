//! Genesis snapshot of the liquidity module.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    is_whole, pool_coin_denom, validate_denom_pair, AccountId, LiquidityError, Params, Pool,
    PoolBatch, PoolId, RequestSeq, Result,
};

/// A pool together with its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub pool: Pool,
    pub batch: PoolBatch,
}

/// Everything needed to rebuild the module state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    /// Ordered by pool id.
    pub pools: Vec<PoolRecord>,
    pub next_pool_id: PoolId,
    pub next_request_seq: RequestSeq,
}

impl Default for GenesisState {
    fn default() -> Self {
        Self {
            params: Params::default(),
            pools: Vec::new(),
            next_pool_id: PoolId(1),
            next_request_seq: RequestSeq(1),
        }
    }
}

impl GenesisState {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Structural checks that need no bank access.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        let mut denom_pairs = HashSet::new();
        let mut seqs = HashSet::new();
        let mut previous: Option<PoolId> = None;
        for record in &self.pools {
            let pool = &record.pool;
            if previous.is_some_and(|prev| prev >= pool.id) {
                return Err(invalid(format!("pools out of order at {}", pool.id)));
            }
            previous = Some(pool.id);
            if pool.id >= self.next_pool_id || pool.id.0 == 0 {
                return Err(invalid(format!("{} not below next_pool_id", pool.id)));
            }
            validate_denom_pair(&pool.denom_x, &pool.denom_y)
                .map_err(|e| invalid(format!("{}: {e}", pool.id)))?;
            if !denom_pairs.insert((pool.denom_x.as_str(), pool.denom_y.as_str())) {
                return Err(invalid(format!("duplicate pair {}", pool.pair_symbol())));
            }
            if !pool.is_healthy() {
                return Err(invalid(format!("{} has a non-positive reserve or supply", pool.id)));
            }
            for amount in [pool.reserve_x, pool.reserve_y, pool.pool_coin_supply] {
                if !is_whole(amount) {
                    return Err(invalid(format!("{} holds fractional amount {amount}", pool.id)));
                }
            }
            if pool.pool_coin_denom != pool_coin_denom(pool.id)
                || pool.reserve_account != AccountId::pool_reserve(pool.id)
            {
                return Err(invalid(format!("{} has foreign derived fields", pool.id)));
            }

            let batch = &record.batch;
            if batch.pool_id != pool.id {
                return Err(invalid(format!(
                    "batch of {} belongs to {}",
                    pool.id, batch.pool_id
                )));
            }
            if !batch.is_ordered() {
                return Err(invalid(format!("batch of {} is not in sequence order", pool.id)));
            }
            if batch.deposits.iter().any(|d| d.pool_id != pool.id)
                || batch.withdrawals.iter().any(|w| w.pool_id != pool.id)
                || batch.swaps.iter().any(|s| s.pool_id != pool.id)
            {
                return Err(invalid(format!("batch of {} holds foreign requests", pool.id)));
            }
            for swap in &batch.swaps {
                if swap.remaining_offer > swap.offer_amount
                    || swap.remaining_offer_fee > swap.offer_coin_fee
                    || swap.order_price <= Decimal::ZERO
                {
                    return Err(invalid(format!("{} is inconsistent", swap.seq)));
                }
            }
            for seq in batch.sequences() {
                if seq >= self.next_request_seq || !seqs.insert(seq) {
                    return Err(invalid(format!("{seq} reused or ahead of next_request_seq")));
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> LiquidityError {
    LiquidityError::InvalidGenesis(reason)
}
