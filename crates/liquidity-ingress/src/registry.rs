//! Pool registry: creation, lookup and commit of pool state.

use std::collections::BTreeMap;

use liquidity_types::{
    ensure_positive_whole, validate_denom_pair, Coin, LiquidityError, LiquidityEvent,
    MsgCreatePool, Params, Pool, PoolId, Result, Transfer,
};

use crate::bank::Bank;

/// Every pool, by id, plus the denom-pair index that keeps pairs unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRegistry {
    pools: BTreeMap<PoolId, Pool>,
    by_pair: BTreeMap<(String, String), PoolId>,
    next_pool_id: PoolId,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: BTreeMap::new(),
            by_pair: BTreeMap::new(),
            next_pool_id: PoolId(1),
        }
    }

    /// Rebuild from a snapshot. Pools must already be validated.
    #[must_use]
    pub fn from_pools(pools: impl IntoIterator<Item = Pool>, next_pool_id: PoolId) -> Self {
        let mut registry = Self {
            next_pool_id,
            ..Self::new()
        };
        for pool in pools {
            registry
                .by_pair
                .insert((pool.denom_x.clone(), pool.denom_y.clone()), pool.id);
            registry.pools.insert(pool.id, pool);
        }
        registry
    }

    /// Create a pool from the creator's deposit.
    ///
    /// Moves both reserve coins into the new pool's reserve account and
    /// mints the initial pool coins to the creator in one atomic bank update.
    pub fn create_pool(
        &mut self,
        bank: &mut impl Bank,
        msg: &MsgCreatePool,
        params: &Params,
    ) -> Result<(Pool, LiquidityEvent)> {
        let (x, y) = (&msg.deposit_x, &msg.deposit_y);
        validate_denom_pair(&x.denom, &y.denom)?;
        ensure_positive_whole(x.amount)?;
        ensure_positive_whole(y.amount)?;
        for coin in [x, y] {
            if coin.amount < params.min_init_deposit_amount {
                return Err(LiquidityError::BelowMinimum {
                    reason: format!(
                        "initial deposit {coin} under {}",
                        params.min_init_deposit_amount
                    ),
                });
            }
            if !params.reserve_unlimited() && coin.amount > params.max_reserve_coin_amount {
                return Err(LiquidityError::MaxReserveExceeded {
                    amount: coin.amount,
                    max: params.max_reserve_coin_amount,
                });
            }
        }
        if self.by_pair.contains_key(&(x.denom.clone(), y.denom.clone())) {
            return Err(LiquidityError::DuplicateDenom {
                denom_x: x.denom.clone(),
                denom_y: y.denom.clone(),
            });
        }

        let id = self.next_pool_id;
        let pool = Pool::new(
            id,
            x.denom.clone(),
            y.denom.clone(),
            x.amount,
            y.amount,
            params.init_pool_coin_mint_amount,
        );
        bank.apply_transfers(&[
            Transfer::send(msg.creator.clone(), pool.reserve_account.clone(), x.clone(), None),
            Transfer::send(msg.creator.clone(), pool.reserve_account.clone(), y.clone(), None),
            Transfer::mint(
                msg.creator.clone(),
                Coin::new(pool.pool_coin_denom.clone(), pool.pool_coin_supply),
                None,
            ),
        ])?;

        self.next_pool_id = id.next();
        self.by_pair
            .insert((pool.denom_x.clone(), pool.denom_y.clone()), id);
        self.pools.insert(id, pool.clone());

        tracing::info!(
            pool = %id,
            pair = %pool.pair_symbol(),
            creator = %msg.creator,
            reserve_x = %pool.reserve_x,
            reserve_y = %pool.reserve_y,
            "Pool created"
        );
        let event = LiquidityEvent::PoolCreated {
            pool_id: id,
            creator: msg.creator.clone(),
            pool_coin_denom: pool.pool_coin_denom.clone(),
            reserve_x: pool.reserve_x,
            reserve_y: pool.reserve_y,
            minted: pool.pool_coin_supply,
        };
        Ok((pool, event))
    }

    pub fn get(&self, id: PoolId) -> Result<&Pool> {
        self.pools.get(&id).ok_or(LiquidityError::PoolNotFound(id))
    }

    /// Replace a pool's state after its batch has been settled.
    pub fn commit(&mut self, pool: Pool) -> Result<()> {
        let slot = self
            .pools
            .get_mut(&pool.id)
            .ok_or(LiquidityError::PoolNotFound(pool.id))?;
        if slot.denom_x != pool.denom_x || slot.denom_y != pool.denom_y {
            return Err(LiquidityError::InvariantViolation {
                reason: format!("{} changed its denoms", pool.id),
            });
        }
        *slot = pool;
        Ok(())
    }

    #[must_use]
    pub fn find_by_pair(&self, denom_x: &str, denom_y: &str) -> Option<PoolId> {
        self.by_pair
            .get(&(denom_x.to_string(), denom_y.to_string()))
            .copied()
    }

    /// Pools in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    #[must_use]
    pub fn next_pool_id(&self) -> PoolId {
        self.next_pool_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
