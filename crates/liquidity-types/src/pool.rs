//! Liquidity pool state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{pool_coin_denom, AccountId, LiquidityError, PoolId, Result, SwapDirection};

/// A constant-product pool over two reserve denoms.
///
/// `denom_x < denom_y` always holds. The pool price is quoted as units of Y
/// per unit of X.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub denom_x: String,
    pub denom_y: String,
    pub reserve_x: Decimal,
    pub reserve_y: Decimal,
    pub pool_coin_denom: String,
    pub pool_coin_supply: Decimal,
    pub reserve_account: AccountId,
}

impl Pool {
    /// Build a freshly created pool with derived denom and account.
    #[must_use]
    pub fn new(
        id: PoolId,
        denom_x: impl Into<String>,
        denom_y: impl Into<String>,
        reserve_x: Decimal,
        reserve_y: Decimal,
        pool_coin_supply: Decimal,
    ) -> Self {
        Self {
            id,
            denom_x: denom_x.into(),
            denom_y: denom_y.into(),
            reserve_x,
            reserve_y,
            pool_coin_denom: pool_coin_denom(id),
            pool_coin_supply,
            reserve_account: AccountId::pool_reserve(id),
        }
    }

    /// Current pool price, Y per X.
    pub fn price(&self) -> Result<Decimal> {
        self.reserve_y
            .checked_div(self.reserve_x)
            .ok_or(LiquidityError::ArithmeticOverflow {
                context: "pool price",
            })
    }

    /// Reserve held in `denom`, if the pool trades it.
    #[must_use]
    pub fn reserve_of(&self, denom: &str) -> Option<Decimal> {
        if denom == self.denom_x {
            Some(self.reserve_x)
        } else if denom == self.denom_y {
            Some(self.reserve_y)
        } else {
            None
        }
    }

    /// `(offer_denom, demand_denom)` for a swap direction.
    #[must_use]
    pub fn swap_denoms(&self, direction: SwapDirection) -> (&str, &str) {
        match direction {
            SwapDirection::XToY => (&self.denom_x, &self.denom_y),
            SwapDirection::YToX => (&self.denom_y, &self.denom_x),
        }
    }

    /// `(offered reserve, other reserve)` for a swap direction.
    #[must_use]
    pub fn reserves_for(&self, direction: SwapDirection) -> (Decimal, Decimal) {
        match direction {
            SwapDirection::XToY => (self.reserve_x, self.reserve_y),
            SwapDirection::YToX => (self.reserve_y, self.reserve_x),
        }
    }

    /// Reserves and pool coin supply are all strictly positive.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.reserve_x > Decimal::ZERO
            && self.reserve_y > Decimal::ZERO
            && self.pool_coin_supply > Decimal::ZERO
    }

    #[must_use]
    pub fn pair_symbol(&self) -> String {
        format!("{}/{}", self.denom_x, self.denom_y)
    }
}

/// Check that `denom_x < denom_y`, which also rules out equal denoms.
pub fn validate_denom_pair(denom_x: &str, denom_y: &str) -> Result<()> {
    if denom_x.is_empty() || denom_y.is_empty() {
        return Err(LiquidityError::InvalidDenomPair {
            reason: "empty denom".into(),
        });
    }
    if denom_x == denom_y {
        return Err(LiquidityError::InvalidDenomPair {
            reason: format!("denoms are equal: {denom_x}"),
        });
    }
    if denom_x > denom_y {
        return Err(LiquidityError::InvalidDenomPair {
            reason: format!("{denom_x} must sort before {denom_y}"),
        });
    }
    Ok(())
}

#[cfg(any(test, feature = "test-helpers"))]
impl Pool {
    /// A healthy `A/B` pool with the given reserves and a 1,000,000 supply.
    pub fn dummy(id: u64, reserve_x: i64, reserve_y: i64) -> Self {
        Self::new(
            PoolId(id),
            "A",
            "B",
            Decimal::new(reserve_x, 0),
            Decimal::new(reserve_y, 0),
            Decimal::new(1_000_000, 0),
        )
    }
}
