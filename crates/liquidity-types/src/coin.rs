//! Coins and denominations.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{MAX_COIN_AMOUNT, POOL_COIN_DENOM_PREFIX};
use crate::{LiquidityError, PoolId, Result};

/// An amount of a single denomination. Amounts are whole units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Decimal,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: Decimal) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Derive the pool coin denom for a pool.
///
/// The denom is a function of the pool id alone, so every node derives the
/// same string without coordination.
#[must_use]
pub fn pool_coin_denom(pool_id: PoolId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"liquidity:pool_coin:v1:");
    hasher.update(pool_id.0.to_le_bytes());
    format!("{POOL_COIN_DENOM_PREFIX}{}", hex::encode_upper(hasher.finalize()))
}

/// True if `amount` is a non-negative whole number.
#[must_use]
pub fn is_whole(amount: Decimal) -> bool {
    !amount.is_sign_negative() && amount.fract().is_zero()
}

/// Reject amounts that are not strictly positive whole numbers, or that
/// exceed [`MAX_COIN_AMOUNT`].
pub fn ensure_positive_whole(amount: Decimal) -> Result<()> {
    if amount > Decimal::ZERO && amount.fract().is_zero() && amount <= MAX_COIN_AMOUNT {
        Ok(())
    } else {
        Err(LiquidityError::InvalidAmount(amount))
    }
}
