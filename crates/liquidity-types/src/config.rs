//! Module parameters.
//!
//! Params are never read from global state: the host hands the current set
//! into every call, so a governance change takes effect at the next call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, is_whole, LiquidityError, Result};

/// Tunable parameters of the liquidity module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Minimum amount of each reserve coin to create a pool.
    pub min_init_deposit_amount: Decimal,
    /// Pool coins minted to the creator of a pool.
    pub init_pool_coin_mint_amount: Decimal,
    /// Cap on each reserve of a pool. Zero means unlimited.
    pub max_reserve_coin_amount: Decimal,
    /// Total swap fee rate, charged half on each side of a swap.
    pub swap_fee_rate: Decimal,
    /// Share of a withdrawal left in the pool.
    pub withdraw_fee_rate: Decimal,
    /// Largest order, and largest pool payout per batch, as a share of the
    /// relevant reserve.
    pub max_order_amount_ratio: Decimal,
    /// Number of blocks a batch collects before it executes.
    pub unit_batch_height: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_init_deposit_amount: Decimal::from(constants::DEFAULT_MIN_INIT_DEPOSIT_AMOUNT),
            init_pool_coin_mint_amount: Decimal::from(
                constants::DEFAULT_INIT_POOL_COIN_MINT_AMOUNT,
            ),
            max_reserve_coin_amount: Decimal::from(constants::DEFAULT_MAX_RESERVE_COIN_AMOUNT),
            swap_fee_rate: Decimal::new(constants::DEFAULT_SWAP_FEE_RATE_MILLIS, 3),
            withdraw_fee_rate: Decimal::new(constants::DEFAULT_WITHDRAW_FEE_RATE_MILLIS, 3),
            max_order_amount_ratio: Decimal::new(constants::DEFAULT_MAX_ORDER_AMOUNT_RATIO_CENTS, 2),
            unit_batch_height: constants::DEFAULT_UNIT_BATCH_HEIGHT,
        }
    }
}

impl Params {
    /// Parse params from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Half of the swap fee rate; each side of a swap pays this share.
    #[must_use]
    pub fn half_swap_fee_rate(&self) -> Decimal {
        self.swap_fee_rate / Decimal::TWO
    }

    /// `true` when reserves are uncapped.
    #[must_use]
    pub fn reserve_unlimited(&self) -> bool {
        self.max_reserve_coin_amount.is_zero()
    }

    pub fn validate(&self) -> Result<()> {
        if !is_whole(self.min_init_deposit_amount) || self.min_init_deposit_amount.is_zero() {
            return Err(LiquidityError::InvalidParams(format!(
                "min_init_deposit_amount must be a positive integer, got {}",
                self.min_init_deposit_amount
            )));
        }
        if !is_whole(self.init_pool_coin_mint_amount) || self.init_pool_coin_mint_amount.is_zero()
        {
            return Err(LiquidityError::InvalidParams(format!(
                "init_pool_coin_mint_amount must be a positive integer, got {}",
                self.init_pool_coin_mint_amount
            )));
        }
        if !is_whole(self.max_reserve_coin_amount) {
            return Err(LiquidityError::InvalidParams(format!(
                "max_reserve_coin_amount must be a non-negative integer, got {}",
                self.max_reserve_coin_amount
            )));
        }
        for (name, rate) in [
            ("swap_fee_rate", self.swap_fee_rate),
            ("withdraw_fee_rate", self.withdraw_fee_rate),
        ] {
            if rate.is_sign_negative() || rate >= Decimal::ONE {
                return Err(LiquidityError::InvalidParams(format!(
                    "{name} must be in [0, 1), got {rate}"
                )));
            }
        }
        if self.max_order_amount_ratio <= Decimal::ZERO
            || self.max_order_amount_ratio >= Decimal::new(5, 1)
        {
            return Err(LiquidityError::InvalidParams(format!(
                "max_order_amount_ratio must be in (0, 0.5), got {}",
                self.max_order_amount_ratio
            )));
        }
        if self.unit_batch_height == 0 {
            return Err(LiquidityError::InvalidParams(
                "unit_batch_height must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
