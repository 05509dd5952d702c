//! Integer pool accounting: deposit minting, withdrawal burning and the
//! per-order thresholds derived from pool reserves.
//!
//! Every amount returned here is a whole number. Payouts and mints round
//! down; amounts taken from a depositor round up, so rounding never moves
//! value out of a pool.

use liquidity_types::constants::{
    DUST_RATIO_DIVISOR, MAX_DEPOSIT_RATIO_DEVIATION_BPS, MAX_ORDER_PRICE_DEVIATION,
};
use liquidity_types::{LiquidityError, Params, Pool, Result, SwapDirection};
use rust_decimal::Decimal;

/// `floor(a * b / c)`.
pub fn mul_div_floor(a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal> {
    Ok(mul_div(a, b, c)?.floor())
}

/// `ceil(a * b / c)`.
pub fn mul_div_ceil(a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal> {
    Ok(mul_div(a, b, c)?.ceil())
}

fn mul_div(a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .and_then(|ab| ab.checked_div(c))
        .ok_or(LiquidityError::ArithmeticOverflow { context: "mul_div" })
}

/// Outcome of a deposit against the current pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOutcome {
    pub accepted_x: Decimal,
    pub accepted_y: Decimal,
    pub refund_x: Decimal,
    pub refund_y: Decimal,
    pub minted: Decimal,
}

/// Price a deposit of `(deposit_x, deposit_y)` into `pool`.
///
/// Pool coins are minted for the scarcer side; the excess of the other side
/// is refunded.
pub fn compute_deposit(
    pool: &Pool,
    deposit_x: Decimal,
    deposit_y: Decimal,
    params: &Params,
) -> Result<DepositOutcome> {
    if deposit_x <= Decimal::ZERO || deposit_y <= Decimal::ZERO {
        return Err(LiquidityError::BelowMinimum {
            reason: "deposit must include both reserve coins".into(),
        });
    }
    let supply = pool.pool_coin_supply;
    let minted_by_x = mul_div_floor(deposit_x, supply, pool.reserve_x)?;
    let minted_by_y = mul_div_floor(deposit_y, supply, pool.reserve_y)?;
    let minted = minted_by_x.min(minted_by_y);
    if minted.is_zero() {
        return Err(LiquidityError::BelowMinimum {
            reason: "deposit too small to mint a pool coin".into(),
        });
    }

    let accepted_x = deposit_x.min(mul_div_ceil(minted, pool.reserve_x, supply)?);
    let accepted_y = deposit_y.min(mul_div_ceil(minted, pool.reserve_y, supply)?);

    // accepted_x / accepted_y against reserve_x / reserve_y
    let lhs = checked_mul(accepted_x, pool.reserve_y)?;
    let rhs = checked_mul(accepted_y, pool.reserve_x)?;
    let deviation = (lhs - rhs)
        .abs()
        .checked_div(rhs)
        .ok_or(LiquidityError::ArithmeticOverflow {
            context: "deposit ratio",
        })?;
    if deviation > Decimal::new(MAX_DEPOSIT_RATIO_DEVIATION_BPS, 4) {
        return Err(LiquidityError::ReserveRatioOutOfRange { deviation });
    }

    if !params.reserve_unlimited() {
        let cap = params.max_reserve_coin_amount;
        let after = (pool.reserve_x + accepted_x).max(pool.reserve_y + accepted_y);
        if after > cap {
            return Err(LiquidityError::MaxReserveExceeded { amount: after, max: cap });
        }
    }

    Ok(DepositOutcome {
        accepted_x,
        accepted_y,
        refund_x: deposit_x - accepted_x,
        refund_y: deposit_y - accepted_y,
        minted,
    })
}

/// Outcome of burning pool coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub burned: Decimal,
    pub withdrawn_x: Decimal,
    pub withdrawn_y: Decimal,
}

/// Price a withdrawal of `burned` pool coins. The withdraw fee share stays
/// in the reserves.
pub fn compute_withdrawal(pool: &Pool, burned: Decimal, params: &Params) -> Result<WithdrawOutcome> {
    if burned <= Decimal::ZERO {
        return Err(LiquidityError::InvalidAmount(burned));
    }
    if burned >= pool.pool_coin_supply {
        return Err(LiquidityError::PoolDepletion(pool.id));
    }
    let keep = Decimal::ONE - params.withdraw_fee_rate;
    let withdrawn_x = checked_mul(
        mul_div(pool.reserve_x, burned, pool.pool_coin_supply)?,
        keep,
    )?
    .floor();
    let withdrawn_y = checked_mul(
        mul_div(pool.reserve_y, burned, pool.pool_coin_supply)?,
        keep,
    )?
    .floor();
    if withdrawn_x.is_zero() && withdrawn_y.is_zero() {
        return Err(LiquidityError::BelowMinimum {
            reason: "withdrawal too small to return a reserve coin".into(),
        });
    }
    Ok(WithdrawOutcome {
        burned,
        withdrawn_x,
        withdrawn_y,
    })
}

/// Smallest swap offer worth keeping in a batch.
///
/// An offer below it either cannot buy a single unit of the demand coin at
/// the pool price or is negligible against the pool's per-batch exposure.
pub fn dust_threshold(pool: &Pool, direction: SwapDirection, params: &Params) -> Result<Decimal> {
    let (offered, other) = pool.reserves_for(direction);
    let by_exposure = mul_div_ceil(
        offered,
        params.max_order_amount_ratio,
        Decimal::from(DUST_RATIO_DIVISOR),
    )?;
    let by_price = offered
        .checked_div(other)
        .ok_or(LiquidityError::ArithmeticOverflow {
            context: "dust threshold",
        })?
        .ceil();
    Ok(by_exposure.max(by_price))
}

/// Largest swap offer accepted for the offered reserve.
pub fn max_order_amount(pool: &Pool, direction: SwapDirection, params: &Params) -> Result<Decimal> {
    let (offered, _) = pool.reserves_for(direction);
    Ok(checked_mul(offered, params.max_order_amount_ratio)?.floor())
}

/// Whether `price` lies within [`MAX_ORDER_PRICE_DEVIATION`] of the pool
/// price, bounds included.
pub fn order_price_in_range(pool: &Pool, price: Decimal) -> Result<bool> {
    let pool_price = pool.price()?;
    let overflow = LiquidityError::ArithmeticOverflow {
        context: "order price range",
    };
    let low = pool_price
        .checked_div(MAX_ORDER_PRICE_DEVIATION)
        .ok_or(overflow.clone())?;
    let high = pool_price
        .checked_mul(MAX_ORDER_PRICE_DEVIATION)
        .ok_or(overflow)?;
    Ok(price >= low && price <= high)
}

/// Half the swap fee on `amount`, rounded down.
pub fn half_fee(amount: Decimal, params: &Params) -> Result<Decimal> {
    Ok(checked_mul(amount, params.half_swap_fee_rate())?.floor())
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .ok_or(LiquidityError::ArithmeticOverflow { context: "mul" })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn mul_div_rounding() {
        assert_eq!(mul_div_floor(dec(7), dec(3), dec(2)).unwrap(), dec(10));
        assert_eq!(mul_div_ceil(dec(7), dec(3), dec(2)).unwrap(), dec(11));
        assert_eq!(mul_div_ceil(dec(6), dec(3), dec(2)).unwrap(), dec(9));
    }

    #[test]
    fn order_price_range_is_relative_to_pool_price() {
        let pool = Pool::dummy(1, 1_000_000, 2_000_000);
        assert!(order_price_in_range(&pool, Decimal::new(2, 1)).unwrap());
        assert!(order_price_in_range(&pool, dec(20)).unwrap());
        assert!(!order_price_in_range(&pool, Decimal::new(19, 2)).unwrap());
        assert!(!order_price_in_range(&pool, dec(21)).unwrap());
        assert!(!order_price_in_range(&pool, Decimal::new(1, 25)).unwrap());
    }

    #[test]
    fn mul_div_by_zero_is_overflow() {
        assert!(matches!(
            mul_div_floor(dec(1), dec(1), Decimal::ZERO),
            Err(LiquidityError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn deposit_refunds_the_excess_side() {
        let pool = Pool::dummy(1, 100, 100);
        let out = compute_deposit(&pool, dec(10), dec(5), &Params::default()).unwrap();
        assert_eq!(out.minted, dec(50_000));
        assert_eq!(out.accepted_x, dec(5));
        assert_eq!(out.accepted_y, dec(5));
        assert_eq!(out.refund_x, dec(5));
        assert_eq!(out.refund_y, Decimal::ZERO);
    }

    #[test]
    fn deposit_rejects_one_sided() {
        let pool = Pool::dummy(1, 100, 100);
        assert!(matches!(
            compute_deposit(&pool, dec(10), Decimal::ZERO, &Params::default()),
            Err(LiquidityError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn deposit_rejects_zero_mint() {
        let mut pool = Pool::dummy(1, 1_000_000, 1_000_000);
        pool.pool_coin_supply = dec(10);
        assert!(matches!(
            compute_deposit(&pool, dec(1), dec(1), &Params::default()),
            Err(LiquidityError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn deposit_rejects_skewed_rounding() {
        // 1/1 into a 1:3 pool: rounding up both sides accepts 1:1.
        let pool = Pool::dummy(1, 100, 300);
        assert!(matches!(
            compute_deposit(&pool, dec(1), dec(1), &Params::default()),
            Err(LiquidityError::ReserveRatioOutOfRange { .. })
        ));
    }

    #[test]
    fn deposit_respects_reserve_cap() {
        let pool = Pool::dummy(1, 100, 100);
        let params = Params {
            max_reserve_coin_amount: dec(104),
            ..Params::default()
        };
        assert!(matches!(
            compute_deposit(&pool, dec(5), dec(5), &params),
            Err(LiquidityError::MaxReserveExceeded { .. })
        ));
        assert!(compute_deposit(&pool, dec(4), dec(4), &params).is_ok());
    }

    #[test]
    fn withdrawal_keeps_fee_in_pool() {
        let pool = Pool::dummy(1, 100, 100);
        let params = Params {
            withdraw_fee_rate: Decimal::new(3, 3),
            ..Params::default()
        };
        let out = compute_withdrawal(&pool, dec(500_000), &params).unwrap();
        assert_eq!(out.withdrawn_x, dec(49));
        assert_eq!(out.withdrawn_y, dec(49));
    }

    #[test]
    fn withdrawal_of_whole_supply_is_rejected() {
        let pool = Pool::dummy(1, 100, 100);
        assert!(matches!(
            compute_withdrawal(&pool, dec(1_000_000), &Params::default()),
            Err(LiquidityError::PoolDepletion(_))
        ));
    }

    #[test]
    fn tiny_withdrawal_is_below_minimum() {
        let pool = Pool::dummy(1, 100, 100);
        assert!(matches!(
            compute_withdrawal(&pool, dec(1), &Params::default()),
            Err(LiquidityError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn dust_threshold_takes_the_larger_bound() {
        let params = Params::default();
        let pool = Pool::dummy(1, 1_000_000, 1_000_000);
        // ceil(1e6 * 0.1 / 1e4) = 10 beats ceil(1e6 / 1e6) = 1
        assert_eq!(
            dust_threshold(&pool, SwapDirection::XToY, &params).unwrap(),
            dec(10)
        );
        let skewed = Pool::dummy(1, 1_000_000, 1_000);
        // offering X: one Y costs 1000 X
        assert_eq!(
            dust_threshold(&skewed, SwapDirection::XToY, &params).unwrap(),
            dec(1_000)
        );
        assert_eq!(
            dust_threshold(&skewed, SwapDirection::YToX, &params).unwrap(),
            dec(1)
        );
    }

    #[test]
    fn order_limits() {
        let params = Params::default();
        let pool = Pool::dummy(1, 1_000_000, 500_000);
        assert_eq!(
            max_order_amount(&pool, SwapDirection::XToY, &params).unwrap(),
            dec(100_000)
        );
        assert_eq!(
            max_order_amount(&pool, SwapDirection::YToX, &params).unwrap(),
            dec(50_000)
        );
        assert_eq!(half_fee(dec(10_000), &params).unwrap(), dec(15));
        assert_eq!(half_fee(dec(7_001), &params).unwrap(), dec(10));
    }
}
