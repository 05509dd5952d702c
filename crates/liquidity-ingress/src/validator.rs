//! Submission checks for requests entering a batch.
//!
//! Every check here runs before any coin moves. A request that passes is
//! escrowed and appended to its pool's batch; one that fails is returned to
//! the caller untouched.
//!
//! Funds are checked by [`EscrowManager::lock`](crate::EscrowManager::lock),
//! which is the last step of every submission.

use liquidity_matchcore::{dust_threshold, half_fee, max_order_amount, order_price_in_range};
use liquidity_types::{
    ensure_positive_whole, Coin, LiquidityError, MsgDepositWithinBatch, MsgSwapWithinBatch,
    MsgWithdrawWithinBatch, Params, Pool, Result,
};
use rust_decimal::Decimal;

fn ensure_denom(coin: &Coin, expected: &str) -> Result<()> {
    if coin.denom == expected {
        Ok(())
    } else {
        Err(LiquidityError::InvalidDenomPair {
            reason: format!("expected {expected}, got {}", coin.denom),
        })
    }
}

/// A zero amount is below minimum; a negative or fractional one is invalid.
fn ensure_submitted_amount(coin: &Coin) -> Result<()> {
    if coin.amount.is_zero() {
        return Err(LiquidityError::BelowMinimum {
            reason: format!("zero {} submitted", coin.denom),
        });
    }
    ensure_positive_whole(coin.amount)
}

pub fn validate_deposit(pool: &Pool, msg: &MsgDepositWithinBatch) -> Result<()> {
    ensure_denom(&msg.deposit_x, &pool.denom_x)?;
    ensure_denom(&msg.deposit_y, &pool.denom_y)?;
    ensure_submitted_amount(&msg.deposit_x)?;
    ensure_submitted_amount(&msg.deposit_y)
}

pub fn validate_withdrawal(pool: &Pool, msg: &MsgWithdrawWithinBatch) -> Result<()> {
    ensure_denom(&msg.pool_coin, &pool.pool_coin_denom)?;
    ensure_submitted_amount(&msg.pool_coin)
}

/// Check a swap against the pool it targets and the current params.
///
/// Checks run in a fixed order so the reported error is deterministic:
/// denoms, price, fee rate, prepaid fee, then offer size. The limit price
/// must be positive and within the allowed deviation from the pool price.
pub fn validate_swap(pool: &Pool, msg: &MsgSwapWithinBatch, params: &Params) -> Result<()> {
    let (offer_denom, demand_denom) = pool.swap_denoms(msg.direction);
    ensure_denom(&msg.offer_coin, offer_denom)?;
    if msg.demand_coin_denom != demand_denom {
        return Err(LiquidityError::InvalidDenomPair {
            reason: format!(
                "{} swap on {} must demand {demand_denom}",
                msg.direction,
                pool.pair_symbol()
            ),
        });
    }
    ensure_positive_whole(msg.offer_coin.amount)?;
    if msg.order_price <= Decimal::ZERO || !order_price_in_range(pool, msg.order_price)? {
        return Err(LiquidityError::InvalidPrice(msg.order_price));
    }
    if msg.swap_fee_rate != params.swap_fee_rate {
        return Err(LiquidityError::SwapFeeRateMismatch {
            expected: params.swap_fee_rate,
            actual: msg.swap_fee_rate,
        });
    }
    let fee = half_fee(msg.offer_coin.amount, params)?;
    if msg.offer_coin_fee.denom != offer_denom || msg.offer_coin_fee.amount != fee {
        return Err(LiquidityError::BadOfferCoinFee {
            expected: fee,
            actual: msg.offer_coin_fee.amount,
        });
    }

    let dust = dust_threshold(pool, msg.direction, params)?;
    if msg.offer_coin.amount < dust {
        return Err(LiquidityError::BelowMinimum {
            reason: format!("offer {} under dust threshold {dust}", msg.offer_coin),
        });
    }
    let limit = max_order_amount(pool, msg.direction, params)?;
    if msg.offer_coin.amount > limit {
        return Err(LiquidityError::OrderAmountRatioExceeded {
            amount: msg.offer_coin.amount,
            limit,
        });
    }
    Ok(())
}

/// Denom and amount the requester must escrow for a swap: offer plus fee.
#[must_use]
pub fn swap_escrow(msg: &MsgSwapWithinBatch) -> Vec<Coin> {
    vec![msg.offer_coin.clone(), msg.offer_coin_fee.clone()]
}
