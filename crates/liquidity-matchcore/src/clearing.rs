//! Clearing price computation for one matching round.
//!
//! The pool is the implicit counterparty of every batch. At a candidate
//! price `p` (Y per X) it absorbs exactly the X that would move its own
//! price to `p`:
//!
//! ```text
//! pool_intake_x(p) = (Ry - p·Rx) / (2p)
//! ```
//!
//! clamped so that its net payout for the batch stays within the exposure
//! caps. Excess X supply
//!
//! ```text
//! E(p) = S(p) - BY(p)/p - pool_intake_x(p)
//! ```
//!
//! is non-decreasing in `p`, so the clearing price is its root. Between two
//! consecutive breakpoints (limit prices and band edges) every term has a
//! fixed shape and the root has a closed form. At a breakpoint the root is
//! accepted when `E` jumps across zero; the orders resting exactly there
//! become the marginal orders and are filled partially.
//!
//! The algorithm is deterministic: same inputs → same price.

use liquidity_types::{LiquidityError, Result};
use rust_decimal::Decimal;

use crate::orderbook::SwapBook;

/// Pool state seen by one matching round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCurve {
    pub reserve_x: Decimal,
    pub reserve_y: Decimal,
    /// X the pool may still pay out in this batch.
    pub cap_x: Decimal,
    /// Y the pool may still pay out in this batch.
    pub cap_y: Decimal,
}

impl PoolCurve {
    /// X the pool takes in (negative: pays out) when trading to price `p`.
    pub fn intake_x(&self, p: Decimal) -> Result<Decimal> {
        let raw = div(
            sub(self.reserve_y, mul(p, self.reserve_x)?)?,
            mul(Decimal::TWO, p)?,
        )?;
        let max_intake = div(self.cap_y, p)?;
        Ok(raw.min(max_intake).max(-self.cap_x))
    }

    /// Below this price the pool's Y payout is capped.
    pub fn band_low(&self) -> Result<Option<Decimal>> {
        let num = sub(self.reserve_y, mul(Decimal::TWO, self.cap_y)?)?;
        if num <= Decimal::ZERO {
            return Ok(None);
        }
        Ok(Some(div(num, self.reserve_x)?))
    }

    /// Above this price the pool's X payout is capped.
    pub fn band_high(&self) -> Result<Option<Decimal>> {
        let den = sub(self.reserve_x, mul(Decimal::TWO, self.cap_x)?)?;
        if den <= Decimal::ZERO {
            return Ok(None);
        }
        Ok(Some(div(self.reserve_y, den)?))
    }
}

/// Result of clearing price computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearingResult {
    /// The uniform price of the round, Y per X.
    pub price: Decimal,
    /// X to take from sells whose limit equals `price`.
    pub marginal_sell_x: Decimal,
    /// Y to take from buys whose limit equals `price`.
    pub marginal_buy_y: Decimal,
    /// X the pool absorbs at `price` (negative when it pays X out).
    pub pool_intake_x: Decimal,
}

/// Compute the uniform clearing price of `book` against `curve`.
///
/// Sells with a limit below the price and buys with a limit above it are
/// filled completely. Returns `None` when no order would trade.
pub fn compute_clearing_price(book: &SwapBook, curve: &PoolCurve) -> Result<Option<ClearingResult>> {
    if book.is_empty() {
        return Ok(None);
    }

    let band_low = curve.band_low()?;
    let band_high = curve.band_high()?;

    let mut points = book.limit_prices();
    points.extend(band_low);
    points.extend(band_high);
    points.sort_unstable();
    points.dedup();

    let mut lo = Decimal::ZERO;
    for &point in &points {
        if let Some(result) = solve_interval(book, curve, lo, Some(point), band_low, band_high)? {
            return finish(book, result);
        }
        if let Some(result) = solve_point(book, curve, point)? {
            return finish(book, result);
        }
        lo = point;
    }
    match solve_interval(book, curve, lo, None, band_low, band_high)? {
        Some(result) => finish(book, result),
        None => Ok(None),
    }
}

/// Root of `E` strictly inside `(lo, hi)`, if any.
fn solve_interval(
    book: &SwapBook,
    curve: &PoolCurve,
    lo: Decimal,
    hi: Option<Decimal>,
    band_low: Option<Decimal>,
    band_high: Option<Decimal>,
) -> Result<Option<ClearingResult>> {
    // With no breakpoint inside, eligibility is fixed across the interval.
    let s = book.sells_at_or_below(lo);
    let by = match hi {
        Some(hi) => book.buys_at_or_above(hi),
        None => Decimal::ZERO,
    };

    let capped_buy = matches!((hi, band_low), (Some(hi), Some(low)) if hi <= low);
    let capped_sell = matches!(band_high, Some(high) if lo >= high);

    let price = if capped_buy {
        // pool takes cap_y / p of X
        if s.is_zero() {
            return Ok(None);
        }
        div(add(by, curve.cap_y)?, s)?
    } else if capped_sell {
        // pool pays cap_x of X
        let den = add(s, curve.cap_x)?;
        if den.is_zero() {
            return Ok(None);
        }
        div(by, den)?
    } else {
        div(
            add(mul(Decimal::TWO, by)?, curve.reserve_y)?,
            add(mul(Decimal::TWO, s)?, curve.reserve_x)?,
        )?
    };

    let inside = price > lo && hi.is_none_or(|hi| price < hi);
    if !inside {
        return Ok(None);
    }
    Ok(Some(ClearingResult {
        price,
        marginal_sell_x: Decimal::ZERO,
        marginal_buy_y: Decimal::ZERO,
        pool_intake_x: curve.intake_x(price)?,
    }))
}

/// Root of `E` exactly at breakpoint `c`, if `E` crosses zero there.
fn solve_point(book: &SwapBook, curve: &PoolCurve, c: Decimal) -> Result<Option<ClearingResult>> {
    let pool = curve.intake_x(c)?;
    let s_lt = book.sells_below(c);
    let s_le = book.sells_at_or_below(c);
    let by_gt = book.buys_above(c);
    let by_ge = book.buys_at_or_above(c);

    let e_minus = sub(sub(s_lt, div(by_ge, c)?)?, pool)?;
    let e_plus = sub(sub(s_le, div(by_gt, c)?)?, pool)?;
    if e_minus > Decimal::ZERO || e_plus < Decimal::ZERO {
        return Ok(None);
    }

    let s_eq = s_le - s_lt;
    let by_eq = by_ge - by_gt;
    // X the marginal sells must supply beyond what the marginal buys take.
    let d = sub(add(div(by_gt, c)?, pool)?, s_lt)?;
    let sell_x = s_eq.min(add(d, div(by_eq, c)?)?).max(Decimal::ZERO);
    let buy_y = mul(c, sub(sell_x, d)?)?.max(Decimal::ZERO).min(by_eq);

    Ok(Some(ClearingResult {
        price: c,
        marginal_sell_x: sell_x,
        marginal_buy_y: buy_y,
        pool_intake_x: pool,
    }))
}

/// Drop roots at which no order trades.
fn finish(book: &SwapBook, result: ClearingResult) -> Result<Option<ClearingResult>> {
    let traded = book.sells_below(result.price)
        + book.buys_above(result.price)
        + result.marginal_sell_x
        + result.marginal_buy_y;
    if traded.is_zero() {
        return Ok(None);
    }
    Ok(Some(result))
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or(overflow())
}

fn sub(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b).ok_or(overflow())
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or(overflow())
}

fn div(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_div(b).ok_or(overflow())
}

fn overflow() -> LiquidityError {
    LiquidityError::ArithmeticOverflow {
        context: "clearing price",
    }
}
