//! The swap book of one pool batch.
//!
//! Active swaps are grouped by direction and limit price in `BTreeMap`s
//! keyed by price, ascending:
//! - **Sells** (`XToY`): eligible at any price at or above their limit
//! - **Buys** (`YToX`): eligible at any price at or below their limit
//!
//! Sell volume is counted in X, buy volume in Y. The book is rebuilt at the
//! start of every matching round from the batch's remaining amounts.

use std::collections::BTreeMap;
use std::ops::Bound;

use liquidity_types::{SwapDirection, SwapRequest};
use rust_decimal::Decimal;

use crate::price_level::PriceLevel;

#[derive(Debug, Default)]
pub struct SwapBook {
    sells: BTreeMap<Decimal, PriceLevel>,
    buys: BTreeMap<Decimal, PriceLevel>,
}

impl SwapBook {
    /// Build the book from every swap that still has something to offer.
    #[must_use]
    pub fn from_swaps(swaps: &[SwapRequest]) -> Self {
        let mut book = Self::default();
        for (index, swap) in swaps.iter().enumerate() {
            if swap.status.executed || swap.remaining_offer <= Decimal::ZERO {
                continue;
            }
            let side = match swap.direction {
                SwapDirection::XToY => &mut book.sells,
                SwapDirection::YToX => &mut book.buys,
            };
            side.entry(swap.order_price)
                .or_insert_with(|| PriceLevel::new(swap.order_price))
                .push_back(index, swap.remaining_offer);
        }
        book
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sells.is_empty() && self.buys.is_empty()
    }

    /// Every distinct limit price on either side, ascending.
    #[must_use]
    pub fn limit_prices(&self) -> Vec<Decimal> {
        let mut prices: Vec<Decimal> = self.sells.keys().chain(self.buys.keys()).copied().collect();
        prices.sort_unstable();
        prices.dedup();
        prices
    }

    /// X offered by sells with limit `<= price`.
    #[must_use]
    pub fn sells_at_or_below(&self, price: Decimal) -> Decimal {
        sum(self.sells.range(..=price))
    }

    /// X offered by sells with limit `< price`.
    #[must_use]
    pub fn sells_below(&self, price: Decimal) -> Decimal {
        sum(self.sells.range(..price))
    }

    /// Y offered by buys with limit `>= price`.
    #[must_use]
    pub fn buys_at_or_above(&self, price: Decimal) -> Decimal {
        sum(self.buys.range(price..))
    }

    /// Y offered by buys with limit `> price`.
    #[must_use]
    pub fn buys_above(&self, price: Decimal) -> Decimal {
        sum(self
            .buys
            .range((Bound::Excluded(price), Bound::Unbounded)))
    }

    #[must_use]
    pub fn sell_level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.sells.get(&price)
    }

    #[must_use]
    pub fn buy_level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.buys.get(&price)
    }

    // =================================================================
    // Iteration (for the matcher)
    // =================================================================

    /// Sell levels, lowest limit first.
    pub fn sell_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.sells.values()
    }

    /// Buy levels, lowest limit first.
    pub fn buy_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.buys.values()
    }
}

fn sum<'a>(levels: impl Iterator<Item = (&'a Decimal, &'a PriceLevel)>) -> Decimal {
    levels.map(|(_, level)| level.total_offer()).sum()
}
