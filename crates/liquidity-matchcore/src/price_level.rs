//! A single limit price in the swap book.
//!
//! Orders sharing a limit price are kept in submission order, so the front
//! of the level is the oldest order and wins any leftover units when a
//! marginal fill is split.

use rust_decimal::Decimal;

/// One resting order inside a level: its position in the batch's swap list
/// and its remaining offer at the time the book was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEntry {
    pub swap_index: usize,
    pub remaining: Decimal,
}

/// All active orders of one direction at one limit price.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// The limit price of this level, Y per X.
    pub price: Decimal,
    /// Orders in ascending sequence order.
    pub entries: Vec<LevelEntry>,
    total: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            entries: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    /// Add an order to the back of this level.
    pub fn push_back(&mut self, swap_index: usize, remaining: Decimal) {
        self.total += remaining;
        self.entries.push(LevelEntry {
            swap_index,
            remaining,
        });
    }

    /// Total remaining offer across all orders at this level.
    #[must_use]
    pub fn total_offer(&self) -> Decimal {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
