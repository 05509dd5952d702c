//! Batched requests.
//!
//! A request is recorded in its pool's batch when submitted and lives there
//! until the batch settles. Funds backing it sit in the module escrow account
//! for the whole pendency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, PoolId, RequestSeq};

/// Which reserve a swap offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Offers X, demands Y. Eligible while the clearing price is at or above
    /// the limit.
    XToY,
    /// Offers Y, demands X. Eligible while the clearing price is at or below
    /// the limit.
    YToX,
}

impl std::fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XToY => write!(f, "X_TO_Y"),
            Self::YToX => write!(f, "Y_TO_X"),
        }
    }
}

/// Execution flags shared by every request kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub executed: bool,
    pub succeeded: bool,
    pub to_be_deleted: bool,
}

impl RequestStatus {
    /// Processed and finished; removed when the batch completes.
    #[must_use]
    pub fn done(succeeded: bool) -> Self {
        Self {
            executed: true,
            succeeded,
            to_be_deleted: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Deposit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub seq: RequestSeq,
    pub depositor: AccountId,
    pub pool_id: PoolId,
    pub height: u64,
    pub deposit_x: Decimal,
    pub deposit_y: Decimal,
    pub status: RequestStatus,
}

// ---------------------------------------------------------------------------
// Withdraw
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub seq: RequestSeq,
    pub withdrawer: AccountId,
    pub pool_id: PoolId,
    pub height: u64,
    pub pool_coin_amount: Decimal,
    pub status: RequestStatus,
}

// ---------------------------------------------------------------------------
// Swap
// ---------------------------------------------------------------------------

/// A limit swap against a pool.
///
/// `remaining_offer` and `remaining_offer_fee` are what the escrow still
/// holds for this request. They shrink with every fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub seq: RequestSeq,
    pub requester: AccountId,
    pub pool_id: PoolId,
    pub height: u64,
    pub direction: SwapDirection,
    pub offer_denom: String,
    pub demand_denom: String,
    pub offer_amount: Decimal,
    pub remaining_offer: Decimal,
    /// Prepaid half of the swap fee, in the offer denom.
    pub offer_coin_fee: Decimal,
    pub remaining_offer_fee: Decimal,
    /// Limit price, Y per X.
    pub order_price: Decimal,
    /// Demand coins delivered so far, net of the exchanged fee.
    pub received_amount: Decimal,
    /// Exchanged-side fee withheld so far, in the demand denom.
    pub exchanged_fee_paid: Decimal,
    pub status: RequestStatus,
}

impl SwapRequest {
    #[must_use]
    pub fn filled_offer(&self) -> Decimal {
        self.offer_amount - self.remaining_offer
    }

    #[must_use]
    pub fn offer_fee_paid(&self) -> Decimal {
        self.offer_coin_fee - self.remaining_offer_fee
    }

    #[must_use]
    pub fn is_fully_filled(&self) -> bool {
        self.remaining_offer.is_zero()
    }

    /// Amount of the offer denom the escrow holds for this request.
    #[must_use]
    pub fn escrowed(&self) -> Decimal {
        self.remaining_offer + self.remaining_offer_fee
    }

    /// Whether the order accepts a fill at `price`.
    #[must_use]
    pub fn accepts_price(&self, price: Decimal) -> bool {
        match self.direction {
            SwapDirection::XToY => price >= self.order_price,
            SwapDirection::YToX => price <= self.order_price,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl SwapRequest {
    /// A swap on an `A/B` pool with a zero prepaid fee.
    pub fn dummy(seq: u64, direction: SwapDirection, offer: i64, price: Decimal) -> Self {
        let (offer_denom, demand_denom) = match direction {
            SwapDirection::XToY => ("A", "B"),
            SwapDirection::YToX => ("B", "A"),
        };
        Self {
            seq: RequestSeq(seq),
            requester: AccountId::new(format!("trader-{seq}")),
            pool_id: PoolId(1),
            height: 1,
            direction,
            offer_denom: offer_denom.into(),
            demand_denom: demand_denom.into(),
            offer_amount: Decimal::new(offer, 0),
            remaining_offer: Decimal::new(offer, 0),
            offer_coin_fee: Decimal::ZERO,
            remaining_offer_fee: Decimal::ZERO,
            order_price: price,
            received_amount: Decimal::ZERO,
            exchanged_fee_paid: Decimal::ZERO,
            status: RequestStatus::default(),
        }
    }

    /// Same as [`SwapRequest::dummy`] with a prepaid offer fee.
    pub fn dummy_with_fee(
        seq: u64,
        direction: SwapDirection,
        offer: i64,
        price: Decimal,
        fee: i64,
    ) -> Self {
        let mut swap = Self::dummy(seq, direction, offer, price);
        swap.offer_coin_fee = Decimal::new(fee, 0);
        swap.remaining_offer_fee = Decimal::new(fee, 0);
        swap
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl DepositRequest {
    pub fn dummy(seq: u64, deposit_x: i64, deposit_y: i64) -> Self {
        Self {
            seq: RequestSeq(seq),
            depositor: AccountId::new(format!("lp-{seq}")),
            pool_id: PoolId(1),
            height: 1,
            deposit_x: Decimal::new(deposit_x, 0),
            deposit_y: Decimal::new(deposit_y, 0),
            status: RequestStatus::default(),
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl WithdrawRequest {
    pub fn dummy(seq: u64, amount: i64) -> Self {
        Self {
            seq: RequestSeq(seq),
            withdrawer: AccountId::new(format!("lp-{seq}")),
            pool_id: PoolId(1),
            height: 1,
            pool_coin_amount: Decimal::new(amount, 0),
            status: RequestStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_acceptance_follows_direction() {
        let sell = SwapRequest::dummy(1, SwapDirection::XToY, 10, Decimal::ONE);
        assert!(sell.accepts_price(Decimal::ONE));
        assert!(sell.accepts_price(Decimal::new(11, 1)));
        assert!(!sell.accepts_price(Decimal::new(9, 1)));

        let buy = SwapRequest::dummy(2, SwapDirection::YToX, 10, Decimal::ONE);
        assert!(buy.accepts_price(Decimal::ONE));
        assert!(buy.accepts_price(Decimal::new(9, 1)));
        assert!(!buy.accepts_price(Decimal::new(11, 1)));
    }

    #[test]
    fn fill_tracking() {
        let mut swap = SwapRequest::dummy_with_fee(1, SwapDirection::XToY, 100, Decimal::ONE, 4);
        assert_eq!(swap.escrowed(), Decimal::new(104, 0));
        swap.remaining_offer = Decimal::new(40, 0);
        swap.remaining_offer_fee = Decimal::new(2, 0);
        assert_eq!(swap.filled_offer(), Decimal::new(60, 0));
        assert_eq!(swap.offer_fee_paid(), Decimal::new(2, 0));
        assert!(!swap.is_fully_filled());
        swap.remaining_offer = Decimal::ZERO;
        assert!(swap.is_fully_filled());
    }

    #[test]
    fn status_done() {
        let status = RequestStatus::done(false);
        assert!(status.executed);
        assert!(!status.succeeded);
        assert!(status.to_be_deleted);
        assert!(!RequestStatus::default().executed);
    }

    #[test]
    fn direction_display() {
        assert_eq!(SwapDirection::XToY.to_string(), "X_TO_Y");
        assert_eq!(SwapDirection::YToX.to_string(), "Y_TO_X");
    }
}
