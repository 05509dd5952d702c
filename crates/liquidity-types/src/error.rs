//! Error types for the liquidity engine.
//!
//! All errors use the `LQ_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Pool errors
//! - 2xx: Funds / escrow errors
//! - 3xx: Request validation errors
//! - 4xx: Batch lifecycle errors
//! - 5xx: Matching errors
//! - 6xx: Settlement and invariant errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{BatchPhase, PoolId};

/// Central error enum for all liquidity operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiquidityError {
    // =================================================================
    // Pool Errors (1xx)
    // =================================================================
    /// No pool exists with this id.
    #[error("LQ_ERR_100: Pool not found: {0}")]
    PoolNotFound(PoolId),

    /// The reserve denoms are equal or not in canonical order.
    #[error("LQ_ERR_101: Invalid denom pair: {reason}")]
    InvalidDenomPair { reason: String },

    /// A pool for this reserve denom pair already exists.
    #[error("LQ_ERR_102: Duplicate denom pair: {denom_x}/{denom_y}")]
    DuplicateDenom { denom_x: String, denom_y: String },

    /// A reserve would exceed `max_reserve_coin_amount`.
    #[error("LQ_ERR_103: Max reserve exceeded: {amount} > {max}")]
    MaxReserveExceeded { amount: Decimal, max: Decimal },

    /// The deposit ratio deviates too far from the pool's reserve ratio.
    #[error("LQ_ERR_104: Reserve ratio out of range: deviation {deviation}")]
    ReserveRatioOutOfRange { deviation: Decimal },

    /// The operation would leave the pool with zero reserves or supply.
    #[error("LQ_ERR_105: Operation would deplete pool {0}")]
    PoolDepletion(PoolId),

    // =================================================================
    // Funds / Escrow Errors (2xx)
    // =================================================================
    /// Not enough balance to escrow or transfer.
    #[error("LQ_ERR_200: Insufficient funds: need {needed} {denom}, have {available}")]
    InsufficientFunds {
        denom: String,
        needed: Decimal,
        available: Decimal,
    },

    /// Escrow records disagree with the escrow account.
    #[error("LQ_ERR_201: Escrow mismatch: {reason}")]
    EscrowMismatch { reason: String },

    // =================================================================
    // Request Errors (3xx)
    // =================================================================
    /// An amount is under its minimum (deposit, order, or mint amount).
    #[error("LQ_ERR_300: Below minimum: {reason}")]
    BelowMinimum { reason: String },

    /// An amount is not a positive integer.
    #[error("LQ_ERR_301: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// A limit price is not positive.
    #[error("LQ_ERR_302: Invalid order price: {0}")]
    InvalidPrice(Decimal),

    /// The request's swap fee rate differs from the current params.
    #[error("LQ_ERR_303: Swap fee rate mismatch: expected {expected}, got {actual}")]
    SwapFeeRateMismatch { expected: Decimal, actual: Decimal },

    /// The prepaid offer fee is not half the swap fee of the offer.
    #[error("LQ_ERR_304: Bad offer coin fee: expected {expected}, got {actual}")]
    BadOfferCoinFee { expected: Decimal, actual: Decimal },

    /// The offer exceeds `max_order_amount_ratio` of the offered reserve.
    #[error("LQ_ERR_305: Order amount {amount} exceeds limit {limit}")]
    OrderAmountRatioExceeded { amount: Decimal, limit: Decimal },

    /// The request variant is unknown at the dispatch boundary.
    #[error("LQ_ERR_306: Unrecognized request: {0}")]
    UnrecognizedRequest(String),

    // =================================================================
    // Batch Errors (4xx)
    // =================================================================
    /// An operation was attempted in the wrong batch phase.
    #[error("LQ_ERR_400: Wrong batch phase: expected {expected}, got {actual}")]
    WrongBatchPhase {
        expected: BatchPhase,
        actual: BatchPhase,
    },

    // =================================================================
    // Matching Errors (5xx)
    // =================================================================
    /// Fixed-point arithmetic left the representable range.
    #[error("LQ_ERR_500: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    // =================================================================
    // Settlement / Invariant Errors (6xx)
    // =================================================================
    /// A pool invariant failed after a matching pass. Fatal.
    #[error("LQ_ERR_600: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// Supply conservation failed. Fatal.
    #[error("LQ_ERR_601: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Params failed validation.
    #[error("LQ_ERR_900: Invalid params: {0}")]
    InvalidParams(String),

    /// The genesis snapshot is inconsistent.
    #[error("LQ_ERR_901: Invalid genesis: {0}")]
    InvalidGenesis(String),

    /// Serialization / deserialization error.
    #[error("LQ_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

impl LiquidityError {
    /// Whether this error must halt block processing instead of refunding
    /// a single request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation { .. }
                | Self::SupplyInvariantViolation { .. }
                | Self::EscrowMismatch { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LiquidityError>;

impl From<serde_json::Error> for LiquidityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
