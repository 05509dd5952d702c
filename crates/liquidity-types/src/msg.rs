//! Request messages accepted by the liquidity module.
//!
//! [`Msg`] is the closed set of requests. Decoding goes through
//! [`Msg::from_json`], which reports unknown request kinds as
//! [`LiquidityError::UnrecognizedRequest`] instead of a generic decode error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Coin, LiquidityError, PoolId, Result, SwapDirection};

/// Create a pool and seed it with both reserve coins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreatePool {
    pub creator: AccountId,
    /// Deposit of the lexicographically smaller denom.
    pub deposit_x: Coin,
    /// Deposit of the larger denom.
    pub deposit_y: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDepositWithinBatch {
    pub depositor: AccountId,
    pub pool_id: PoolId,
    pub deposit_x: Coin,
    pub deposit_y: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawWithinBatch {
    pub withdrawer: AccountId,
    pub pool_id: PoolId,
    pub pool_coin: Coin,
}

/// A limit swap. `order_price` is always quoted as Y per X.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSwapWithinBatch {
    pub requester: AccountId,
    pub pool_id: PoolId,
    pub direction: SwapDirection,
    pub offer_coin: Coin,
    pub demand_coin_denom: String,
    /// Prepaid half of the swap fee, in the offer denom.
    pub offer_coin_fee: Coin,
    pub order_price: Decimal,
    /// Must equal the current `Params::swap_fee_rate`.
    pub swap_fee_rate: Decimal,
}

/// Every request the module handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Msg {
    CreatePool(MsgCreatePool),
    DepositWithinBatch(MsgDepositWithinBatch),
    WithdrawWithinBatch(MsgWithdrawWithinBatch),
    SwapWithinBatch(MsgSwapWithinBatch),
}

impl Msg {
    const KINDS: [&'static str; 4] = [
        "CreatePool",
        "DepositWithinBatch",
        "WithdrawWithinBatch",
        "SwapWithinBatch",
    ];

    /// Decode a message envelope `{"type": ..., "value": ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| LiquidityError::UnrecognizedRequest("missing type tag".into()))?;
        if !Self::KINDS.contains(&kind) {
            return Err(LiquidityError::UnrecognizedRequest(kind.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreatePool(_) => Self::KINDS[0],
            Self::DepositWithinBatch(_) => Self::KINDS[1],
            Self::WithdrawWithinBatch(_) => Self::KINDS[2],
            Self::SwapWithinBatch(_) => Self::KINDS[3],
        }
    }

    /// The account whose funds the request moves.
    #[must_use]
    pub fn signer(&self) -> &AccountId {
        match self {
            Self::CreatePool(m) => &m.creator,
            Self::DepositWithinBatch(m) => &m.depositor,
            Self::WithdrawWithinBatch(m) => &m.withdrawer,
            Self::SwapWithinBatch(m) => &m.requester,
        }
    }
}
