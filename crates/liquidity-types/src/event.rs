//! Events emitted by the liquidity module.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, BatchIndex, PoolId, RequestSeq};

/// Observable outcome of a request or batch, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityEvent {
    PoolCreated {
        pool_id: PoolId,
        creator: AccountId,
        pool_coin_denom: String,
        reserve_x: Decimal,
        reserve_y: Decimal,
        minted: Decimal,
    },
    DepositAccepted {
        seq: RequestSeq,
        pool_id: PoolId,
        accepted_x: Decimal,
        accepted_y: Decimal,
        refunded_x: Decimal,
        refunded_y: Decimal,
        minted: Decimal,
    },
    WithdrawExecuted {
        seq: RequestSeq,
        pool_id: PoolId,
        burned: Decimal,
        withdrawn_x: Decimal,
        withdrawn_y: Decimal,
    },
    /// A deposit or withdrawal failed at execution and its escrow was returned.
    RequestRefunded {
        seq: RequestSeq,
        pool_id: PoolId,
        reason: String,
    },
    SwapFilled {
        seq: RequestSeq,
        pool_id: PoolId,
        round: u32,
        price: Decimal,
        offer_filled: Decimal,
        offer_fee: Decimal,
        received: Decimal,
        exchanged_fee: Decimal,
    },
    /// Unfilled swap remainder under the dust threshold returned to its owner.
    SwapRemainderRefunded {
        seq: RequestSeq,
        pool_id: PoolId,
        offer_refunded: Decimal,
        fee_refunded: Decimal,
    },
    BatchExecuted {
        pool_id: PoolId,
        batch_index: BatchIndex,
        rounds: u32,
        last_price: Option<Decimal>,
        result_hash: String,
    },
}

impl LiquidityEvent {
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::DepositAccepted { pool_id, .. }
            | Self::WithdrawExecuted { pool_id, .. }
            | Self::RequestRefunded { pool_id, .. }
            | Self::SwapFilled { pool_id, .. }
            | Self::SwapRemainderRefunded { pool_id, .. }
            | Self::BatchExecuted { pool_id, .. } => *pool_id,
        }
    }
}
