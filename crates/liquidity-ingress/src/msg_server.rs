//! Request dispatch.
//!
//! [`MsgServer::deliver`] routes each [`Msg`] to its handler. Submission
//! handlers validate, escrow the requester's coins and append the request to
//! the pool's batch. Sequence numbers are only consumed by accepted requests.

use liquidity_types::{
    DepositRequest, LiquidityEvent, Msg, MsgCreatePool, MsgDepositWithinBatch,
    MsgSwapWithinBatch, MsgWithdrawWithinBatch, Params, PoolId, RequestSeq, RequestStatus,
    Result, SwapRequest, WithdrawRequest,
};
use rust_decimal::Decimal;

use crate::bank::Bank;
use crate::state::LiquidityState;
use crate::validator;

/// What an accepted message produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgResponse {
    PoolCreated {
        pool_id: PoolId,
        event: LiquidityEvent,
    },
    /// The request joined its pool's batch under `seq`.
    Queued { pool_id: PoolId, seq: RequestSeq },
}

/// Message handler over the module state and the bank.
pub struct MsgServer<'a, B: Bank> {
    state: &'a mut LiquidityState,
    bank: &'a mut B,
}

impl<'a, B: Bank> MsgServer<'a, B> {
    pub fn new(state: &'a mut LiquidityState, bank: &'a mut B) -> Self {
        Self { state, bank }
    }

    /// Handle one message submitted at `height`. Invalid params reject
    /// every message.
    pub fn deliver(&mut self, msg: Msg, params: &Params, height: u64) -> Result<MsgResponse> {
        params.validate()?;
        match msg {
            Msg::CreatePool(m) => self.create_pool(&m, params, height),
            Msg::DepositWithinBatch(m) => self.deposit(m, height),
            Msg::WithdrawWithinBatch(m) => self.withdraw(m, height),
            Msg::SwapWithinBatch(m) => self.swap(m, params, height),
        }
    }

    fn create_pool(
        &mut self,
        msg: &MsgCreatePool,
        params: &Params,
        height: u64,
    ) -> Result<MsgResponse> {
        let (pool, event) = self.state.registry.create_pool(&mut *self.bank, msg, params)?;
        self.state.lifecycle.open_batch(pool.id, height)?;
        Ok(MsgResponse::PoolCreated {
            pool_id: pool.id,
            event,
        })
    }

    fn deposit(&mut self, msg: MsgDepositWithinBatch, height: u64) -> Result<MsgResponse> {
        let pool = self.state.registry.get(msg.pool_id)?;
        validator::validate_deposit(pool, &msg)?;
        self.state.lifecycle.ensure_accepting(msg.pool_id)?;

        let seq = self.state.next_request_seq;
        self.state.escrow.lock(
            &mut *self.bank,
            seq,
            msg.pool_id,
            &msg.depositor,
            &[msg.deposit_x.clone(), msg.deposit_y.clone()],
        )?;
        self.state.lifecycle.push_deposit(DepositRequest {
            seq,
            depositor: msg.depositor,
            pool_id: msg.pool_id,
            height,
            deposit_x: msg.deposit_x.amount,
            deposit_y: msg.deposit_y.amount,
            status: RequestStatus::default(),
        })?;
        Ok(self.queued(msg.pool_id, "deposit"))
    }

    fn withdraw(&mut self, msg: MsgWithdrawWithinBatch, height: u64) -> Result<MsgResponse> {
        let pool = self.state.registry.get(msg.pool_id)?;
        validator::validate_withdrawal(pool, &msg)?;
        self.state.lifecycle.ensure_accepting(msg.pool_id)?;

        let seq = self.state.next_request_seq;
        self.state.escrow.lock(
            &mut *self.bank,
            seq,
            msg.pool_id,
            &msg.withdrawer,
            std::slice::from_ref(&msg.pool_coin),
        )?;
        self.state.lifecycle.push_withdrawal(WithdrawRequest {
            seq,
            withdrawer: msg.withdrawer,
            pool_id: msg.pool_id,
            height,
            pool_coin_amount: msg.pool_coin.amount,
            status: RequestStatus::default(),
        })?;
        Ok(self.queued(msg.pool_id, "withdrawal"))
    }

    fn swap(&mut self, msg: MsgSwapWithinBatch, params: &Params, height: u64) -> Result<MsgResponse> {
        let pool = self.state.registry.get(msg.pool_id)?;
        validator::validate_swap(pool, &msg, params)?;
        self.state.lifecycle.ensure_accepting(msg.pool_id)?;

        let seq = self.state.next_request_seq;
        self.state.escrow.lock(
            &mut *self.bank,
            seq,
            msg.pool_id,
            &msg.requester,
            &validator::swap_escrow(&msg),
        )?;
        self.state.lifecycle.push_swap(SwapRequest {
            seq,
            requester: msg.requester,
            pool_id: msg.pool_id,
            height,
            direction: msg.direction,
            offer_denom: msg.offer_coin.denom,
            demand_denom: msg.demand_coin_denom,
            offer_amount: msg.offer_coin.amount,
            remaining_offer: msg.offer_coin.amount,
            offer_coin_fee: msg.offer_coin_fee.amount,
            remaining_offer_fee: msg.offer_coin_fee.amount,
            order_price: msg.order_price,
            received_amount: Decimal::ZERO,
            exchanged_fee_paid: Decimal::ZERO,
            status: RequestStatus::default(),
        })?;
        Ok(self.queued(msg.pool_id, "swap"))
    }

    fn queued(&mut self, pool_id: PoolId, kind: &'static str) -> MsgResponse {
        let seq = self.state.take_seq();
        tracing::debug!(seq = %seq, pool = %pool_id, kind, "Request queued");
        MsgResponse::Queued { pool_id, seq }
    }
}
