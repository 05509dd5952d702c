//! # liquidity-matchcore
//!
//! **Pure deterministic batch execution for liquidity pools.**
//!
//! MatchCore is the compute plane: it takes a pool and its executable batch
//! and produces the new pool state plus the transfers that settle every
//! request. It has:
//!
//! - **Zero side effects**: no bank access, no escrow bookkeeping
//! - **Deterministic output**: same input -> same output on every node
//! - **Integer settlement**: every amount it emits is a whole number
//! - **Bounded work**: at most a fixed number of matching rounds per batch

pub mod clearing;
pub mod determinism;
pub mod engine;
pub mod matcher;
pub mod orderbook;
pub mod pool_math;
pub mod price_level;

pub use clearing::{ClearingResult, PoolCurve, compute_clearing_price};
pub use determinism::{compute_result_hash, verify_result_hash};
pub use engine::{BatchResult, execute_batch};
pub use matcher::{SwapOutcome, match_swaps};
pub use orderbook::SwapBook;
pub use pool_math::{
    DepositOutcome, WithdrawOutcome, compute_deposit, compute_withdrawal, dust_threshold,
    half_fee, max_order_amount, mul_div_ceil, mul_div_floor, order_price_in_range,
};
pub use price_level::PriceLevel;
