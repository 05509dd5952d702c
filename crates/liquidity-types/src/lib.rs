//! # liquidity-types
//!
//! Shared types, errors, and configuration for the batch-execution
//! liquidity pool engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PoolId`], [`RequestSeq`], [`AccountId`], [`BatchIndex`]
//! - **Coins**: [`Coin`], [`pool_coin_denom`] derivation
//! - **Pool model**: [`Pool`], [`validate_denom_pair`]
//! - **Request model**: [`DepositRequest`], [`WithdrawRequest`], [`SwapRequest`], [`SwapDirection`]
//! - **Batch model**: [`PoolBatch`], [`BatchPhase`]
//! - **Messages**: [`Msg`], the sum type over the four request kinds
//! - **Settlement**: [`Transfer`], [`LiquidityEvent`]
//! - **Configuration**: [`Params`]
//! - **Snapshot**: [`GenesisState`], [`PoolRecord`]
//! - **Errors**: [`LiquidityError`] with `LQ_ERR_` prefix codes
//! - **Constants**: engine limits and parameter defaults

pub mod batch;
pub mod coin;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod genesis;
pub mod ids;
pub mod msg;
pub mod pool;
pub mod request;
pub mod transfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use liquidity_types::{Pool, PoolBatch, SwapRequest, Params, ...};

pub use batch::*;
pub use coin::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use genesis::*;
pub use ids::*;
pub use msg::*;
pub use pool::*;
pub use request::*;
pub use transfer::*;

// Constants are accessed via `liquidity_types::constants::FOO`
// (not re-exported to avoid name collisions).
