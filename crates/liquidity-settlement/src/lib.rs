//! # liquidity-settlement
//!
//! **Finality plane**: turns executed batches into committed state.
//!
//! ## Architecture
//!
//! At block end the executor:
//! 1. Runs MatchCore for every executable pool
//! 2. Refunds swap remainders below the dust threshold
//! 3. Checks reserve, pool coin and health invariants per pool
//! 4. Releases escrow and applies every transfer to the bank atomically
//! 5. Commits pools and reopens their batches
//!
//! [`SupplyConservation`] then checks the module against the bank, and
//! [`LiquidityModule`] wraps all of it behind the host's block hooks.

pub mod executor;
pub mod genesis;
pub mod module;
pub mod supply_conservation;

pub use executor::{execute_batches, BlockOutcome, PoolReport};
pub use genesis::{export_genesis, import_genesis};
pub use module::LiquidityModule;
pub use supply_conservation::SupplyConservation;
