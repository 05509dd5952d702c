//! # liquidity-ingress
//!
//! **Custody and collection plane**: everything between a submitted message
//! and an executable batch.
//!
//! ## Architecture
//!
//! 1. **Bank**: the ledger API the module moves coins through
//! 2. **EscrowManager**: holds request funds between submission and settlement
//! 3. **Validator**: hard gate run before any coin moves
//! 4. **PoolRegistry**: pool creation, lookup and commit
//! 5. **BatchLifecycleManager**: one batch per pool, `Collecting -> Executable -> Settling`
//!
//! ## Request Flow
//!
//! ```text
//! Msg -> MsgServer.deliver() -> validator -> EscrowManager.lock()
//!     -> BatchLifecycleManager.push_*() -> (block end) MatchCore
//! ```
//!
//! No request enters a batch without its coins locked in escrow.

pub mod bank;
pub mod escrow;
pub mod lifecycle;
pub mod msg_server;
pub mod registry;
pub mod state;
pub mod validator;

pub use bank::{Bank, InMemoryBank};
pub use escrow::{EscrowManager, EscrowRecord};
pub use lifecycle::BatchLifecycleManager;
pub use msg_server::{MsgResponse, MsgServer};
pub use registry::PoolRegistry;
pub use state::LiquidityState;
