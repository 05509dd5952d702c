//! System-wide constants for the liquidity engine.

use rust_decimal::Decimal;

/// Default minimum amount of each reserve coin needed to found a pool.
pub const DEFAULT_MIN_INIT_DEPOSIT_AMOUNT: u64 = 1_000_000;

/// Default number of pool coins minted to a pool creator.
pub const DEFAULT_INIT_POOL_COIN_MINT_AMOUNT: u64 = 1_000_000;

/// Default per-pool reserve cap (0 = unlimited).
pub const DEFAULT_MAX_RESERVE_COIN_AMOUNT: u64 = 0;

/// Default swap fee rate, in thousandths (0.003).
pub const DEFAULT_SWAP_FEE_RATE_MILLIS: i64 = 3;

/// Default withdraw fee rate, in thousandths (0.0).
pub const DEFAULT_WITHDRAW_FEE_RATE_MILLIS: i64 = 0;

/// Default cap on the pool's per-batch exposure, in hundredths (0.1).
pub const DEFAULT_MAX_ORDER_AMOUNT_RATIO_CENTS: i64 = 10;

/// Default number of blocks per batch window.
pub const DEFAULT_UNIT_BATCH_HEIGHT: u64 = 1;

/// Maximum clearing rounds per pool per block.
pub const MAX_MATCHING_ROUNDS: u32 = 8;

/// Divisor applied to `reserve × max_order_amount_ratio` to obtain the
/// dust threshold for swap remainders.
pub const DUST_RATIO_DIVISOR: u64 = 10_000;

/// Maximum relative deviation between an accepted deposit's ratio and the
/// pool's reserve ratio, in basis points (1%).
pub const MAX_DEPOSIT_RATIO_DEVIATION_BPS: i64 = 100;

/// Largest coin amount accepted in a submitted request (10^24).
pub const MAX_COIN_AMOUNT: Decimal = Decimal::from_parts(2_701_131_776, 466_537_709, 54_210, false, 0);

/// Submitted limit prices must lie within `[p / k, p * k]` of the pool
/// price `p`.
pub const MAX_ORDER_PRICE_DEVIATION: Decimal = Decimal::TEN;

/// Prefix of every pool coin denom.
pub const POOL_COIN_DENOM_PREFIX: &str = "pool";

/// Module account that holds escrowed request funds.
pub const ESCROW_ACCOUNT: &str = "liquidity/batch-escrow";

/// Prefix of per-pool reserve accounts.
pub const POOL_RESERVE_ACCOUNT_PREFIX: &str = "liquidity/pool-reserve/";
