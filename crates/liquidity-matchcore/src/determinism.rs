//! Determinism verification utilities for cross-node consistency.
//!
//! Every node executing the same batch against the same pool must produce
//! the exact same pool state and transfer list. The result hash commits to
//! both and enables quick comparison without shipping full payloads.

use liquidity_types::{BatchIndex, Pool, Transfer};
use sha2::{Digest, Sha256};

/// Compute the result hash of one executed batch.
///
/// The hash depends on:
/// - Pool id and batch index
/// - Resulting reserves and pool coin supply
/// - Every transfer, in order
///
/// Amounts are normalized before hashing, so `10` and `10.00` hash alike.
#[must_use]
pub fn compute_result_hash(pool: &Pool, batch_index: BatchIndex, transfers: &[Transfer]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"liquidity:batch_result:v1:");
    hasher.update(pool.id.0.to_le_bytes());
    hasher.update(batch_index.0.to_le_bytes());
    for amount in [pool.reserve_x, pool.reserve_y, pool.pool_coin_supply] {
        let text = amount.normalize().to_string();
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hasher.update((transfers.len() as u64).to_le_bytes());
    for transfer in transfers {
        hasher.update(transfer.canonical_bytes());
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Verify that a result hash matches the recomputed one.
#[must_use]
pub fn verify_result_hash(
    pool: &Pool,
    batch_index: BatchIndex,
    transfers: &[Transfer],
    expected: &[u8; 32],
) -> bool {
    compute_result_hash(pool, batch_index, transfers) == *expected
}
