//! Supply conservation invariant checker.
//!
//! Invariants enforced at every block boundary:
//! ```text
//! ∀ reserve denom: bank supply == Σ(external funding)
//! ∀ pool:          bank supply of its pool coin == pool_coin_supply
//! ∀ pool:          reserve account balances == pool reserves
//! escrow account == Σ(escrow records)
//! ```
//!
//! The module never creates or destroys reserve coins, so any drift in
//! their supply means a settlement leaked or duplicated value.

use std::collections::BTreeMap;

use liquidity_ingress::{Bank, LiquidityState};
use liquidity_types::{LiquidityError, Result};
use rust_decimal::Decimal;

/// Tracks coins that entered the system from outside the module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyConservation {
    funded: BTreeMap<String, Decimal>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record coins credited from outside the module.
    pub fn record_funding(&mut self, denom: &str, amount: Decimal) {
        *self.funded.entry(denom.to_string()).or_default() += amount;
    }

    #[must_use]
    pub fn expected_supply(&self, denom: &str) -> Decimal {
        self.funded.get(denom).copied().unwrap_or_default()
    }

    /// Verify that the bank supply of `denom` matches what was funded.
    pub fn verify(&self, denom: &str, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply(denom);
        if actual_supply != expected {
            return Err(LiquidityError::SupplyInvariantViolation {
                reason: format!("{denom}: supply {actual_supply} != funded {expected}"),
            });
        }
        Ok(())
    }

    /// Every conservation check against the module state and the bank.
    pub fn verify_all(&self, state: &LiquidityState, bank: &impl Bank) -> Result<()> {
        for denom in self.funded.keys() {
            self.verify(denom, bank.total_supply(denom))?;
        }
        for pool in state.registry.iter() {
            let supply = bank.total_supply(&pool.pool_coin_denom);
            if supply != pool.pool_coin_supply {
                return Err(LiquidityError::SupplyInvariantViolation {
                    reason: format!(
                        "{}: pool coin supply {supply} != recorded {}",
                        pool.id, pool.pool_coin_supply
                    ),
                });
            }
            for (denom, reserve) in [
                (&pool.denom_x, pool.reserve_x),
                (&pool.denom_y, pool.reserve_y),
            ] {
                let held = bank.balance(&pool.reserve_account, denom);
                if held != reserve {
                    return Err(LiquidityError::SupplyInvariantViolation {
                        reason: format!(
                            "{}: reserve account holds {held} {denom}, pool says {reserve}",
                            pool.id
                        ),
                    });
                }
            }
            if !pool.is_healthy() {
                return Err(LiquidityError::InvariantViolation {
                    reason: format!("{} has an empty reserve or supply", pool.id),
                });
            }
        }
        state.escrow.verify_against(bank)
    }

    /// Denoms with recorded funding.
    pub fn tracked_denoms(&self) -> impl Iterator<Item = &str> {
        self.funded.keys().map(String::as_str)
    }
}
