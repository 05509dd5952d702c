//! Ledger API used by the liquidity module.
//!
//! The module never owns coins itself. It moves them through a [`Bank`]:
//! user funds into escrow on submission, escrow into pool reserves and
//! reserves back to users on settlement. [`InMemoryBank`] is the reference
//! implementation used by hosts without a ledger of their own and by tests.

use std::collections::BTreeMap;

use liquidity_types::{AccountId, Coin, LiquidityError, Result, Transfer};
use rust_decimal::Decimal;

/// Coin primitives the module relies on.
pub trait Bank {
    /// Spendable balance of `account` in `denom`.
    fn balance(&self, account: &AccountId, denom: &str) -> Decimal;

    /// Every non-zero balance of `account`, ordered by denom.
    fn balances(&self, account: &AccountId) -> Vec<Coin>;

    /// Sum of all balances in `denom`.
    fn total_supply(&self, denom: &str) -> Decimal;

    fn send(&mut self, from: &AccountId, to: &AccountId, coin: &Coin) -> Result<()>;

    fn mint(&mut self, to: &AccountId, coin: &Coin) -> Result<()>;

    fn burn(&mut self, from: &AccountId, coin: &Coin) -> Result<()>;

    /// Apply every transfer or none of them.
    ///
    /// Balances are validated on the net effect of the whole list, so a
    /// reserve may pay out in one transfer what it receives in a later one.
    fn apply_transfers(&mut self, transfers: &[Transfer]) -> Result<()>;
}

/// Bank backed by an ordered map of `(account, denom)` balances.
///
/// All mutations are atomic: either the full operation succeeds or the
/// balances are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryBank {
    balances: BTreeMap<(AccountId, String), Decimal>,
}

impl InMemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit coins from outside the module, e.g. genesis allocations.
    pub fn fund(&mut self, account: &AccountId, coin: &Coin) -> Result<()> {
        self.mint(account, coin)
    }

    fn credit(&mut self, account: &AccountId, denom: &str, amount: Decimal) {
        *self
            .balances
            .entry((account.clone(), denom.to_string()))
            .or_default() += amount;
    }

    fn debit(&mut self, account: &AccountId, denom: &str, amount: Decimal) -> Result<()> {
        let available = self.balance(account, denom);
        if available < amount {
            return Err(LiquidityError::InsufficientFunds {
                denom: denom.to_string(),
                needed: amount,
                available,
            });
        }
        let key = (account.clone(), denom.to_string());
        if available == amount {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, available - amount);
        }
        Ok(())
    }
}

fn ensure_positive(coin: &Coin) -> Result<()> {
    if coin.amount <= Decimal::ZERO {
        return Err(LiquidityError::InvalidAmount(coin.amount));
    }
    Ok(())
}

impl Bank for InMemoryBank {
    fn balance(&self, account: &AccountId, denom: &str) -> Decimal {
        self.balances
            .get(&(account.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn balances(&self, account: &AccountId) -> Vec<Coin> {
        self.balances
            .iter()
            .filter(|((owner, _), _)| owner == account)
            .map(|((_, denom), amount)| Coin::new(denom.clone(), *amount))
            .collect()
    }

    fn total_supply(&self, denom: &str) -> Decimal {
        self.balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .map(|(_, amount)| *amount)
            .sum()
    }

    fn send(&mut self, from: &AccountId, to: &AccountId, coin: &Coin) -> Result<()> {
        ensure_positive(coin)?;
        self.debit(from, &coin.denom, coin.amount)?;
        self.credit(to, &coin.denom, coin.amount);
        Ok(())
    }

    fn mint(&mut self, to: &AccountId, coin: &Coin) -> Result<()> {
        ensure_positive(coin)?;
        self.credit(to, &coin.denom, coin.amount);
        Ok(())
    }

    fn burn(&mut self, from: &AccountId, coin: &Coin) -> Result<()> {
        ensure_positive(coin)?;
        self.debit(from, &coin.denom, coin.amount)
    }

    fn apply_transfers(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut deltas: BTreeMap<(AccountId, String), Decimal> = BTreeMap::new();
        for transfer in transfers {
            let coin = transfer.coin();
            ensure_positive(coin)?;
            if let Some(from) = transfer.source() {
                *deltas
                    .entry((from.clone(), coin.denom.clone()))
                    .or_default() -= coin.amount;
            }
            if let Some(to) = transfer.destination() {
                *deltas.entry((to.clone(), coin.denom.clone())).or_default() += coin.amount;
            }
        }
        for ((account, denom), delta) in &deltas {
            let available = self.balance(account, denom);
            if available + *delta < Decimal::ZERO {
                return Err(LiquidityError::InsufficientFunds {
                    denom: denom.clone(),
                    needed: -*delta,
                    available,
                });
            }
        }
        for ((account, denom), delta) in deltas {
            if delta > Decimal::ZERO {
                self.credit(&account, &denom, delta);
            } else if delta < Decimal::ZERO {
                self.debit(&account, &denom, -delta)?;
            }
        }
        Ok(())
    }
}
