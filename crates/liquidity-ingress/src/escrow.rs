//! Escrow manager: custody of request funds between submission and
//! settlement.
//!
//! `lock` moves a requester's coins into the module escrow account and
//! records them against the request's sequence number. Nothing leaves escrow
//! except through settlement transfers tagged with that sequence number, and
//! [`EscrowManager::release`] refuses any transfer its records do not cover.

use std::collections::BTreeMap;

use liquidity_types::{
    AccountId, Coin, LiquidityError, Pool, PoolBatch, PoolId, RequestSeq, Result, Transfer,
};
use rust_decimal::Decimal;

use crate::bank::Bank;

/// Funds held for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowRecord {
    pub pool_id: PoolId,
    pub owner: AccountId,
    /// Held amount per denom.
    pub holdings: BTreeMap<String, Decimal>,
}

impl EscrowRecord {
    fn is_empty(&self) -> bool {
        self.holdings.values().all(Decimal::is_zero)
    }
}

/// Records of everything the escrow account holds, by request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscrowManager {
    records: BTreeMap<RequestSeq, EscrowRecord>,
}

impl EscrowManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `coins` from `owner` into escrow for request `seq`.
    ///
    /// Funds are checked for every coin before any moves, so a failed lock
    /// leaves the bank unchanged.
    pub fn lock(
        &mut self,
        bank: &mut impl Bank,
        seq: RequestSeq,
        pool_id: PoolId,
        owner: &AccountId,
        coins: &[Coin],
    ) -> Result<()> {
        if self.records.contains_key(&seq) {
            return Err(LiquidityError::EscrowMismatch {
                reason: format!("{seq} already holds escrow"),
            });
        }
        let mut needed: BTreeMap<&str, Decimal> = BTreeMap::new();
        for coin in coins.iter().filter(|c| !c.is_zero()) {
            *needed.entry(coin.denom.as_str()).or_default() += coin.amount;
        }
        for (denom, amount) in &needed {
            let available = bank.balance(owner, denom);
            if available < *amount {
                return Err(LiquidityError::InsufficientFunds {
                    denom: (*denom).to_string(),
                    needed: *amount,
                    available,
                });
            }
        }

        let transfers: Vec<Transfer> = needed
            .iter()
            .map(|(denom, amount)| {
                Transfer::send(
                    owner.clone(),
                    AccountId::escrow(),
                    Coin::new(*denom, *amount),
                    Some(seq),
                )
            })
            .collect();
        bank.apply_transfers(&transfers)?;

        self.records.insert(
            seq,
            EscrowRecord {
                pool_id,
                owner: owner.clone(),
                holdings: needed
                    .into_iter()
                    .map(|(denom, amount)| (denom.to_string(), amount))
                    .collect(),
            },
        );
        tracing::debug!(seq = %seq, pool = %pool_id, owner = %owner, "Escrow locked");
        Ok(())
    }

    /// Debit records for every transfer that leaves the escrow account.
    ///
    /// Checked in full before any record changes.
    pub fn release(&mut self, transfers: &[Transfer]) -> Result<()> {
        let escrow = AccountId::escrow();
        let mut debits: BTreeMap<(RequestSeq, &str), Decimal> = BTreeMap::new();
        for transfer in transfers.iter().filter(|t| t.source() == Some(&escrow)) {
            let seq = transfer.request().ok_or_else(|| LiquidityError::EscrowMismatch {
                reason: "untagged transfer out of escrow".into(),
            })?;
            *debits
                .entry((seq, transfer.coin().denom.as_str()))
                .or_default() += transfer.coin().amount;
        }
        for ((seq, denom), amount) in &debits {
            let held = self
                .records
                .get(seq)
                .and_then(|r| r.holdings.get(*denom))
                .copied()
                .unwrap_or_default();
            if held < *amount {
                return Err(LiquidityError::EscrowMismatch {
                    reason: format!("{seq} holds {held} {denom}, release of {amount}"),
                });
            }
        }
        for ((seq, denom), amount) in debits {
            if let Some(record) = self.records.get_mut(&seq) {
                if let Some(held) = record.holdings.get_mut(denom) {
                    *held -= amount;
                }
                if record.is_empty() {
                    self.records.remove(&seq);
                }
            }
        }
        Ok(())
    }

    /// Rebuild records from the pending requests of every batch.
    pub fn from_batches<'a>(
        batches: impl IntoIterator<Item = (&'a Pool, &'a PoolBatch)>,
    ) -> Result<Self> {
        let mut escrow = Self::new();
        for (pool, batch) in batches {
            for d in batch.deposits.iter().filter(|d| !d.status.executed) {
                escrow.insert(
                    d.seq,
                    pool.id,
                    &d.depositor,
                    &[
                        Coin::new(pool.denom_x.clone(), d.deposit_x),
                        Coin::new(pool.denom_y.clone(), d.deposit_y),
                    ],
                )?;
            }
            for w in batch.withdrawals.iter().filter(|w| !w.status.executed) {
                escrow.insert(
                    w.seq,
                    pool.id,
                    &w.withdrawer,
                    &[Coin::new(pool.pool_coin_denom.clone(), w.pool_coin_amount)],
                )?;
            }
            for s in batch.swaps.iter().filter(|s| !s.status.executed) {
                escrow.insert(
                    s.seq,
                    pool.id,
                    &s.requester,
                    &[Coin::new(s.offer_denom.clone(), s.escrowed())],
                )?;
            }
        }
        Ok(escrow)
    }

    fn insert(&mut self, seq: RequestSeq, pool_id: PoolId, owner: &AccountId, coins: &[Coin]) -> Result<()> {
        let mut holdings = BTreeMap::new();
        for coin in coins.iter().filter(|c| !c.is_zero()) {
            *holdings.entry(coin.denom.clone()).or_default() += coin.amount;
        }
        if holdings.is_empty() {
            return Ok(());
        }
        let record = EscrowRecord {
            pool_id,
            owner: owner.clone(),
            holdings,
        };
        if self.records.insert(seq, record).is_some() {
            return Err(LiquidityError::EscrowMismatch {
                reason: format!("{seq} appears twice"),
            });
        }
        Ok(())
    }

    /// Check that the records add up to the escrow account's balances.
    pub fn verify_against(&self, bank: &impl Bank) -> Result<()> {
        let mut expected: BTreeMap<&str, Decimal> = BTreeMap::new();
        for record in self.records.values() {
            for (denom, amount) in &record.holdings {
                *expected.entry(denom.as_str()).or_default() += *amount;
            }
        }
        let actual = bank.balances(&AccountId::escrow());
        for coin in &actual {
            let recorded = expected.remove(coin.denom.as_str()).unwrap_or_default();
            if recorded != coin.amount {
                return Err(LiquidityError::EscrowMismatch {
                    reason: format!(
                        "escrow holds {} {} but records say {recorded}",
                        coin.amount, coin.denom
                    ),
                });
            }
        }
        if let Some((denom, amount)) = expected.into_iter().find(|(_, a)| !a.is_zero()) {
            return Err(LiquidityError::EscrowMismatch {
                reason: format!("records claim {amount} {denom} absent from escrow"),
            });
        }
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn get(&self, seq: RequestSeq) -> Option<&EscrowRecord> {
        self.records.get(&seq)
    }

    #[must_use]
    pub fn held(&self, seq: RequestSeq, denom: &str) -> Decimal {
        self.records
            .get(&seq)
            .and_then(|r| r.holdings.get(denom))
            .copied()
            .unwrap_or_default()
    }

    /// Total held across all records in `denom`.
    #[must_use]
    pub fn total_locked(&self, denom: &str) -> Decimal {
        self.records
            .values()
            .filter_map(|r| r.holdings.get(denom))
            .copied()
            .sum()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }
}
