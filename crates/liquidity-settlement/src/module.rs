//! Host adapter.
//!
//! [`LiquidityModule`] is the thin layer a host drives: `on_block_begin`
//! promotes batches, `deliver` takes messages during the block and
//! `on_block_end` executes and settles. Params are handed in on every call.

use liquidity_ingress::{Bank, InMemoryBank, LiquidityState, MsgResponse, MsgServer};
use liquidity_types::{AccountId, Coin, GenesisState, Msg, Params, PoolId, Result};

use crate::executor::{execute_batches, BlockOutcome};
use crate::genesis::{export_genesis, import_genesis};
use crate::supply_conservation::SupplyConservation;

/// The liquidity module bound to a bank.
#[derive(Debug, Clone)]
pub struct LiquidityModule<B: Bank = InMemoryBank> {
    state: LiquidityState,
    bank: B,
    supply: SupplyConservation,
}

impl Default for LiquidityModule<InMemoryBank> {
    fn default() -> Self {
        Self::new(InMemoryBank::new())
    }
}

impl<B: Bank> LiquidityModule<B> {
    /// A module with no pools over an existing bank.
    pub fn new(bank: B) -> Self {
        Self {
            state: LiquidityState::new(),
            bank,
            supply: SupplyConservation::new(),
        }
    }

    /// Restore from a snapshot. `denoms` are the reserve denoms whose
    /// current bank supply becomes the conservation baseline.
    pub fn from_genesis<'a>(
        genesis: &GenesisState,
        bank: B,
        denoms: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let state = import_genesis(genesis, &bank)?;
        let mut supply = SupplyConservation::new();
        for denom in denoms {
            supply.record_funding(denom, bank.total_supply(denom));
        }
        Ok(Self {
            state,
            bank,
            supply,
        })
    }

    /// Credit coins from outside the module.
    pub fn fund(&mut self, account: &AccountId, coin: &Coin) -> Result<()> {
        self.bank.mint(account, coin)?;
        self.supply.record_funding(&coin.denom, coin.amount);
        Ok(())
    }

    // =================================================================
    // Block hooks
    // =================================================================

    /// Begin-block hook. Returns the pools whose batch executes this block.
    pub fn on_block_begin(&mut self, height: u64, params: &Params) -> Result<Vec<PoolId>> {
        params.validate()?;
        Ok(self.state.lifecycle.advance_batches(height, params))
    }

    pub fn deliver(&mut self, msg: Msg, params: &Params, height: u64) -> Result<MsgResponse> {
        MsgServer::new(&mut self.state, &mut self.bank).deliver(msg, params, height)
    }

    /// Every conservation invariant at the current state.
    pub fn check_invariants(&self) -> Result<()> {
        self.supply.verify_all(&self.state, &self.bank)
    }

    // =================================================================
    // Genesis and queries
    // =================================================================

    pub fn export_genesis(&self, params: &Params) -> Result<GenesisState> {
        export_genesis(&self.state, params)
    }

    pub fn state(&self) -> &LiquidityState {
        &self.state
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    pub fn into_bank(self) -> B {
        self.bank
    }
}

impl<B: Bank + Clone> LiquidityModule<B> {
    /// End-block hook: execute and settle on copies of the state and bank,
    /// check conservation on the copies, then commit them. On any error the
    /// module is left as it was.
    pub fn on_block_end(&mut self, height: u64, params: &Params) -> Result<BlockOutcome> {
        params.validate()?;
        let mut state = self.state.clone();
        let mut bank = self.bank.clone();
        let outcome = execute_batches(&mut state, &mut bank, height, params)?;
        if let Err(err) = self.supply.verify_all(&state, &bank) {
            tracing::error!(height, error = %err, "Conservation check failed, block discarded");
            return Err(err);
        }
        self.state = state;
        self.bank = bank;
        Ok(outcome)
    }
}
