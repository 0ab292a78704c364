#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use alloy::primitives::{Address, U256};
use rebalance::{
    GovernorConfig, RebalanceEngine, RebalanceEngineConfig, RebalanceParams, SafetyGovernor,
    Thresholds, TotalAmounts, Vault, VaultError,
};

pub const MANAGER: Address = Address::new([0x11; 20]);
pub const TOKEN0: Address = Address::new([0xa0; 20]);
pub const TOKEN1: Address = Address::new([0xa1; 20]);
pub const COOLDOWN: u64 = 3_600;
pub const BUDGET: u64 = 2_000_000;

/// Balances and behaviour of the scripted vault, shared with the test body.
#[derive(Debug, Default)]
pub struct Book {
    pub amount0: u128,
    pub amount1: u128,
    pub idle0: u128,
    pub idle1: u128,
    pub revert_on_rebalance: bool,
    pub unreachable: bool,
    pub rebalances: Vec<RebalanceParams>,
}

#[derive(Clone, Default)]
pub struct ScriptedVault {
    pub book: Rc<RefCell<Book>>,
}

impl ScriptedVault {
    pub fn set_totals(&self, amount0: u128, amount1: u128) {
        let mut book = self.book.borrow_mut();
        book.amount0 = amount0;
        book.amount1 = amount1;
    }

    pub fn set_idle(&self, token: Address, balance: u128) {
        let mut book = self.book.borrow_mut();
        if token == TOKEN0 {
            book.idle0 = balance;
        } else {
            book.idle1 = balance;
        }
    }

    pub fn rebalance_count(&self) -> usize {
        self.book.borrow().rebalances.len()
    }
}

impl Vault for ScriptedVault {
    fn report_total_amounts(&self) -> Result<TotalAmounts, VaultError> {
        let book = self.book.borrow();
        if book.unreachable {
            return Err(VaultError::Unreachable("rpc down".into()));
        }
        Ok(TotalAmounts {
            amount0: U256::from(book.amount0),
            amount1: U256::from(book.amount1),
        })
    }

    fn idle_balance(&self, token: Address) -> Result<U256, VaultError> {
        let book = self.book.borrow();
        let balance = if token == TOKEN0 { book.idle0 } else { book.idle1 };
        Ok(U256::from(balance))
    }

    fn execute_rebalance(&mut self, params: &RebalanceParams) -> Result<(), VaultError> {
        let mut book = self.book.borrow_mut();
        if book.revert_on_rebalance {
            return Err(VaultError::Reverted("mock vault revert".into()));
        }
        book.rebalances.push(*params);
        Ok(())
    }
}

pub fn engine_config(allow_token1: bool) -> RebalanceEngineConfig {
    RebalanceEngineConfig {
        manager: MANAGER,
        token0: TOKEN0,
        token1: TOKEN1,
        decimals0: 18,
        decimals1: 18,
        allow_token1,
        tick_spacing: 60,
        min_time_between_rebalances: COOLDOWN,
        initial_tick: 0,
        thresholds: Thresholds::default(),
    }
}

/// Governor over a fresh engine plus a handle on its vault.
pub fn governed(allow_token1: bool) -> (SafetyGovernor<ScriptedVault>, ScriptedVault) {
    let vault = ScriptedVault::default();
    let engine = RebalanceEngine::new(engine_config(allow_token1), Some(vault.clone()))
        .expect("valid config");
    (SafetyGovernor::new(engine, GovernorConfig::default()), vault)
}

/// Sets totals as (deposit, paired) regardless of which pool side holds the deposit token.
pub fn set_inventory(vault: &ScriptedVault, allow_token1: bool, deposit: u128, paired: u128, idle: u128) {
    if allow_token1 {
        vault.set_totals(paired, deposit);
        vault.set_idle(TOKEN1, idle);
    } else {
        vault.set_totals(deposit, paired);
        vault.set_idle(TOKEN0, idle);
    }
}
