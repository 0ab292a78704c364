//! In-memory vault the replay runs positions against.

use alloy::primitives::{Address, U256};
use rebalance::{RebalanceParams, TotalAmounts, Vault, VaultError};
use serde::Deserialize;

/// Balances of a paper vault, in raw token units.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaperBalances {
    pub amount0: u128,
    pub amount1: u128,
    #[serde(default)]
    pub idle0: u128,
    #[serde(default)]
    pub idle1: u128,
}

pub struct PaperVault {
    token0: Address,
    balances: PaperBalances,
    reverting: bool,
    rebalances: Vec<RebalanceParams>,
}

impl PaperVault {
    pub fn new(token0: Address, balances: PaperBalances) -> Self {
        Self {
            token0,
            balances,
            reverting: false,
            rebalances: Vec::new(),
        }
    }

    pub fn set_balances(&mut self, balances: PaperBalances) {
        self.balances = balances;
    }

    /// Makes every following rebalance revert until cleared.
    pub fn set_reverting(&mut self, reverting: bool) {
        self.reverting = reverting;
    }

    pub fn rebalances(&self) -> &[RebalanceParams] {
        &self.rebalances
    }
}

impl Vault for PaperVault {
    fn report_total_amounts(&self) -> Result<TotalAmounts, VaultError> {
        Ok(TotalAmounts {
            amount0: U256::from(self.balances.amount0),
            amount1: U256::from(self.balances.amount1),
        })
    }

    fn idle_balance(&self, token: Address) -> Result<U256, VaultError> {
        let idle = if token == self.token0 {
            self.balances.idle0
        } else {
            self.balances.idle1
        };
        Ok(U256::from(idle))
    }

    fn execute_rebalance(&mut self, params: &RebalanceParams) -> Result<(), VaultError> {
        if self.reverting {
            return Err(VaultError::Reverted("paper vault set to revert".to_string()));
        }
        self.rebalances.push(*params);
        Ok(())
    }
}
