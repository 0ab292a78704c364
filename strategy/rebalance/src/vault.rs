//! Vault capability consumed by the engine.

use alloy::primitives::{Address, U256};
use thiserror::Error;

use crate::types::RebalanceParams;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("vault unreachable: {0}")]
    Unreachable(String),
    #[error("vault reverted: {0}")]
    Reverted(String),
}

/// Totals held by the vault, keyed by pool token order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TotalAmounts {
    pub amount0: U256,
    pub amount1: U256,
}

/// The vault that owns the liquidity of a managed position.
///
/// Reads are expected to be cheap; `execute_rebalance` is the only mutating call and is
/// issued at most once per evaluation.
pub trait Vault {
    /// Amounts of token0 and token1 currently deployed.
    fn report_total_amounts(&self) -> Result<TotalAmounts, VaultError>;

    /// Balance of `token` held idle by the vault.
    fn idle_balance(&self, token: Address) -> Result<U256, VaultError>;

    /// Burns the current ranges and mints the ones described by `params`.
    fn execute_rebalance(&mut self, params: &RebalanceParams) -> Result<(), VaultError>;
}

impl<V: Vault + ?Sized> Vault for Box<V> {
    fn report_total_amounts(&self) -> Result<TotalAmounts, VaultError> {
        (**self).report_total_amounts()
    }

    fn idle_balance(&self, token: Address) -> Result<U256, VaultError> {
        (**self).idle_balance(token)
    }

    fn execute_rebalance(&mut self, params: &RebalanceParams) -> Result<(), VaultError> {
        (**self).execute_rebalance(params)
    }
}
