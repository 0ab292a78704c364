//! Configuration types for the rebalance engine.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utils::MAX_DECIMALS;

use crate::error::{EngineError, Result};
use crate::thresholds::Thresholds;

pub const DEFAULT_MIN_TIME_BETWEEN_REBALANCES: u64 = 600;
pub const DEFAULT_MIN_BUDGET: u64 = 1_600_000;

/// Configuration for RebalanceEngine (parameters only; the vault is passed to `RebalanceEngine::new`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceEngineConfig {
    /// Address allowed to change thresholds, metadata and to unpause
    pub manager: Address,
    /// Address of token0 of the pool
    pub token0: Address,
    /// Address of token1 of the pool
    pub token1: Address,
    pub decimals0: u8,
    pub decimals1: u8,
    /// When set, token1 is the deposit token; otherwise token0
    #[serde(default)]
    pub allow_token1: bool,
    pub tick_spacing: i32,
    /// Cooldown between two executed repositions, in seconds
    #[serde(default = "default_min_time")]
    pub min_time_between_rebalances: u64,
    /// Tick used as the price reference before the first reposition
    #[serde(default)]
    pub initial_tick: i32,
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_min_time() -> u64 {
    DEFAULT_MIN_TIME_BETWEEN_REBALANCES
}

impl RebalanceEngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.tick_spacing <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "tick spacing must be positive, got {}",
                self.tick_spacing
            )));
        }
        check_decimals(self.decimals0, self.decimals1)
    }
}

pub(crate) fn check_decimals(decimals0: u8, decimals1: u8) -> Result<()> {
    if decimals0 > MAX_DECIMALS || decimals1 > MAX_DECIMALS {
        return Err(EngineError::InvalidConfig(format!(
            "token decimals must be <= {}, got ({}, {})",
            MAX_DECIMALS, decimals0, decimals1
        )));
    }
    Ok(())
}

/// Configuration for SafetyGovernor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Floor the remaining execution budget must exceed before an evaluation may start
    pub min_budget: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_budget: DEFAULT_MIN_BUDGET,
        }
    }
}
