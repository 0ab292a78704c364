//! Replay inputs: managed positions and the recorded notification stream.

use std::path::Path;

use anyhow::{Context, Result};
use rebalance::{GovernorConfig, RebalanceEngineConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::paper::PaperBalances;

const DEFAULT_BUDGET: u64 = 2_000_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub governor: GovernorConfig,
    pub positions: Vec<PositionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionConfig {
    pub label: String,
    pub engine: RebalanceEngineConfig,
    pub vault: PaperBalances,
}

/// One recorded price-moving notification, plus the vault changes observed before it.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioEvent {
    pub position: String,
    pub tick: i32,
    pub timestamp: u64,
    /// Execution budget left when the notification fired
    #[serde(default = "default_budget")]
    pub budget: u64,
    #[serde(default)]
    pub balances: Option<PaperBalances>,
    /// Switches the vault into (or out of) reverting every rebalance
    #[serde(default)]
    pub revert: Option<bool>,
    /// Operator clears the circuit breaker before this notification
    #[serde(default)]
    pub unpause: bool,
}

fn default_budget() -> u64 {
    DEFAULT_BUDGET
}

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Events of one position, in recorded order.
pub fn events_for(events: &[ScenarioEvent], label: &str) -> Vec<ScenarioEvent> {
    events.iter().filter(|e| e.position == label).cloned().collect()
}
