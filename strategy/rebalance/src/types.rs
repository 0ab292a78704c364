//! Shared types for the rebalancing strategy.

use serde::{Deserialize, Serialize};

use crate::inventory::InventoryComposition;
use crate::thresholds::Thresholds;
use crate::vault::VaultError;
use crate::volatility::Volatility;

/// Inventory regime held by the engine between evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    OverInventory,
    Normal,
    UnderInventory,
    /// Defensive regime entered on extreme volatility
    Special,
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecideStatus {
    Normal,
    Special,
    NoNeed,
    TooSoon,
    NoNeedWithPending,
    ExtremeVolatility,
}

/// Why an evaluation exited without reaching the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Paused,
    VaultUnset,
    VaultUnreachable,
    ExtremeTick,
    /// A target range would be narrower than the placement minimum
    NarrowRange,
}

/// Inclusive-lower, exclusive-upper tick range aligned to the pool's tick spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }
}

/// What the vault is asked to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceParams {
    /// Regime the position is moved into
    pub target: State,
    pub current_tick: i32,
    pub base: TickRange,
    pub limit: TickRange,
    /// Deposit share beyond `simulate` on either side
    pub extreme_skew: bool,
}

/// Side effect of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Skipped(SkipReason),
    Rebalanced(RebalanceParams),
    /// The vault rejected the reposition and the circuit breaker latched
    Failed {
        params: RebalanceParams,
        error: VaultError,
    },
}

/// Result of one evaluation: the status, the regime afterwards and what was done.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub status: DecideStatus,
    pub state: State,
    pub action: Action,
}

impl Evaluation {
    pub(crate) fn decided(status: DecideStatus, state: State) -> Self {
        Self {
            status,
            state,
            action: Action::None,
        }
    }

    pub(crate) fn skipped(reason: SkipReason, state: State) -> Self {
        Self {
            status: DecideStatus::NoNeed,
            state,
            action: Action::Skipped(reason),
        }
    }

    pub fn is_rebalance(&self) -> bool {
        matches!(self.action, Action::Rebalanced(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.action, Action::Failed { .. })
    }
}

/// Price-moving notification delivered by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub tick: i32,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

/// Inputs of a single decision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecideInput {
    pub current_tick: i32,
    /// Unix timestamp in seconds; elapsed time is measured from the last reposition
    pub timestamp: u64,
    pub inventory: InventoryComposition,
    pub volatility: Volatility,
}

/// Engine state captured for operators
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub state: State,
    pub paused: bool,
    /// Failure that latched the circuit breaker, if any
    pub pause_reason: Option<String>,
    pub last_rebalance_timestamp: u64,
    pub last_rebalance_tick: i32,
    pub min_time_between_rebalances: u64,
    pub thresholds: Thresholds,
    pub last_status: Option<DecideStatus>,
}

impl EngineSnapshot {
    /// Plain-text rendering for chat alerts.
    pub fn to_message(&self, label: &str) -> String {
        let mut lines = vec![
            format!("[{}] state: {:?}", label, self.state),
            format!(
                "paused: {}{}",
                self.paused,
                self.pause_reason
                    .as_deref()
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default()
            ),
            format!(
                "last rebalance: t={} tick={}",
                self.last_rebalance_timestamp, self.last_rebalance_tick
            ),
        ];
        if let Some(status) = self.last_status {
            lines.push(format!("last decision: {:?}", status));
        }
        lines.join("\n")
    }
}
