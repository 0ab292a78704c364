//! Safety governor
//!
//! Guards engine invocation from a price-change notification: the remaining execution
//! budget must exceed a floor and notifications must arrive in timestamp order. Both checks
//! run before the engine is touched, so a rejected notification leaves no partial state.
//! The pause latch itself lives in [`CircuitBreaker`], owned by the engine.

use tracing::{error, warn};

use crate::config::GovernorConfig;
use crate::engine::RebalanceEngine;
use crate::error::{EngineError, Result};
use crate::types::{Action, Evaluation, PriceUpdate};
use crate::vault::Vault;

/// Record of the failure that opened the breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    /// Timestamp of the evaluation that failed
    pub at: u64,
    pub reason: String,
}

/// Latched pause flag. Once open it stays open until explicitly reset.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    trip: Option<Trip>,
}

impl CircuitBreaker {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.trip.is_some()
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    /// Opens the breaker. A breaker that is already open keeps its first trip.
    pub fn latch(&mut self, at: u64, reason: String) {
        if self.trip.is_none() {
            self.trip = Some(Trip { at, reason });
        }
    }

    /// Closes the breaker, returning the trip it held; `None` if it was not open.
    pub fn reset(&mut self) -> Option<Trip> {
        self.trip.take()
    }
}

/// Wraps the engine of one managed position.
pub struct SafetyGovernor<V> {
    engine: RebalanceEngine<V>,
    config: GovernorConfig,
    last_notification: Option<u64>,
}

impl<V: Vault> SafetyGovernor<V> {
    pub fn new(engine: RebalanceEngine<V>, config: GovernorConfig) -> Self {
        Self {
            engine,
            config,
            last_notification: None,
        }
    }

    pub fn engine(&self) -> &RebalanceEngine<V> {
        &self.engine
    }

    /// Administrative access; setters must not run while an evaluation is in flight,
    /// which `&mut self` already rules out.
    pub fn engine_mut(&mut self) -> &mut RebalanceEngine<V> {
        &mut self.engine
    }

    pub fn into_engine(self) -> RebalanceEngine<V> {
        self.engine
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Handles a price-moving notification.
    ///
    /// # Arguments
    /// * `update` - Current tick and notification timestamp
    /// * `remaining_budget` - Execution budget left to the enclosing operation
    ///
    /// # Returns
    /// The evaluation, including a failed reposition (which pauses the engine but does not
    /// abort the caller); `Err` when the budget does not exceed the floor or the notification is
    /// out of order, in which case nothing was evaluated.
    pub fn on_price_change(&mut self, update: PriceUpdate, remaining_budget: u64) -> Result<Evaluation> {
        if remaining_budget <= self.config.min_budget {
            error!(remaining_budget, required = self.config.min_budget, "not enough execution budget left");
            return Err(EngineError::InsufficientBudget {
                remaining: remaining_budget,
                required: self.config.min_budget,
            });
        }
        if let Some(last) = self.last_notification {
            if update.timestamp < last {
                return Err(EngineError::OutOfOrder {
                    timestamp: update.timestamp,
                    last,
                });
            }
        }
        self.last_notification = Some(update.timestamp);

        let evaluation = self.engine.evaluate(&update);
        if let Action::Failed { error, .. } = &evaluation.action {
            warn!(%error, tick = update.tick, "circuit breaker opened; waiting for unpause");
        }
        Ok(evaluation)
    }
}
