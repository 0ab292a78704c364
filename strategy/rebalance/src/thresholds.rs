//! Threshold set governing regime classification and gating.
//!
//! All values are basis points. Validation is a single pass over the whole set because
//! most invariants relate two or more fields; setters build a candidate copy, validate it
//! and only then replace the live set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason a candidate threshold set was rejected. The messages are stable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("invalid price change threshold")]
    InvalidPriceChangeThreshold,
    #[error("invalid base low percent")]
    InvalidBaseLowPct,
    #[error("invalid base high percent")]
    InvalidBaseHighPct,
    #[error("invalid limit reserve percent")]
    InvalidLimitReservePct,
    #[error("under inventory threshold must be > 6000")]
    UnderInventoryTooLow,
    #[error("normal threshold must be > under inventory threshold")]
    NormalNotAboveUnder,
    #[error("over inventory threshold must be > normal threshold")]
    OverNotAboveNormal,
    #[error("simulate must be > over inventory threshold")]
    SimulateNotAboveOver,
    #[error("simulate must be < 9500")]
    SimulateTooHigh,
    #[error("dtr delta must be <= 10000")]
    DtrDeltaTooHigh,
    #[error("high volatility must be >= some volatility")]
    HighBelowSomeVolatility,
    #[error("extreme volatility must be >= high volatility")]
    ExtremeBelowHighVolatility,
    #[error("deposit token unused threshold must be within [100, 10000]")]
    DepositTokenUnusedOutOfRange,
    #[error("some volatility must be <= 300")]
    SomeVolatilityTooHigh,
}

/// The thirteen bounded parameters of a managed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum idle share of the deposit token required to fund a reposition
    pub deposit_token_unused_threshold: u16,
    /// Deposit share at which the inventory counts as extremely skewed
    pub simulate: u16,
    /// Deposit share needed to leave `UnderInventory` for `Normal`
    pub normal_threshold: u16,
    /// Below this deposit share the inventory is `UnderInventory`
    pub under_inventory_threshold: u16,
    /// At or above this deposit share the inventory is `OverInventory`
    pub over_inventory_threshold: u16,
    /// Price drift that re-centers a position without a regime change
    pub price_change_threshold: u16,
    pub extreme_volatility: u16,
    pub high_volatility: u16,
    pub some_volatility: u16,
    /// Price move that lets high volatility bypass the cooldown
    pub dtr_delta: u16,
    pub base_low_pct: u16,
    pub base_high_pct: u16,
    pub limit_reserve_pct: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            deposit_token_unused_threshold: 100,
            simulate: 9400,
            normal_threshold: 8100,
            under_inventory_threshold: 7800,
            over_inventory_threshold: 9100,
            price_change_threshold: 100,
            extreme_volatility: 2500,
            high_volatility: 900,
            some_volatility: 200,
            dtr_delta: 300,
            base_low_pct: 3000,
            base_high_pct: 1500,
            limit_reserve_pct: 500,
        }
    }
}

impl Thresholds {
    /// Checks every invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        use ThresholdError::*;

        if self.price_change_threshold > 9999 {
            return Err(InvalidPriceChangeThreshold);
        }
        if self.base_low_pct == 0 {
            return Err(InvalidBaseLowPct);
        }
        if self.base_high_pct == 0 {
            return Err(InvalidBaseHighPct);
        }
        if self.limit_reserve_pct == 0 {
            return Err(InvalidLimitReservePct);
        }
        if self.under_inventory_threshold <= 6000 {
            return Err(UnderInventoryTooLow);
        }
        if self.normal_threshold <= self.under_inventory_threshold {
            return Err(NormalNotAboveUnder);
        }
        if self.over_inventory_threshold <= self.normal_threshold {
            return Err(OverNotAboveNormal);
        }
        if self.simulate <= self.over_inventory_threshold {
            return Err(SimulateNotAboveOver);
        }
        if self.simulate >= 9500 {
            return Err(SimulateTooHigh);
        }
        if self.dtr_delta > 10_000 {
            return Err(DtrDeltaTooHigh);
        }
        if self.high_volatility < self.some_volatility {
            return Err(HighBelowSomeVolatility);
        }
        if self.extreme_volatility < self.high_volatility {
            return Err(ExtremeBelowHighVolatility);
        }
        if !(100..=10_000).contains(&self.deposit_token_unused_threshold) {
            return Err(DepositTokenUnusedOutOfRange);
        }
        if self.some_volatility > 300 {
            return Err(SomeVolatilityTooHigh);
        }
        Ok(())
    }

    /// Applies `edit` to a copy and returns the copy only if it validates.
    pub fn with<F>(&self, edit: F) -> Result<Self, ThresholdError>
    where
        F: FnOnce(&mut Thresholds),
    {
        let mut candidate = *self;
        edit(&mut candidate);
        candidate.validate()?;
        Ok(candidate)
    }
}
