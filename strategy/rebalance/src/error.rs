use alloy::primitives::Address;
use thiserror::Error;

use crate::thresholds::ThresholdError;

/// Errors surfaced at the engine boundary.
///
/// Vault failures during a reposition are not listed here: they are reported inside the
/// evaluation so the price event that triggered it can still complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("caller {caller} is not authorized")]
    Unauthorized { caller: Address },
    #[error(transparent)]
    InvalidThresholds(#[from] ThresholdError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("already unpaused")]
    AlreadyUnpaused,
    #[error("not enough execution budget left: {remaining}, must exceed {required}")]
    InsufficientBudget { remaining: u64, required: u64 },
    #[error("notification at {timestamp} is older than the last one at {last}")]
    OutOfOrder { timestamp: u64, last: u64 },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
