//! Inventory rebalancing strategy crate.
//!
//! Decides after every price-moving event whether a managed liquidity position should be
//! redeployed, and asks its vault to do so.

pub mod config;
mod engine;
mod error;
mod governor;
mod inventory;
mod placement;
mod thresholds;
mod types;
mod vault;
mod volatility;

pub use config::{GovernorConfig, RebalanceEngineConfig};
pub use engine::RebalanceEngine;
pub use error::{EngineError, Result};
pub use governor::{CircuitBreaker, SafetyGovernor, Trip};
pub use inventory::{InventoryAmounts, InventoryComposition};
pub use placement::{EXTREME_TICK_BOUND, MAX_TICK, MIN_RANGE_WIDTH, MIN_TICK};
pub use thresholds::{ThresholdError, Thresholds};
pub use types::{
    Action, DecideInput, DecideStatus, EngineSnapshot, Evaluation, PriceUpdate, RebalanceParams,
    SkipReason, State, TickRange,
};
pub use vault::{TotalAmounts, Vault, VaultError};
pub use volatility::{price_change_bps, Volatility};
