//! Volatility buckets derived from the price movement since the last reposition.

use serde::{Deserialize, Serialize};

use crate::thresholds::Thresholds;

/// `ln(1.0001)`, the log-price width of one tick.
pub(crate) const LN_TICK_BASE: f64 = 0.000_099_995_000_333_308_34;

/// Discrete classification of recent price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Volatility {
    None,
    Some,
    High,
    Extreme,
}

impl Volatility {
    /// Buckets a signed movement (basis points of price) by its magnitude.
    ///
    /// Lower bounds are inclusive, so a movement sitting exactly on a boundary lands in the
    /// higher bucket.
    pub fn classify(movement_bps: i64, thresholds: &Thresholds) -> Self {
        let magnitude = movement_bps.unsigned_abs();
        if magnitude >= u64::from(thresholds.extreme_volatility) {
            Volatility::Extreme
        } else if magnitude >= u64::from(thresholds.high_volatility) {
            Volatility::High
        } else if magnitude >= u64::from(thresholds.some_volatility) {
            Volatility::Some
        } else {
            Volatility::None
        }
    }

    /// True for buckets that put the engine in, or keep it in, the defensive regime.
    pub fn is_escalated(self) -> bool {
        self >= Volatility::High
    }
}

/// Signed price movement in basis points between two ticks.
///
/// Computed as `(1.0001^(to - from) - 1) * 10000` and truncated toward zero.
pub fn price_change_bps(from_tick: i32, to_tick: i32) -> i64 {
    let delta = f64::from(to_tick) - f64::from(from_tick);
    let ratio = (delta * LN_TICK_BASE).exp();
    let bps = (ratio - 1.0) * 10_000.0;
    if bps >= i64::MAX as f64 {
        i64::MAX
    } else {
        bps.trunc() as i64
    }
}
