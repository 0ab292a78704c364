//! Shared fixed-point utilities for the rebalancing workspace.

use alloy::primitives::U256;

/// One hundred percent expressed in basis points.
pub const BPS: u64 = 10_000;

/// Largest decimal scale accepted for a token; `10^38` still leaves headroom in a U256.
pub const MAX_DECIMALS: u8 = 38;

/// Converts a U256 value to f64, accounting for token decimals.
///
/// Values larger than `u128::MAX` are truncated; this is acceptable for f64 precision.
pub fn u256_to_f64(value: U256, decimals: u32) -> f64 {
    let value_u128 = value.saturating_to::<u128>();
    let divisor = 10_u128.pow(decimals);
    let whole_part = value_u128 / divisor;
    let fractional_part = value_u128 % divisor;
    whole_part as f64 + (fractional_part as f64 / divisor as f64)
}

/// Brings two raw amounts with different decimal scales onto the larger of the two scales.
///
/// The amount with fewer decimals is multiplied up, so no precision is discarded.
/// Multiplication saturates at `U256::MAX`.
pub fn normalize_pair(amount_a: U256, decimals_a: u8, amount_b: U256, decimals_b: u8) -> (U256, U256) {
    match decimals_a.cmp(&decimals_b) {
        std::cmp::Ordering::Less => (
            scale_up(amount_a, decimals_b - decimals_a),
            amount_b,
        ),
        std::cmp::Ordering::Greater => (
            amount_a,
            scale_up(amount_b, decimals_a - decimals_b),
        ),
        std::cmp::Ordering::Equal => (amount_a, amount_b),
    }
}

fn scale_up(value: U256, by_decimals: u8) -> U256 {
    let factor = U256::from(10u64).pow(U256::from(by_decimals));
    value.saturating_mul(factor)
}

/// `numerator / denominator` in basis points, capped at [`BPS`].
///
/// Returns `None` when the denominator is zero.
pub fn bps_ratio(numerator: U256, denominator: U256) -> Option<u16> {
    if denominator.is_zero() {
        return None;
    }
    let bps = U256::from(BPS);
    let ratio = match numerator.checked_mul(bps) {
        Some(scaled) => scaled / denominator,
        // numerator is huge; divide the denominator instead (it cannot be zero after the
        // division unless numerator dwarfs it, in which case the ratio is saturated anyway)
        None => {
            let coarse = denominator / bps;
            if coarse.is_zero() {
                bps
            } else {
                numerator / coarse
            }
        }
    };
    Some(ratio.min(bps).to::<u64>() as u16)
}
