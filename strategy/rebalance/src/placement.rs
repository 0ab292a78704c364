//! Target ranges handed to the vault on a reposition.

use crate::thresholds::Thresholds;
use crate::types::{RebalanceParams, State, TickRange};
use crate::volatility::LN_TICK_BASE;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Ticks at or beyond this magnitude are outside the band the engine operates in.
pub const EXTREME_TICK_BOUND: i32 = MAX_TICK / 2;

/// Narrowest base or limit range, in ticks, the engine will deploy (about 3% of price).
pub const MIN_RANGE_WIDTH: i32 = 300;

/// Which side of the pair is the deposit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub tick_spacing: i32,
    pub deposit_is_token0: bool,
}

impl Placement {
    pub(crate) fn params(
        &self,
        target: State,
        current_tick: i32,
        extreme_skew: bool,
        thresholds: &Thresholds,
    ) -> RebalanceParams {
        let spacing = i64::from(self.tick_spacing);
        let tick = i64::from(current_tick);
        let (min_usable, max_usable) = (
            ceil_to(i64::from(MIN_TICK), spacing),
            floor_to(i64::from(MAX_TICK), spacing),
        );

        let base_lower = floor_to(tick - ticks_below(thresholds.base_low_pct), spacing).max(min_usable);
        let base_upper = ceil_to(tick + ticks_above(thresholds.base_high_pct), spacing).min(max_usable);

        let width = ceil_to(ticks_above(thresholds.limit_reserve_pct), spacing).max(spacing);
        // a range above the current price holds token0 only
        let sell_deposit = target != State::UnderInventory;
        let limit = if sell_deposit == self.deposit_is_token0 {
            let lower = (floor_to(tick, spacing) + spacing).min(max_usable - spacing);
            (lower, (lower + width).min(max_usable))
        } else {
            let upper = floor_to(tick, spacing).max(min_usable + spacing);
            ((upper - width).max(min_usable), upper)
        };

        RebalanceParams {
            target,
            current_tick,
            base: TickRange {
                lower: base_lower as i32,
                upper: base_upper as i32,
            },
            limit: TickRange {
                lower: limit.0 as i32,
                upper: limit.1 as i32,
            },
            extreme_skew,
        }
    }

    /// A range narrower than `MIN_RANGE_WIDTH` or two tick spacings is not worth deploying.
    pub(crate) fn is_too_narrow(&self, params: &RebalanceParams) -> bool {
        let min_width = MIN_RANGE_WIDTH.max(2 * self.tick_spacing);
        params.base.width() < min_width || params.limit.width() < min_width
    }
}

/// Ticks needed to move the price up by `bps`.
fn ticks_above(bps: u16) -> i64 {
    let factor = 1.0 + f64::from(bps) / 10_000.0;
    (factor.ln() / LN_TICK_BASE).floor() as i64
}

/// Ticks needed to move the price down by `bps`; saturates at the full tick range.
fn ticks_below(bps: u16) -> i64 {
    if bps >= 10_000 {
        return i64::from(MAX_TICK) - i64::from(MIN_TICK);
    }
    let factor = 1.0 - f64::from(bps) / 10_000.0;
    (-factor.ln() / LN_TICK_BASE).floor() as i64
}

fn floor_to(tick: i64, spacing: i64) -> i64 {
    tick.div_euclid(spacing) * spacing
}

fn ceil_to(tick: i64, spacing: i64) -> i64 {
    -(-tick).div_euclid(spacing) * spacing
}
