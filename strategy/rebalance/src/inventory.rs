//! Inventory composition of a managed position.
//!
//! Recomputed on every evaluation from the amounts the vault reports; never stored.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use utils::{bps_ratio, normalize_pair, BPS};

use crate::thresholds::Thresholds;
use crate::types::State;

/// Raw amounts reported by the vault, already mapped to the deposit/paired sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryAmounts {
    /// Total deposit token deployed, in deposit-token decimals
    pub deposit_amount: U256,
    /// Total paired token deployed, in paired-token decimals
    pub paired_amount: U256,
    /// Deposit token sitting idle in the vault, in deposit-token decimals
    pub idle_deposit_balance: U256,
    pub deposit_decimals: u8,
    pub paired_decimals: u8,
}

/// Share of the deposit token in the position, both in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryComposition {
    /// deposit / (deposit + paired) after decimal normalization
    pub pct_deposit_token_used: u16,
    /// idle deposit balance / deposit amount; saturated when nothing is deployed
    pub pct_deposit_token_unused: u16,
}

impl InventoryComposition {
    pub fn derive(amounts: &InventoryAmounts) -> Self {
        let (deposit, paired) = normalize_pair(
            amounts.deposit_amount,
            amounts.deposit_decimals,
            amounts.paired_amount,
            amounts.paired_decimals,
        );
        let pct_deposit_token_used = bps_ratio(deposit, deposit.saturating_add(paired)).unwrap_or(0);
        let pct_deposit_token_unused = bps_ratio(amounts.idle_deposit_balance, amounts.deposit_amount)
            .unwrap_or(BPS as u16);

        Self {
            pct_deposit_token_used,
            pct_deposit_token_unused,
        }
    }

    /// Too little idle deposit token to fund a reposition.
    pub fn is_underfunded(&self, thresholds: &Thresholds) -> bool {
        self.pct_deposit_token_unused < thresholds.deposit_token_unused_threshold
    }

    /// Target inventory regime given the regime the engine currently holds.
    ///
    /// `[under, over)` is `Normal`, except that an engine already in `UnderInventory`
    /// stays there until the deposit share reaches `normal_threshold`.
    pub fn target_regime(&self, current: State, thresholds: &Thresholds) -> State {
        let pct = self.pct_deposit_token_used;
        if pct < thresholds.under_inventory_threshold {
            State::UnderInventory
        } else if pct >= thresholds.over_inventory_threshold {
            State::OverInventory
        } else if current == State::UnderInventory && pct < thresholds.normal_threshold {
            State::UnderInventory
        } else {
            State::Normal
        }
    }

    /// Deposit share at the far ends of the range, beyond `simulate` on either side.
    pub fn is_extreme_skew(&self, thresholds: &Thresholds) -> bool {
        let pct = self.pct_deposit_token_used;
        pct >= thresholds.simulate || pct <= (BPS as u16).saturating_sub(thresholds.simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amounts(deposit: u128, paired: u128, idle: u128) -> InventoryAmounts {
        InventoryAmounts {
            deposit_amount: U256::from(deposit),
            paired_amount: U256::from(paired),
            idle_deposit_balance: U256::from(idle),
            deposit_decimals: 18,
            paired_decimals: 18,
        }
    }

    #[test]
    fn fully_deposit_side() {
        let c = InventoryComposition::derive(&amounts(10_000, 0, 10_000));
        assert_eq!(c.pct_deposit_token_used, 10_000);
        assert_eq!(c.pct_deposit_token_unused, 10_000);
    }

    #[test]
    fn empty_deposit_side_counts_as_unused() {
        let c = InventoryComposition::derive(&amounts(0, 10_000, 0));
        assert_eq!(c.pct_deposit_token_used, 0);
        assert_eq!(c.pct_deposit_token_unused, 10_000);

        let empty = InventoryComposition::derive(&amounts(0, 0, 0));
        assert_eq!(empty.pct_deposit_token_used, 0);
    }

    #[test]
    fn decimals_are_normalized_before_dividing() {
        // 8000 units of a 6-decimals deposit token against 2000 units of an 18-decimals pair
        let c = InventoryComposition::derive(&InventoryAmounts {
            deposit_amount: U256::from(8_000u64) * U256::from(10u64).pow(U256::from(6u64)),
            paired_amount: U256::from(2_000u64) * U256::from(10u64).pow(U256::from(18u64)),
            idle_deposit_balance: U256::ZERO,
            deposit_decimals: 6,
            paired_decimals: 18,
        });
        assert_eq!(c.pct_deposit_token_used, 8_000);
        assert_eq!(c.pct_deposit_token_unused, 0);
    }

    #[test]
    fn regime_partition_with_hysteresis() {
        let t = Thresholds::default();
        let at = |pct: u16| InventoryComposition {
            pct_deposit_token_used: pct,
            pct_deposit_token_unused: 10_000,
        };

        assert_eq!(at(7_799).target_regime(State::Normal, &t), State::UnderInventory);
        assert_eq!(at(7_800).target_regime(State::Normal, &t), State::Normal);
        assert_eq!(at(9_099).target_regime(State::OverInventory, &t), State::Normal);
        assert_eq!(at(9_100).target_regime(State::Normal, &t), State::OverInventory);

        assert_eq!(at(8_000).target_regime(State::UnderInventory, &t), State::UnderInventory);
        assert_eq!(at(8_099).target_regime(State::UnderInventory, &t), State::UnderInventory);
        assert_eq!(at(8_100).target_regime(State::UnderInventory, &t), State::Normal);
        assert_eq!(at(8_000).target_regime(State::Special, &t), State::Normal);
    }

    #[test]
    fn extreme_skew_on_both_sides() {
        let t = Thresholds::default();
        let at = |pct: u16| InventoryComposition {
            pct_deposit_token_used: pct,
            pct_deposit_token_unused: 0,
        };
        assert!(at(9_400).is_extreme_skew(&t));
        assert!(!at(9_399).is_extreme_skew(&t));
        assert!(at(600).is_extreme_skew(&t));
        assert!(!at(601).is_extreme_skew(&t));
    }

    proptest! {
        #[test]
        fn deposit_share_is_monotonic(paired in 1u64..1_000_000, a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = InventoryComposition::derive(&amounts(lo.into(), paired.into(), 0));
            let hi = InventoryComposition::derive(&amounts(hi.into(), paired.into(), 0));
            prop_assert!(lo.pct_deposit_token_used <= hi.pct_deposit_token_used);
        }
    }
}
