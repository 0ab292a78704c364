//! Rebalance decision engine
//!
//! Holds the inventory regime of one managed position and decides, for every price-moving
//! notification, whether the position should be redeployed. An evaluation runs to
//! completion under `&mut self`; nothing else can touch the engine while it is running.

use alloy::primitives::Address;
use tracing::{debug, info, warn};
use utils::u256_to_f64;

use crate::config::{check_decimals, RebalanceEngineConfig};
use crate::error::{EngineError, Result};
use crate::governor::CircuitBreaker;
use crate::inventory::{InventoryAmounts, InventoryComposition};
use crate::placement::{Placement, EXTREME_TICK_BOUND};
use crate::thresholds::Thresholds;
use crate::types::{
    Action, DecideInput, DecideStatus, EngineSnapshot, Evaluation, PriceUpdate, SkipReason, State,
};
use crate::vault::{Vault, VaultError};
use crate::volatility::{price_change_bps, Volatility};

/// Decision engine bound to a single managed position.
pub struct RebalanceEngine<V> {
    /// Vault executing repositions; `None` until one is configured
    vault: Option<V>,
    /// Address allowed to use the administrative surface
    manager: Address,
    token0: Address,
    token1: Address,
    decimals0: u8,
    decimals1: u8,
    /// token1 is the deposit token when set
    allow_token1: bool,
    tick_spacing: i32,
    min_time_between_rebalances: u64,
    thresholds: Thresholds,
    state: State,
    /// Timestamp of the last executed reposition
    last_rebalance: Option<u64>,
    /// Tick at the last executed reposition, the price baseline for movement
    last_rebalance_tick: i32,
    breaker: CircuitBreaker,
    last_status: Option<DecideStatus>,
}

impl<V: Vault> RebalanceEngine<V> {
    /// Creates a new engine in the conventional `OverInventory` starting regime.
    ///
    /// # Arguments
    /// * `config` - Position parameters; thresholds, tick spacing and decimals are validated
    /// * `vault` - Vault that executes repositions, if already known
    pub fn new(config: RebalanceEngineConfig, vault: Option<V>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            vault,
            manager: config.manager,
            token0: config.token0,
            token1: config.token1,
            decimals0: config.decimals0,
            decimals1: config.decimals1,
            allow_token1: config.allow_token1,
            tick_spacing: config.tick_spacing,
            min_time_between_rebalances: config.min_time_between_rebalances,
            thresholds: config.thresholds,
            state: State::OverInventory,
            last_rebalance: None,
            last_rebalance_tick: config.initial_tick,
            breaker: CircuitBreaker::default(),
            last_status: None,
        })
    }

    /// Inventory regime currently held by the engine.
    pub fn state(&self) -> State {
        self.state
    }

    /// Current validated threshold set.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Whether a failed reposition has latched the circuit breaker.
    pub fn is_paused(&self) -> bool {
        self.breaker.is_open()
    }

    /// Failure message that latched the circuit breaker, if paused.
    pub fn pause_reason(&self) -> Option<&str> {
        self.breaker.trip().map(|trip| trip.reason.as_str())
    }

    /// Timestamp of the last executed reposition, 0 if none happened yet.
    pub fn last_rebalance_timestamp(&self) -> u64 {
        self.last_rebalance.unwrap_or(0)
    }

    /// Tick at the last executed reposition; `initial_tick` before the first one.
    pub fn last_rebalance_tick(&self) -> i32 {
        self.last_rebalance_tick
    }

    /// Price (token1 per token0) at the last executed reposition.
    pub fn last_rebalance_price(&self) -> f64 {
        1.0001_f64.powi(self.last_rebalance_tick)
    }

    /// Cooldown between two executed repositions, in seconds.
    pub fn min_time_between_rebalances(&self) -> u64 {
        self.min_time_between_rebalances
    }

    /// Address allowed to use the administrative surface.
    pub fn manager(&self) -> Address {
        self.manager
    }

    /// Vault executing repositions, if configured.
    pub fn vault(&self) -> Option<&V> {
        self.vault.as_ref()
    }

    /// Mutable access to the configured vault.
    pub fn vault_mut(&mut self) -> Option<&mut V> {
        self.vault.as_mut()
    }

    /// Pool tokens as `(token0, token1)`.
    pub fn tokens(&self) -> (Address, Address) {
        (self.token0, self.token1)
    }

    /// Token decimals as `(decimals0, decimals1)`.
    pub fn decimals(&self) -> (u8, u8) {
        (self.decimals0, self.decimals1)
    }

    /// Whether token1 is the deposit token.
    pub fn allow_token1(&self) -> bool {
        self.allow_token1
    }

    /// Address of the deposit token, token1 when `allow_token1` is set and token0 otherwise.
    pub fn deposit_token(&self) -> Address {
        if self.allow_token1 {
            self.token1
        } else {
            self.token0
        }
    }

    /// Captures the engine state for operators.
    ///
    /// # Returns
    /// An `EngineSnapshot` with the regime, pause flag and reason, last rebalance point,
    /// thresholds and the status of the last evaluation
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            paused: self.is_paused(),
            pause_reason: self.pause_reason().map(str::to_owned),
            last_rebalance_timestamp: self.last_rebalance_timestamp(),
            last_rebalance_tick: self.last_rebalance_tick,
            min_time_between_rebalances: self.min_time_between_rebalances,
            thresholds: self.thresholds,
            last_status: self.last_status,
        }
    }

    // ---- administrative surface ----

    fn authorize(&self, caller: Address) -> Result<()> {
        if caller != self.manager {
            warn!(%caller, "rejected unauthorized caller");
            return Err(EngineError::Unauthorized { caller });
        }
        Ok(())
    }

    fn update_thresholds<F>(&mut self, caller: Address, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Thresholds),
    {
        self.authorize(caller)?;
        let candidate = self.thresholds.with(edit)?;
        info!(thresholds = ?candidate, "thresholds updated");
        self.thresholds = candidate;
        Ok(())
    }

    /// Replaces the whole threshold set.
    ///
    /// # Arguments
    /// * `caller` - Must be the manager
    /// * `thresholds` - New set, validated as a whole before it is written
    ///
    /// # Returns
    /// `Unauthorized` or `InvalidThresholds` with the first violated invariant; the current
    /// set is left untouched on error.
    pub fn set_thresholds(&mut self, caller: Address, thresholds: Thresholds) -> Result<()> {
        self.update_thresholds(caller, |t| *t = thresholds)
    }

    /// Sets the drift, in basis points, beyond which a position in the right regime is re-centered.
    pub fn set_price_change_threshold(&mut self, caller: Address, value: u16) -> Result<()> {
        self.update_thresholds(caller, |t| t.price_change_threshold = value)
    }

    /// Sets the widths of the base and limit ranges.
    ///
    /// # Arguments
    /// * `caller` - Must be the manager
    /// * `base_low_pct` - Price drop covered by the base range, in basis points
    /// * `base_high_pct` - Price rise covered by the base range, in basis points
    /// * `limit_reserve_pct` - Price span of the single-sided limit range, in basis points
    ///
    /// # Returns
    /// `Err` if any of the three is zero or the caller is not the manager; nothing is
    /// written on error.
    pub fn set_percentages(
        &mut self,
        caller: Address,
        base_low_pct: u16,
        base_high_pct: u16,
        limit_reserve_pct: u16,
    ) -> Result<()> {
        self.update_thresholds(caller, |t| {
            t.base_low_pct = base_low_pct;
            t.base_high_pct = base_high_pct;
            t.limit_reserve_pct = limit_reserve_pct;
        })
    }

    /// Sets the four inventory triggers in one atomic update.
    ///
    /// # Arguments
    /// * `caller` - Must be the manager
    /// * `simulate` - Deposit share marking an extreme skew
    /// * `normal_threshold` - Share an `UnderInventory` engine must reach to return to `Normal`
    /// * `under_inventory_threshold` - Share below which the target is `UnderInventory`
    /// * `over_inventory_threshold` - Share from which the target is `OverInventory`
    ///
    /// # Returns
    /// `Err` unless `6000 < under < normal < over < simulate < 9500`; nothing is written on error.
    pub fn set_triggers(
        &mut self,
        caller: Address,
        simulate: u16,
        normal_threshold: u16,
        under_inventory_threshold: u16,
        over_inventory_threshold: u16,
    ) -> Result<()> {
        self.update_thresholds(caller, |t| {
            t.simulate = simulate;
            t.normal_threshold = normal_threshold;
            t.under_inventory_threshold = under_inventory_threshold;
            t.over_inventory_threshold = over_inventory_threshold;
        })
    }

    /// Sets the price move, in basis points, that lets high volatility bypass the cooldown.
    pub fn set_dtr_delta(&mut self, caller: Address, value: u16) -> Result<()> {
        self.update_thresholds(caller, |t| t.dtr_delta = value)
    }

    /// Sets the lower bound of the extreme volatility bucket; must not be below `high_volatility`.
    pub fn set_extreme_volatility(&mut self, caller: Address, value: u16) -> Result<()> {
        self.update_thresholds(caller, |t| t.extreme_volatility = value)
    }

    /// Sets the lower bound of the high volatility bucket, between `some_volatility` and
    /// `extreme_volatility`.
    pub fn set_high_volatility(&mut self, caller: Address, value: u16) -> Result<()> {
        self.update_thresholds(caller, |t| t.high_volatility = value)
    }

    /// Sets the lower bound of the some volatility bucket; at most 300 and not above `high_volatility`.
    pub fn set_some_volatility(&mut self, caller: Address, value: u16) -> Result<()> {
        self.update_thresholds(caller, |t| t.some_volatility = value)
    }

    /// Sets the idle deposit share, in `[100, 10000]`, needed to fund a reposition.
    pub fn set_deposit_token_unused_threshold(&mut self, caller: Address, value: u16) -> Result<()> {
        self.update_thresholds(caller, |t| t.deposit_token_unused_threshold = value)
    }

    /// Sets the cooldown between two executed repositions, in seconds.
    pub fn set_min_time_between_rebalances(&mut self, caller: Address, seconds: u64) -> Result<()> {
        self.authorize(caller)?;
        self.min_time_between_rebalances = seconds;
        info!(seconds, "cooldown updated");
        Ok(())
    }

    /// Replaces the vault.
    ///
    /// # Arguments
    /// * `caller` - Must be the manager
    /// * `vault` - New vault; `None` makes every evaluation skip with `VaultUnset`
    ///
    /// # Returns
    /// The previously configured vault
    pub fn set_vault(&mut self, caller: Address, vault: Option<V>) -> Result<Option<V>> {
        self.authorize(caller)?;
        info!(configured = vault.is_some(), "vault updated");
        Ok(std::mem::replace(&mut self.vault, vault))
    }

    /// Sets the pool token addresses.
    pub fn set_tokens(&mut self, caller: Address, token0: Address, token1: Address) -> Result<()> {
        self.authorize(caller)?;
        self.token0 = token0;
        self.token1 = token1;
        info!(%token0, %token1, "tokens updated");
        Ok(())
    }

    /// Sets the token decimals; each must be at most 38.
    pub fn set_decimals(&mut self, caller: Address, decimals0: u8, decimals1: u8) -> Result<()> {
        self.authorize(caller)?;
        check_decimals(decimals0, decimals1)?;
        self.decimals0 = decimals0;
        self.decimals1 = decimals1;
        info!(decimals0, decimals1, "decimals updated");
        Ok(())
    }

    /// Selects token1 (`true`) or token0 (`false`) as the deposit token.
    pub fn set_allow_token1(&mut self, caller: Address, allow_token1: bool) -> Result<()> {
        self.authorize(caller)?;
        self.allow_token1 = allow_token1;
        info!(allow_token1, "deposit side updated");
        Ok(())
    }

    /// Clears the circuit breaker latched by a failed reposition.
    ///
    /// # Returns
    /// `AlreadyUnpaused` when the engine is not paused, `Unauthorized` for any caller
    /// other than the manager
    pub fn unpause(&mut self, caller: Address) -> Result<()> {
        self.authorize(caller)?;
        let trip = self.breaker.reset().ok_or(EngineError::AlreadyUnpaused)?;
        info!(tripped_at = trip.at, reason = %trip.reason, "engine unpaused");
        Ok(())
    }

    // ---- evaluation ----

    /// Evaluates a price-moving notification end to end: reads the vault, derives the
    /// inventory composition and volatility bucket, then runs [`Self::decide`].
    pub fn evaluate(&mut self, update: &PriceUpdate) -> Evaluation {
        if let Some(reason) = self.skip_reason(update.tick) {
            return self.skip(reason, update.tick);
        }

        let inventory = match self.read_inventory() {
            Ok(inventory) => inventory,
            Err(error) => {
                warn!(%error, "could not read vault amounts");
                return self.finish(Evaluation::skipped(SkipReason::VaultUnreachable, self.state));
            }
        };

        let movement = price_change_bps(self.last_rebalance_tick, update.tick);
        let volatility = Volatility::classify(movement, &self.thresholds);

        self.decide(DecideInput {
            current_tick: update.tick,
            timestamp: update.timestamp,
            inventory,
            volatility,
        })
    }

    /// Runs one decision step against the engine's current thresholds.
    ///
    /// # Arguments
    /// * `input` - Current tick, notification timestamp, inventory composition and
    ///   volatility bucket
    ///
    /// # Returns
    /// The status, the resulting regime and the action taken. Only an executed reposition
    /// moves the rebalance timestamp and price; the regime also moves to `Special` on
    /// escalated volatility and on a failed reposition.
    pub fn decide(&mut self, input: DecideInput) -> Evaluation {
        let thresholds = self.thresholds;
        self.decide_with(&thresholds, input)
    }

    /// Runs one decision step against an explicit threshold set instead of the engine's
    /// current copy. The set is used as given; run [`Thresholds::validate`] first when it
    /// does not come from the engine.
    pub fn decide_with(&mut self, thresholds: &Thresholds, input: DecideInput) -> Evaluation {
        if let Some(reason) = self.skip_reason(input.current_tick) {
            return self.skip(reason, input.current_tick);
        }

        if input.inventory.is_underfunded(thresholds) {
            return self.finish(Evaluation::decided(DecideStatus::NoNeedWithPending, self.state));
        }

        if input.volatility == Volatility::Extreme {
            if self.state != State::Special {
                warn!(tick = input.current_tick, from = ?self.state, "extreme volatility, entering special regime");
            }
            self.state = State::Special;
            return self.finish(Evaluation::decided(DecideStatus::ExtremeVolatility, State::Special));
        }

        let movement = price_change_bps(self.last_rebalance_tick, input.current_tick);
        let cooled_down = match self.last_rebalance {
            None => true,
            // a notification older than the last reposition can never act
            Some(last) if input.timestamp < last => false,
            Some(last) => input.timestamp - last >= self.min_time_between_rebalances,
        };
        let fast_path = input.volatility == Volatility::High
            && movement.unsigned_abs() >= u64::from(thresholds.dtr_delta)
            && self.last_rebalance.map_or(true, |last| input.timestamp >= last);
        if !cooled_down && !fast_path {
            return self.finish(Evaluation::decided(DecideStatus::TooSoon, self.state));
        }

        // only high is left here; extreme returned above
        if input.volatility.is_escalated() {
            if self.state != State::Special {
                warn!(tick = input.current_tick, from = ?self.state, "high volatility, entering special regime");
                self.state = State::Special;
            }
            return self.finish(Evaluation::decided(DecideStatus::Special, State::Special));
        }

        if self.state == State::Special {
            let target = input.inventory.target_regime(State::Special, thresholds);
            return self.reposition(target, &input, thresholds);
        }

        let target = input.inventory.target_regime(self.state, thresholds);
        let drifted = movement.unsigned_abs() > u64::from(thresholds.price_change_threshold);
        if self.last_rebalance.is_none() || target != self.state || drifted {
            return self.reposition(target, &input, thresholds);
        }

        self.finish(Evaluation::decided(DecideStatus::NoNeed, self.state))
    }

    fn skip_reason(&self, tick: i32) -> Option<SkipReason> {
        if self.breaker.is_open() {
            Some(SkipReason::Paused)
        } else if self.vault.is_none() {
            Some(SkipReason::VaultUnset)
        } else if tick.unsigned_abs() >= EXTREME_TICK_BOUND.unsigned_abs() {
            Some(SkipReason::ExtremeTick)
        } else {
            None
        }
    }

    fn skip(&mut self, reason: SkipReason, tick: i32) -> Evaluation {
        match reason {
            SkipReason::ExtremeTick => warn!(tick, "tick outside operating band, skipping"),
            SkipReason::VaultUnset => warn!("no vault configured, skipping"),
            SkipReason::Paused | SkipReason::VaultUnreachable | SkipReason::NarrowRange => {}
        }
        self.finish(Evaluation::skipped(reason, self.state))
    }

    fn read_inventory(&self) -> std::result::Result<InventoryComposition, VaultError> {
        let vault = self
            .vault
            .as_ref()
            .ok_or_else(|| VaultError::Unreachable("no vault configured".to_string()))?;
        let totals = vault.report_total_amounts()?;
        let idle = vault.idle_balance(self.deposit_token())?;

        let amounts = if self.allow_token1 {
            InventoryAmounts {
                deposit_amount: totals.amount1,
                paired_amount: totals.amount0,
                idle_deposit_balance: idle,
                deposit_decimals: self.decimals1,
                paired_decimals: self.decimals0,
            }
        } else {
            InventoryAmounts {
                deposit_amount: totals.amount0,
                paired_amount: totals.amount1,
                idle_deposit_balance: idle,
                deposit_decimals: self.decimals0,
                paired_decimals: self.decimals1,
            }
        };
        debug!(
            deposit = u256_to_f64(amounts.deposit_amount, u32::from(amounts.deposit_decimals)),
            paired = u256_to_f64(amounts.paired_amount, u32::from(amounts.paired_decimals)),
            idle = u256_to_f64(amounts.idle_deposit_balance, u32::from(amounts.deposit_decimals)),
            "vault inventory"
        );
        Ok(InventoryComposition::derive(&amounts))
    }

    fn reposition(&mut self, target: State, input: &DecideInput, thresholds: &Thresholds) -> Evaluation {
        let placement = Placement {
            tick_spacing: self.tick_spacing,
            deposit_is_token0: !self.allow_token1,
        };
        let params = placement.params(
            target,
            input.current_tick,
            input.inventory.is_extreme_skew(thresholds),
            thresholds,
        );

        if placement.is_too_narrow(&params) {
            warn!(base = ?params.base, limit = ?params.limit, "target ranges too narrow, skipping");
            return self.finish(Evaluation::skipped(SkipReason::NarrowRange, self.state));
        }

        let Some(vault) = self.vault.as_mut() else {
            return self.finish(Evaluation::skipped(SkipReason::VaultUnset, self.state));
        };

        match vault.execute_rebalance(&params) {
            Ok(()) => {
                info!(
                    from = ?self.state,
                    to = ?target,
                    tick = input.current_tick,
                    base = ?params.base,
                    limit = ?params.limit,
                    "position rebalanced"
                );
                self.state = target;
                self.last_rebalance = Some(input.timestamp);
                self.last_rebalance_tick = input.current_tick;
                self.finish(Evaluation {
                    status: DecideStatus::Normal,
                    state: target,
                    action: Action::Rebalanced(params),
                })
            }
            Err(error) => {
                warn!(%error, tick = input.current_tick, from = ?self.state, "rebalance failed, pausing engine in special regime");
                self.breaker.latch(input.timestamp, error.to_string());
                self.state = State::Special;
                self.finish(Evaluation {
                    status: DecideStatus::Normal,
                    state: State::Special,
                    action: Action::Failed { params, error },
                })
            }
        }
    }

    fn finish(&mut self, evaluation: Evaluation) -> Evaluation {
        debug!(status = ?evaluation.status, state = ?evaluation.state, action = ?evaluation.action, "evaluation finished");
        self.last_status = Some(evaluation.status);
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::ThresholdError;
    use crate::types::{RebalanceParams, TickRange};
    use crate::vault::TotalAmounts;
    use alloy::primitives::U256;

    const MANAGER: Address = Address::new([0x11; 20]);
    const STRANGER: Address = Address::new([0x22; 20]);

    #[derive(Default)]
    struct RecordingVault {
        calls: Vec<RebalanceParams>,
        fail: bool,
    }

    impl Vault for RecordingVault {
        fn report_total_amounts(&self) -> std::result::Result<TotalAmounts, VaultError> {
            Ok(TotalAmounts::default())
        }

        fn idle_balance(&self, _token: Address) -> std::result::Result<U256, VaultError> {
            Ok(U256::ZERO)
        }

        fn execute_rebalance(&mut self, params: &RebalanceParams) -> std::result::Result<(), VaultError> {
            if self.fail {
                return Err(VaultError::Reverted("mock".into()));
            }
            self.calls.push(*params);
            Ok(())
        }
    }

    fn config() -> RebalanceEngineConfig {
        RebalanceEngineConfig {
            manager: MANAGER,
            token0: Address::new([0xa0; 20]),
            token1: Address::new([0xa1; 20]),
            decimals0: 18,
            decimals1: 18,
            allow_token1: false,
            tick_spacing: 60,
            min_time_between_rebalances: 3600,
            initial_tick: 0,
            thresholds: Thresholds::default(),
        }
    }

    fn engine() -> RebalanceEngine<RecordingVault> {
        RebalanceEngine::new(config(), Some(RecordingVault::default())).unwrap()
    }

    fn input(pct_used: u16, tick: i32, timestamp: u64, volatility: Volatility) -> DecideInput {
        DecideInput {
            current_tick: tick,
            timestamp,
            inventory: InventoryComposition {
                pct_deposit_token_used: pct_used,
                pct_deposit_token_unused: 10_000,
            },
            volatility,
        }
    }

    #[test]
    fn first_decision_deploys_over_inventory() {
        let mut engine = engine();
        let eval = engine.decide(input(10_000, 0, 1_000, Volatility::None));
        assert_eq!((eval.status, eval.state), (DecideStatus::Normal, State::OverInventory));
        assert!(eval.is_rebalance());
        assert_eq!(engine.last_rebalance_timestamp(), 1_000);
        assert_eq!(engine.vault().unwrap().calls.len(), 1);
    }

    #[test]
    fn same_regime_without_drift_is_no_need() {
        let mut engine = engine();
        engine.decide(input(10_000, 0, 1_000, Volatility::None));
        let eval = engine.decide(input(9_500, 50, 10_000, Volatility::None));
        assert_eq!((eval.status, eval.state), (DecideStatus::NoNeed, State::OverInventory));
        assert_eq!(engine.last_rebalance_timestamp(), 1_000);
    }

    #[test]
    fn drift_past_price_change_threshold_recenters() {
        let mut engine = engine();
        engine.decide(input(10_000, 0, 1_000, Volatility::None));
        let eval = engine.decide(input(9_500, 150, 10_000, Volatility::Some));
        assert_eq!((eval.status, eval.state), (DecideStatus::Normal, State::OverInventory));
        assert_eq!(engine.last_rebalance_tick(), 150);
    }

    #[test]
    fn older_notification_never_acts() {
        let mut engine = engine();
        engine.decide(input(10_000, 0, 10_000, Volatility::None));
        let eval = engine.decide(input(7_000, 2_000, 9_000, Volatility::High));
        assert_eq!(eval.status, DecideStatus::TooSoon);
        assert_eq!(engine.last_rebalance_timestamp(), 10_000);
    }

    #[test]
    fn special_holds_while_volatility_stays_high() {
        let mut engine = engine();
        engine.decide(input(10_000, 0, 1_000, Volatility::None));
        engine.decide(input(10_000, 0, 1_001, Volatility::Extreme));
        assert_eq!(engine.state(), State::Special);

        let eval = engine.decide(input(8_000, 1_000, 10_000, Volatility::High));
        assert_eq!((eval.status, eval.state), (DecideStatus::Special, State::Special));

        let eval = engine.decide(input(8_000, 100, 10_001, Volatility::None));
        assert_eq!((eval.status, eval.state), (DecideStatus::Normal, State::Normal));
    }

    #[test]
    fn high_volatility_enters_special_without_repositioning() {
        let mut engine = engine();
        engine.decide(input(8_000, 0, 1_000, Volatility::None));
        assert_eq!(engine.state(), State::Normal);

        let eval = engine.decide(input(8_000, 2_000, 10_000, Volatility::High));
        assert_eq!((eval.status, eval.state), (DecideStatus::Special, State::Special));
        assert_eq!(eval.action, Action::None);
        assert_eq!(engine.state(), State::Special);
        assert_eq!(engine.last_rebalance_timestamp(), 1_000);
        assert_eq!(engine.last_rebalance_tick(), 0);
        assert_eq!(engine.vault().unwrap().calls.len(), 1);
    }

    #[test]
    fn extreme_tick_is_skipped() {
        let mut engine = engine();
        let eval = engine.decide(input(10_000, 500_000, 1_000, Volatility::None));
        assert_eq!(eval.action, Action::Skipped(SkipReason::ExtremeTick));
        assert_eq!(eval.status, DecideStatus::NoNeed);
        assert!(engine.vault().unwrap().calls.is_empty());
    }

    #[test]
    fn missing_vault_is_skipped() {
        let mut engine = engine();
        assert!(engine.set_vault(MANAGER, None).unwrap().is_some());
        let eval = engine.decide(input(10_000, 0, 1_000, Volatility::None));
        assert_eq!(eval.action, Action::Skipped(SkipReason::VaultUnset));
        assert_eq!(engine.state(), State::OverInventory);
    }

    #[test]
    fn failed_vault_call_latches_breaker() {
        let mut engine = RebalanceEngine::new(
            config(),
            Some(RecordingVault {
                fail: true,
                ..Default::default()
            }),
        )
        .unwrap();

        let eval = engine.decide(input(8_000, 0, 1_000, Volatility::None));
        assert!(eval.is_failure());
        assert_eq!(eval.state, State::Special);
        assert!(engine.is_paused());
        assert_eq!(engine.state(), State::Special);
        assert_eq!(engine.last_rebalance_timestamp(), 0);
        assert_eq!(engine.pause_reason(), Some("vault reverted: mock"));

        let eval = engine.decide(input(8_000, 0, 99_999, Volatility::None));
        assert_eq!(eval.action, Action::Skipped(SkipReason::Paused));

        assert_eq!(engine.unpause(STRANGER), Err(EngineError::Unauthorized { caller: STRANGER }));
        engine.unpause(MANAGER).unwrap();
        assert_eq!(engine.unpause(MANAGER), Err(EngineError::AlreadyUnpaused));
    }

    #[test]
    fn setters_validate_against_current_set() {
        let mut engine = engine();
        engine.set_some_volatility(MANAGER, 250).unwrap();
        assert_eq!(
            engine.set_high_volatility(MANAGER, 200),
            Err(EngineError::InvalidThresholds(ThresholdError::HighBelowSomeVolatility))
        );
        assert_eq!(engine.thresholds().high_volatility, 900);
        engine.set_high_volatility(MANAGER, 300).unwrap();
        assert_eq!(engine.thresholds().high_volatility, 300);

        engine.set_high_volatility(MANAGER, 400).unwrap();
        assert_eq!(
            engine.set_extreme_volatility(MANAGER, 399),
            Err(EngineError::InvalidThresholds(ThresholdError::ExtremeBelowHighVolatility))
        );
        engine.set_extreme_volatility(MANAGER, 500).unwrap();
        assert_eq!(engine.thresholds().extreme_volatility, 500);
    }

    #[test]
    fn trigger_setter_is_atomic() {
        let mut engine = engine();
        assert_eq!(
            engine.set_triggers(MANAGER, 8000, 7500, 7000, 8001),
            Err(EngineError::InvalidThresholds(ThresholdError::SimulateNotAboveOver))
        );
        assert_eq!(engine.thresholds(), &Thresholds::default());

        engine.set_triggers(MANAGER, 9000, 8100, 8000, 8200).unwrap();
        let t = engine.thresholds();
        assert_eq!(
            (t.simulate, t.normal_threshold, t.under_inventory_threshold, t.over_inventory_threshold),
            (9000, 8100, 8000, 8200)
        );
    }

    #[test]
    fn percentages_and_scalar_setters() {
        let mut engine = engine();
        assert_eq!(
            engine.set_percentages(MANAGER, 100, 0, 0),
            Err(EngineError::InvalidThresholds(ThresholdError::InvalidBaseHighPct))
        );
        engine.set_percentages(MANAGER, 100, 200, 300).unwrap();
        assert_eq!(engine.thresholds().limit_reserve_pct, 300);

        assert!(engine.set_price_change_threshold(MANAGER, 10_000).is_err());
        engine.set_price_change_threshold(MANAGER, 50).unwrap();
        assert!(engine.set_dtr_delta(MANAGER, 10_001).is_err());
        engine.set_dtr_delta(MANAGER, 5_000).unwrap();
        assert!(engine.set_deposit_token_unused_threshold(MANAGER, 99).is_err());
        engine.set_deposit_token_unused_threshold(MANAGER, 300).unwrap();
        engine.set_min_time_between_rebalances(MANAGER, 3_600).unwrap();

        let t = engine.thresholds();
        assert_eq!(
            (t.price_change_threshold, t.dtr_delta, t.deposit_token_unused_threshold),
            (50, 5_000, 300)
        );
        assert_eq!(engine.min_time_between_rebalances(), 3_600);
    }

    #[test]
    fn unauthorized_setters_change_nothing() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_dtr_delta(STRANGER, 1),
            Err(EngineError::Unauthorized { .. })
        ));
        assert!(engine.set_vault(STRANGER, None).is_err());
        assert!(engine.vault().is_some());
        assert!(engine.set_decimals(STRANGER, 6, 18).is_err());
        assert_eq!(engine.decimals(), (18, 18));
        assert!(matches!(
            engine.set_decimals(MANAGER, 6, 39),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn limit_range_follows_deposit_side() {
        let mut engine = engine();
        engine.set_allow_token1(MANAGER, true).unwrap();
        let eval = engine.decide(input(10_000, 10, 1_000, Volatility::None));
        match eval.action {
            Action::Rebalanced(params) => {
                assert_eq!(params.limit, TickRange { lower: -540, upper: 0 });
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn snapshot_reflects_engine() {
        let mut engine = engine();
        engine.decide(input(10_000, 0, 1_000, Volatility::None));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, State::OverInventory);
        assert_eq!(snapshot.last_status, Some(DecideStatus::Normal));
        assert!(snapshot.to_message("pos").contains("state: OverInventory"));
    }

    #[test]
    fn decide_with_uses_supplied_thresholds() {
        let mut engine = engine();
        engine.decide(input(10_000, 0, 1_000, Volatility::None));

        let eval = engine.decide(input(10_000, 60, 10_000, Volatility::None));
        assert_eq!(eval.status, DecideStatus::NoNeed);

        let tight = Thresholds {
            price_change_threshold: 50,
            ..Thresholds::default()
        };
        let eval = engine.decide_with(&tight, input(10_000, 60, 10_001, Volatility::None));
        assert_eq!((eval.status, eval.state), (DecideStatus::Normal, State::OverInventory));
        assert_eq!(engine.last_rebalance_tick(), 60);
        assert_eq!(engine.thresholds(), &Thresholds::default());
    }
}
