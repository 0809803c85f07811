//! Martingale stake controller
//!
//! Owns the stake state across trades within a session. Transitions take
//! an explicit timestamp so the martingale debounce window is testable
//! without sleeping. Malformed numeric input clamps to the minimum stake
//! instead of erroring; strict validation belongs to the caller.

use crate::config::StakeConfig;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last transition applied to the stake state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeAction {
    Init,
    Reset,
    Martingale,
}

/// Compounding stake state machine
pub struct StakeController {
    base_stake: Decimal,
    current_stake: Decimal,
    consecutive_losses: u32,
    last_action: StakeAction,
    last_action_at: DateTime<Utc>,
    multiplier: Decimal,
    max_loss_cap: u32,
    min_stake: Decimal,
    debounce: Duration,
}

impl StakeController {
    /// Create a controller seeded from configuration
    pub fn new(config: &StakeConfig, now: DateTime<Utc>) -> Self {
        let min_stake = if config.min_stake > Decimal::ZERO {
            config.min_stake
        } else {
            Decimal::new(35, 2)
        };
        let multiplier = config.multiplier.max(Decimal::ONE);

        let mut controller = Self {
            base_stake: min_stake,
            current_stake: min_stake,
            consecutive_losses: 0,
            last_action: StakeAction::Init,
            last_action_at: now,
            multiplier,
            max_loss_cap: config.max_loss_cap,
            min_stake,
            debounce: Duration::milliseconds(config.debounce_ms as i64),
        };
        controller.init(config.base_stake, now);
        controller
    }

    /// Set the base stake, clamping malformed input to the minimum
    pub fn init(&mut self, value: Decimal, now: DateTime<Utc>) {
        let value = if value > Decimal::ZERO {
            value.max(self.min_stake)
        } else {
            tracing::warn!(%value, "Invalid base stake, clamping to minimum");
            self.min_stake
        };

        self.base_stake = value;
        self.current_stake = value;
        self.consecutive_losses = 0;
        self.last_action = StakeAction::Init;
        self.last_action_at = now;
    }

    /// Return the stake to base after a win
    pub fn reset(&mut self, now: DateTime<Utc>) -> Decimal {
        self.current_stake = self.base_stake;
        self.consecutive_losses = 0;
        self.last_action = StakeAction::Reset;
        self.last_action_at = now;
        self.current_stake
    }

    /// Compound the stake after a loss
    ///
    /// A repeat call inside the debounce window is a no-op; two
    /// notification paths reporting the same settlement must not double
    /// the compounding.
    pub fn martingale(&mut self, loss_hint: Option<u32>, now: DateTime<Utc>) -> Decimal {
        if self.last_action == StakeAction::Martingale
            && now - self.last_action_at < self.debounce
        {
            tracing::debug!("Martingale debounced as duplicate loss notification");
            return self.current_stake;
        }

        let losses = loss_hint.unwrap_or(self.consecutive_losses + 1);
        self.consecutive_losses = losses.min(self.max_loss_cap);

        let compounded = (0..self.consecutive_losses)
            .fold(self.base_stake, |stake, _| stake * self.multiplier);
        self.current_stake = compounded.round_dp(2);
        self.last_action = StakeAction::Martingale;
        self.last_action_at = now;

        tracing::info!(
            losses = self.consecutive_losses,
            stake = %self.current_stake,
            "Stake compounded after loss"
        );
        self.current_stake
    }

    /// Current stake
    pub fn get(&self) -> Decimal {
        self.current_stake
    }

    /// Base stake the compounding starts from
    pub fn base(&self) -> Decimal {
        self.base_stake
    }

    /// Consecutive losses since the last reset
    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    /// Last transition applied
    pub fn last_action(&self) -> StakeAction {
        self.last_action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn controller() -> (StakeController, DateTime<Utc>) {
        let now = Utc::now();
        (StakeController::new(&StakeConfig::default(), now), now)
    }

    #[test]
    fn test_init_sets_base_and_current() {
        let (controller, _) = controller();
        assert_eq!(controller.get(), dec!(0.35));
        assert_eq!(controller.base(), dec!(0.35));
        assert_eq!(controller.consecutive_losses(), 0);
    }

    #[test]
    fn test_martingale_doubles() {
        let (mut controller, now) = controller();

        let stake = controller.martingale(None, now);
        assert_eq!(stake, dec!(0.70));
        assert_eq!(controller.consecutive_losses(), 1);
    }

    #[test]
    fn test_martingale_within_debounce_is_noop() {
        let (mut controller, now) = controller();

        controller.martingale(None, now);
        let stake = controller.martingale(None, now + Duration::milliseconds(500));

        assert_eq!(stake, dec!(0.70));
        assert_eq!(controller.consecutive_losses(), 1);
    }

    #[test]
    fn test_martingale_after_debounce_compounds_again() {
        let (mut controller, now) = controller();

        controller.martingale(None, now);
        let stake = controller.martingale(None, now + Duration::seconds(3));

        assert_eq!(stake, dec!(1.40));
        assert_eq!(controller.consecutive_losses(), 2);
    }

    #[test]
    fn test_reset_restores_base() {
        let (mut controller, now) = controller();

        controller.martingale(None, now);
        controller.martingale(None, now + Duration::seconds(3));
        let stake = controller.reset(now + Duration::seconds(4));

        assert_eq!(stake, dec!(0.35));
        assert_eq!(controller.get(), dec!(0.35));
        assert_eq!(controller.consecutive_losses(), 0);
        assert_eq!(controller.last_action(), StakeAction::Reset);
    }

    #[test]
    fn test_loss_hint_overrides_counter() {
        let (mut controller, now) = controller();

        let stake = controller.martingale(Some(3), now);
        assert_eq!(controller.consecutive_losses(), 3);
        assert_eq!(stake, dec!(2.80)); // 0.35 * 2^3
    }

    #[test]
    fn test_loss_cap_bounds_compounding() {
        let config = StakeConfig {
            max_loss_cap: 4,
            ..Default::default()
        };
        let now = Utc::now();
        let mut controller = StakeController::new(&config, now);

        let stake = controller.martingale(Some(50), now);
        assert_eq!(controller.consecutive_losses(), 4);
        assert_eq!(stake, dec!(5.60)); // 0.35 * 2^4
    }

    #[test]
    fn test_invalid_init_clamps_to_minimum() {
        let (mut controller, now) = controller();

        controller.init(dec!(-5), now);
        assert_eq!(controller.get(), dec!(0.35));

        controller.init(Decimal::ZERO, now);
        assert_eq!(controller.get(), dec!(0.35));
    }

    #[test]
    fn test_init_below_minimum_clamps_up() {
        let (mut controller, now) = controller();

        controller.init(dec!(0.10), now);
        assert_eq!(controller.get(), dec!(0.35));
    }

    #[test]
    fn test_submultiplier_config_clamps_to_one() {
        let config = StakeConfig {
            multiplier: dec!(0.5),
            ..Default::default()
        };
        let now = Utc::now();
        let mut controller = StakeController::new(&config, now);

        let stake = controller.martingale(None, now);
        // Multiplier below 1 would shrink the stake on a loss
        assert_eq!(stake, dec!(0.35));
    }

    #[test]
    fn test_reset_then_martingale_ignores_debounce() {
        let (mut controller, now) = controller();

        controller.martingale(None, now);
        controller.reset(now + Duration::milliseconds(100));
        let stake = controller.martingale(None, now + Duration::milliseconds(200));

        // Debounce only suppresses martingale-after-martingale
        assert_eq!(stake, dec!(0.70));
        assert_eq!(controller.consecutive_losses(), 1);
    }

    #[test]
    fn test_stake_rounded_to_currency_precision() {
        let config = StakeConfig {
            base_stake: dec!(0.33),
            multiplier: dec!(1.5),
            ..Default::default()
        };
        let now = Utc::now();
        let mut controller = StakeController::new(&config, now);

        controller.martingale(None, now);
        let stake = controller.martingale(None, now + Duration::seconds(3));
        // 0.33 * 1.5^2 = 0.7425 -> 0.74
        assert_eq!(stake, dec!(0.74));
    }
}
