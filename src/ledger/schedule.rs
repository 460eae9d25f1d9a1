//! Rate adjustment at fixed block-height checkpoints

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::config::{LedgerConfig, PolicyConfig};
use crate::traits::{AdjustedRates, RateAdjustmentPolicy};
use crate::types::*;
use crate::utils::validation::validate_rate;

/// Keeps the current rates at every checkpoint
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedRatePolicy;

impl RateAdjustmentPolicy for FixedRatePolicy {
    fn name(&self) -> &str {
        "fixed"
    }

    fn adjust(&self, state: &LedgerState) -> AdjustedRates {
        AdjustedRates {
            exchange_rate: state.exchange_rate.clone(),
            yield_rate_per_block: state.yield_rate_per_block.clone(),
        }
    }
}

/// Scales rates down as the ledger matures.
///
/// The exchange rate falls linearly with the share of the ether cap still
/// open; the yield rate follows the primary share of total supply. Both
/// start from the genesis rates and never drop below their floors.
#[derive(Debug, Clone)]
pub struct CapDepletionPolicy {
    pub base_exchange_rate: BigDecimal,
    pub base_yield_rate: BigDecimal,
    pub min_exchange_rate: BigDecimal,
    pub min_yield_rate: BigDecimal,
}

impl RateAdjustmentPolicy for CapDepletionPolicy {
    fn name(&self) -> &str {
        "cap_depletion"
    }

    fn adjust(&self, state: &LedgerState) -> AdjustedRates {
        let zero = BigDecimal::from(0);

        let exchange_rate = if state.max_ether_cap > zero {
            truncate_to_scale(
                &(&self.base_exchange_rate * state.remaining_cap() / &state.max_ether_cap),
            )
        } else {
            zero.clone()
        };

        let total = &state.total_primary_supply + &state.total_secondary_supply;
        let yield_rate_per_block = if total > zero {
            truncate_to_scale(&(&self.base_yield_rate * &state.total_primary_supply / total))
        } else {
            self.base_yield_rate.clone()
        };

        AdjustedRates {
            exchange_rate: exchange_rate.max(self.min_exchange_rate.clone()),
            yield_rate_per_block: yield_rate_per_block.max(self.min_yield_rate.clone()),
        }
    }
}

/// Record of one checkpoint firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateAdjustment {
    pub height: BlockHeight,
    pub policy: String,
    pub previous: AdjustedRates,
    pub current: AdjustedRates,
    pub next_adjustment_height: BlockHeight,
}

/// Fires the configured policy whenever a checkpoint height is reached
pub struct RateAdjustmentScheduler {
    policy: Box<dyn RateAdjustmentPolicy>,
}

impl RateAdjustmentScheduler {
    pub fn new(policy: Box<dyn RateAdjustmentPolicy>) -> Self {
        Self { policy }
    }

    /// Build the scheduler selected by the configuration
    pub fn from_config(config: &LedgerConfig) -> Self {
        let policy: Box<dyn RateAdjustmentPolicy> = match &config.adjustment.policy {
            PolicyConfig::Fixed => Box::new(FixedRatePolicy),
            PolicyConfig::CapDepletion {
                min_exchange_rate,
                min_yield_rate,
            } => Box::new(CapDepletionPolicy {
                base_exchange_rate: config.exchange.rate.clone(),
                base_yield_rate: config.accrual.yield_rate_per_block.clone(),
                min_exchange_rate: min_exchange_rate.clone(),
                min_yield_rate: min_yield_rate.clone(),
            }),
        };
        Self::new(policy)
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Recompute rates if `height` has reached the next checkpoint.
    ///
    /// Fires at most once per checkpoint: the next checkpoint is moved to
    /// `height + period`, strictly past the current height. When the policy
    /// yields a zero, negative or over-precise rate the previous rates stay
    /// in force and only the checkpoint advances, so a faulty policy can
    /// never block later writes.
    pub fn maybe_fire(
        &self,
        state: &mut LedgerState,
        height: BlockHeight,
    ) -> LedgerResult<Option<RateAdjustment>> {
        if height < state.next_adjustment_height {
            return Ok(None);
        }

        if state.adjustment_period == 0 {
            return Err(LedgerError::Validation(
                "Adjustment period must be at least 1 block".to_string(),
            ));
        }

        let next_adjustment_height = height
            .checked_add(state.adjustment_period)
            .ok_or_else(|| {
                LedgerError::Validation("Next adjustment height overflows".to_string())
            })?;

        let current = self.policy.adjust(state);
        if let Err(err) = validate_rate("exchange rate", &current.exchange_rate)
            .and_then(|_| validate_rate("yield rate", &current.yield_rate_per_block))
        {
            state.next_adjustment_height = next_adjustment_height;
            tracing::warn!(
                height,
                policy = self.policy.name(),
                error = %err,
                next_adjustment_height,
                "Policy produced invalid rates, keeping previous rates"
            );
            return Ok(None);
        }

        let previous = AdjustedRates {
            exchange_rate: std::mem::replace(
                &mut state.exchange_rate,
                current.exchange_rate.clone(),
            ),
            yield_rate_per_block: std::mem::replace(
                &mut state.yield_rate_per_block,
                current.yield_rate_per_block.clone(),
            ),
        };
        state.next_adjustment_height = next_adjustment_height;

        tracing::info!(
            height,
            policy = self.policy.name(),
            exchange_rate = %current.exchange_rate,
            yield_rate = %current.yield_rate_per_block,
            next_adjustment_height,
            "Rates adjusted"
        );

        Ok(Some(RateAdjustment {
            height,
            policy: self.policy.name().to_string(),
            previous,
            current,
            next_adjustment_height,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    struct ZeroPolicy;

    impl RateAdjustmentPolicy for ZeroPolicy {
        fn name(&self) -> &str {
            "zero"
        }

        fn adjust(&self, _state: &LedgerState) -> AdjustedRates {
            AdjustedRates {
                exchange_rate: BigDecimal::from(0),
                yield_rate_per_block: BigDecimal::from(1),
            }
        }
    }

    fn state_with_period(period: BlockHeight) -> LedgerState {
        let mut config = LedgerConfig::default();
        config.adjustment.period_blocks = period;
        LedgerState::genesis(&config).unwrap()
    }

    #[test]
    fn test_fires_once_per_checkpoint() {
        let mut state = state_with_period(10);
        let scheduler = RateAdjustmentScheduler::new(Box::new(FixedRatePolicy));

        assert!(scheduler.maybe_fire(&mut state, 9).unwrap().is_none());

        let fired = scheduler.maybe_fire(&mut state, 12).unwrap().unwrap();
        assert_eq!(fired.next_adjustment_height, 22);
        assert_eq!(state.next_adjustment_height, 22);
        assert_eq!(fired.previous, fired.current);

        assert!(scheduler.maybe_fire(&mut state, 12).unwrap().is_none());
        assert!(scheduler.maybe_fire(&mut state, 21).unwrap().is_none());
        assert!(scheduler.maybe_fire(&mut state, 22).unwrap().is_some());
    }

    #[test]
    fn test_zero_rate_keeps_previous_rates() {
        let mut state = state_with_period(1);
        let before = state.clone();
        let scheduler = RateAdjustmentScheduler::new(Box::new(ZeroPolicy));

        let result = scheduler.maybe_fire(&mut state, 1).unwrap();

        assert!(result.is_none());
        assert_eq!(state.exchange_rate, before.exchange_rate);
        assert_eq!(state.yield_rate_per_block, before.yield_rate_per_block);
        assert_eq!(state.next_adjustment_height, 2);

        // The next checkpoint is judged afresh
        assert!(scheduler.maybe_fire(&mut state, 1).unwrap().is_none());
        assert_eq!(state.next_adjustment_height, 2);
    }

    #[test]
    fn test_cap_depletion_scales_rates() {
        let mut state = state_with_period(1);
        state.max_ether_cap = BigDecimal::from(10);
        state.ether_collected = BigDecimal::from(5);
        state.total_secondary_supply = state.total_primary_supply.clone();

        let policy = CapDepletionPolicy {
            base_exchange_rate: BigDecimal::from(1000),
            base_yield_rate: BigDecimal::from_str("0.02").unwrap(),
            min_exchange_rate: BigDecimal::from(1),
            min_yield_rate: BigDecimal::from_str("0.0001").unwrap(),
        };
        let rates = policy.adjust(&state);

        assert_eq!(rates.exchange_rate, BigDecimal::from(500));
        assert_eq!(rates.yield_rate_per_block, BigDecimal::from_str("0.01").unwrap());
    }

    #[test]
    fn test_cap_depletion_respects_floor() {
        let mut state = state_with_period(1);
        state.max_ether_cap = BigDecimal::from(10);
        state.ether_collected = BigDecimal::from(10);

        let policy = CapDepletionPolicy {
            base_exchange_rate: BigDecimal::from(1000),
            base_yield_rate: BigDecimal::from_str("0.02").unwrap(),
            min_exchange_rate: BigDecimal::from(7),
            min_yield_rate: BigDecimal::from_str("0.0001").unwrap(),
        };

        assert_eq!(policy.adjust(&state).exchange_rate, BigDecimal::from(7));
    }

    #[test]
    fn test_from_config_selects_policy() {
        let mut config = LedgerConfig::default();
        assert_eq!(RateAdjustmentScheduler::from_config(&config).policy_name(), "fixed");

        config.adjustment.policy = PolicyConfig::CapDepletion {
            min_exchange_rate: BigDecimal::from(1),
            min_yield_rate: BigDecimal::from_str("0.0001").unwrap(),
        };
        assert_eq!(
            RateAdjustmentScheduler::from_config(&config).policy_name(),
            "cap_depletion"
        );
    }
}
