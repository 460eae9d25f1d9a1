//! Bonding exchange: native currency in, primary asset out

use bigdecimal::BigDecimal;

use crate::types::*;
use crate::utils::validation::validate_amount;

/// Converts deposited native currency into the primary asset at the
/// current exchange rate, up to a hard cap on total ether collected
#[derive(Debug, Default, Clone, Copy)]
pub struct ExchangeModule;

impl ExchangeModule {
    pub fn new() -> Self {
        Self
    }

    /// Price a deposit without applying it
    pub fn quote(&self, state: &LedgerState, native_value: &BigDecimal) -> BigDecimal {
        truncate_to_scale(&(native_value * &state.exchange_rate))
    }

    /// Accept `native_value` from the caller and credit the minted primary units.
    ///
    /// All-or-nothing: a deposit that would push `ether_collected` past the
    /// cap is rejected outright, never clipped to what remains.
    pub fn deposit(
        &self,
        state: &mut LedgerState,
        ctx: &CallContext,
        native_value: &BigDecimal,
    ) -> LedgerResult<BigDecimal> {
        validate_amount(native_value)?;

        if !state.exchange_available {
            return Err(LedgerError::ExchangeUnavailable);
        }

        let remaining = state.remaining_cap();
        if *native_value > remaining {
            return Err(LedgerError::ExchangeCapExceeded {
                requested: native_value.clone(),
                remaining,
            });
        }

        let minted = self.quote(state, native_value);

        state.ether_collected += native_value;
        state.credit(Asset::Primary, &ctx.sender, &minted);

        if state.ether_collected == state.max_ether_cap {
            state.exchange_available = false;
            tracing::info!(
                ether_collected = %state.ether_collected,
                "Exchange cap reached, closing exchange"
            );
        }

        Ok(minted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use std::str::FromStr;

    fn setup(max_ether: i64) -> (LedgerState, CallContext) {
        let mut config = LedgerConfig::default();
        config.exchange.max_ether = BigDecimal::from(max_ether);
        let state = LedgerState::genesis(&config).unwrap();
        let ctx = CallContext::new(Address::new("owner").unwrap(), 1);
        (state, ctx)
    }

    #[test]
    fn test_deposit_credits_rate_times_value() {
        let (mut state, ctx) = setup(10);

        let minted = ExchangeModule::new()
            .deposit(&mut state, &ctx, &BigDecimal::from(1))
            .unwrap();

        assert_eq!(minted, BigDecimal::from(1000));
        assert_eq!(
            state.balance_of(Asset::Primary, &ctx.sender),
            BigDecimal::from(34333)
        );
        assert_eq!(state.ether_collected, BigDecimal::from(1));
        assert_eq!(state.total_primary_supply, BigDecimal::from(34333));
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn test_deposit_over_cap_is_rejected_whole() {
        let (mut state, ctx) = setup(2);
        let before = state.clone();

        let result = ExchangeModule::new().deposit(&mut state, &ctx, &BigDecimal::from(3));

        assert!(matches!(
            result,
            Err(LedgerError::ExchangeCapExceeded { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_filling_cap_closes_exchange() {
        let (mut state, ctx) = setup(2);
        let exchange = ExchangeModule::new();

        exchange
            .deposit(&mut state, &ctx, &BigDecimal::from(2))
            .unwrap();
        assert!(!state.exchange_available);

        let result = exchange.deposit(&mut state, &ctx, &BigDecimal::from_str("0.1").unwrap());
        assert!(matches!(result, Err(LedgerError::ExchangeUnavailable)));
    }

    #[test]
    fn test_negative_deposit_is_invalid() {
        let (mut state, ctx) = setup(2);
        let result = ExchangeModule::new().deposit(&mut state, &ctx, &BigDecimal::from(-1));
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_quote_truncates() {
        let (mut state, _) = setup(2);
        state.exchange_rate = BigDecimal::from_str("0.3").unwrap();
        let quote = ExchangeModule::new()
            .quote(&state, &BigDecimal::from_str("0.000000000000000001").unwrap());
        assert_eq!(quote, BigDecimal::from(0));
    }
}
