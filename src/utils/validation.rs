//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is non-negative and fits the ledger scale
pub fn validate_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount < BigDecimal::from(0) {
        return Err(LedgerError::InvalidAmount(format!(
            "Amount cannot be negative: {}",
            amount
        )));
    }

    if !is_representable(amount) {
        return Err(LedgerError::InvalidAmount(format!(
            "Amount {} is finer than the smallest unit (10^-{})",
            amount, SCALE
        )));
    }

    Ok(())
}

/// Validate that a rate is strictly positive and fits the ledger scale
pub fn validate_rate(name: &str, rate: &BigDecimal) -> LedgerResult<()> {
    if *rate <= BigDecimal::from(0) {
        return Err(LedgerError::InvalidRate(format!(
            "{} must be positive, got {}",
            name, rate
        )));
    }

    if !is_representable(rate) {
        return Err(LedgerError::InvalidRate(format!(
            "{} {} is finer than the smallest unit",
            name, rate
        )));
    }

    Ok(())
}

/// Validate that an address is usable as an account key
pub fn validate_address(address: &str) -> LedgerResult<()> {
    if address.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Address cannot be empty".to_string(),
        ));
    }

    if address.len() > 64 {
        return Err(LedgerError::Validation(
            "Address cannot exceed 64 characters".to_string(),
        ));
    }

    // Hex addresses (0x...) and symbolic test names both pass
    if !address
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Address can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Reject writes sequenced before the last height the ledger has seen
pub fn validate_height(state: &LedgerState, height: BlockHeight) -> LedgerResult<()> {
    if height < state.last_height {
        return Err(LedgerError::BlockHeightRegression {
            height,
            last: state.last_height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(&BigDecimal::from(0)).is_ok());
        assert!(validate_amount(&BigDecimal::from_str("0.000000000000000001").unwrap()).is_ok());
        assert!(matches!(
            validate_amount(&BigDecimal::from(-1)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_amount(&BigDecimal::from_str("0.0000000000000000001").unwrap()),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate("exchange rate", &BigDecimal::from(1000)).is_ok());
        assert!(validate_rate("exchange rate", &BigDecimal::from(0)).is_err());
        assert!(validate_rate("yield rate", &BigDecimal::from(-3)).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x627306090abab3a6e1400e9345bc60c78a8bef57").is_ok());
        assert!(validate_address("alice").is_ok());
        assert!(validate_address("   ").is_err());
        assert!(validate_address("bad address").is_err());
        assert!(validate_address(&"a".repeat(65)).is_err());
    }
}
