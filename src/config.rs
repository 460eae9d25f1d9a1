//! Configuration for the ledger's genesis parameters and rate schedule

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;
use crate::utils::validation::{validate_address, validate_amount, validate_rate};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// Genesis allocation
    pub genesis: GenesisConfig,

    /// Bonding exchange parameters
    pub exchange: ExchangeConfig,

    /// Yield accrual parameters
    pub accrual: AccrualConfig,

    /// Rate adjustment schedule
    pub adjustment: AdjustmentConfig,
}

/// Genesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Account receiving the initial primary allocation
    pub owner: String,

    /// Primary units credited to the owner at genesis
    pub initial_allocation: BigDecimal,

    /// Block height the ledger is created at
    pub height: BlockHeight,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            initial_allocation: BigDecimal::from(33333),
            height: 0,
        }
    }
}

/// Bonding exchange configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Primary units issued per unit of native currency
    pub rate: BigDecimal,

    /// Hard ceiling on native currency the exchange will accept
    pub max_ether: BigDecimal,

    /// Whether the exchange is open at genesis
    pub available: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            rate: BigDecimal::from(1000),
            max_ether: BigDecimal::from(5000),
            available: true,
        }
    }
}

/// Yield accrual configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualConfig {
    /// Secondary units per primary unit per block
    pub yield_rate_per_block: BigDecimal,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            // 1.667 relic per 100 sire per block
            yield_rate_per_block: BigDecimal::new(1667.into(), 5),
        }
    }
}

/// Rate adjustment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    /// Blocks between checkpoints, at least 1
    pub period_blocks: BlockHeight,

    /// Policy applied at each checkpoint
    pub policy: PolicyConfig,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            period_blocks: 5760, // ~1 day of 15s blocks
            policy: PolicyConfig::Fixed,
        }
    }
}

/// Which rate adjustment policy to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Keep the current rates at every checkpoint
    Fixed,
    /// Decay the exchange rate with the remaining cap and the yield rate
    /// with the secondary share of supply
    CapDepletion {
        min_exchange_rate: BigDecimal,
        min_yield_rate: BigDecimal,
    },
}

impl LedgerConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> LedgerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(content)
            .map_err(|e| LedgerError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then apply environment overrides
    pub fn from_env() -> LedgerResult<Self> {
        let mut config = LedgerConfig::default();

        if let Ok(owner) = std::env::var("SIRE_LEDGER_OWNER") {
            config.genesis.owner = owner;
        }

        if let Ok(rate) = std::env::var("SIRE_LEDGER_EXCHANGE_RATE") {
            config.exchange.rate = parse_decimal("SIRE_LEDGER_EXCHANGE_RATE", &rate)?;
        }

        if let Ok(cap) = std::env::var("SIRE_LEDGER_MAX_ETHER") {
            config.exchange.max_ether = parse_decimal("SIRE_LEDGER_MAX_ETHER", &cap)?;
        }

        if let Ok(rate) = std::env::var("SIRE_LEDGER_YIELD_RATE") {
            config.accrual.yield_rate_per_block = parse_decimal("SIRE_LEDGER_YIELD_RATE", &rate)?;
        }

        if let Ok(period) = std::env::var("SIRE_LEDGER_ADJUSTMENT_PERIOD") {
            config.adjustment.period_blocks = period.parse().map_err(|e| {
                LedgerError::Config(format!("SIRE_LEDGER_ADJUSTMENT_PERIOD: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can produce a valid genesis state
    pub fn validate(&self) -> LedgerResult<()> {
        validate_address(&self.genesis.owner)
            .map_err(|e| LedgerError::Config(format!("genesis.owner: {}", e)))?;
        validate_amount(&self.genesis.initial_allocation)
            .map_err(|e| LedgerError::Config(format!("genesis.initial_allocation: {}", e)))?;
        validate_amount(&self.exchange.max_ether)
            .map_err(|e| LedgerError::Config(format!("exchange.max_ether: {}", e)))?;
        validate_rate("exchange.rate", &self.exchange.rate)
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        validate_rate("accrual.yield_rate_per_block", &self.accrual.yield_rate_per_block)
            .map_err(|e| LedgerError::Config(e.to_string()))?;

        if self.adjustment.period_blocks == 0 {
            return Err(LedgerError::Config(
                "adjustment.period_blocks must be at least 1".to_string(),
            ));
        }

        if let PolicyConfig::CapDepletion {
            min_exchange_rate,
            min_yield_rate,
        } = &self.adjustment.policy
        {
            validate_rate("min_exchange_rate", min_exchange_rate)
                .map_err(|e| LedgerError::Config(e.to_string()))?;
            validate_rate("min_yield_rate", min_yield_rate)
                .map_err(|e| LedgerError::Config(e.to_string()))?;
        }

        Ok(())
    }
}

fn parse_decimal(name: &str, value: &str) -> LedgerResult<BigDecimal> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| LedgerError::Config(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.genesis.initial_allocation, BigDecimal::from(33333));
        assert_eq!(config.exchange.rate, BigDecimal::from(1000));
        assert_eq!(
            config.accrual.yield_rate_per_block,
            BigDecimal::from_str("0.01667").unwrap()
        );
        assert_eq!(config.adjustment.policy, PolicyConfig::Fixed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial_override() {
        let config = LedgerConfig::from_toml(
            r#"
            [genesis]
            owner = "founder"
            initial_allocation = "100"

            [exchange]
            max_ether = "2"

            [adjustment]
            period_blocks = 10
            policy = { kind = "cap_depletion", min_exchange_rate = "1", min_yield_rate = "0.0001" }
            "#,
        )
        .unwrap();

        assert_eq!(config.genesis.owner, "founder");
        assert_eq!(config.genesis.initial_allocation, BigDecimal::from(100));
        assert_eq!(config.exchange.max_ether, BigDecimal::from(2));
        assert_eq!(config.exchange.rate, BigDecimal::from(1000));
        assert_eq!(config.adjustment.period_blocks, 10);
        assert!(matches!(
            config.adjustment.policy,
            PolicyConfig::CapDepletion { .. }
        ));
    }

    #[test]
    fn test_rejects_zero_period() {
        let result = LedgerConfig::from_toml("[adjustment]\nperiod_blocks = 0\n");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let mut config = LedgerConfig::default();
        config.exchange.rate = BigDecimal::from(0);
        assert!(config.validate().is_err());
    }
}
