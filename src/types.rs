//! Core types and data structures for the bonding ledger

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::validation::validate_address;

/// Block height supplied by the hosting platform; the ledger's only notion of time
pub type BlockHeight = u64;

/// Number of decimal places carried by every balance, counter and rate
pub const SCALE: i64 = 18;

/// The smallest representable amount (10^-18 of a whole unit)
pub fn smallest_unit() -> BigDecimal {
    BigDecimal::new(1.into(), SCALE)
}

/// Convert an integer count of smallest units into a whole-unit amount
pub fn from_smallest_units(units: u128) -> BigDecimal {
    BigDecimal::new(units.into(), SCALE)
}

/// Truncate toward zero to the ledger scale; any residue is dropped
pub fn truncate_to_scale(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(SCALE, RoundingMode::Down)
}

/// Whether the amount fits the ledger scale without losing precision.
///
/// Decided from the digit layout alone: rescaling a value such as `1e50000000`
/// would expand its mantissa to tens of millions of digits.
pub fn is_representable(value: &BigDecimal) -> bool {
    value.fractional_digit_count() <= SCALE
        || value.normalized().fractional_digit_count() <= SCALE
}

/// The two fungible balances tracked per account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Primary asset ("sire"), issued by genesis allocation and the bonding exchange
    Primary,
    /// Secondary asset ("relic"), issued only by yield accrual
    Secondary,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Primary => write!(f, "sire"),
            Asset::Secondary => write!(f, "relic"),
        }
    }
}

/// Authenticated account address supplied by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create a validated address
    pub fn new(address: impl Into<String>) -> LedgerResult<Self> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Per-call context: who is calling and at which block height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Authenticated caller
    pub sender: Address,
    /// Height of the block the call is sequenced in
    pub height: BlockHeight,
}

impl CallContext {
    pub fn new(sender: Address, height: BlockHeight) -> Self {
        Self { sender, height }
    }
}

/// Per-account balances and accrual cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Address the account is keyed by
    pub address: Address,
    /// Primary ("sire") balance
    pub primary_balance: BigDecimal,
    /// Secondary ("relic") balance
    pub secondary_balance: BigDecimal,
    /// Height of the most recent successful accrual; `None` means never minted
    pub last_mint_height: Option<BlockHeight>,
}

impl Account {
    /// Create an empty account that has never minted
    pub fn new(address: Address) -> Self {
        Self {
            address,
            primary_balance: BigDecimal::from(0),
            secondary_balance: BigDecimal::from(0),
            last_mint_height: None,
        }
    }

    /// Balance held in the given asset
    pub fn balance(&self, asset: Asset) -> &BigDecimal {
        match asset {
            Asset::Primary => &self.primary_balance,
            Asset::Secondary => &self.secondary_balance,
        }
    }

    pub(crate) fn balance_mut(&mut self, asset: Asset) -> &mut BigDecimal {
        match asset {
            Asset::Primary => &mut self.primary_balance,
            Asset::Secondary => &mut self.secondary_balance,
        }
    }
}

/// The authoritative ledger record: every account plus the global counters.
///
/// Mutated only through the exchange, transfer, accrual and scheduler
/// operations; the orchestrator threads a working copy through each call
/// and persists it only when the call succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Height the ledger was created at; baseline for first-ever accruals
    pub genesis_height: BlockHeight,
    /// Highest block height any write has been sequenced at
    pub last_height: BlockHeight,
    /// All accounts ever referenced, never deleted
    pub accounts: BTreeMap<Address, Account>,
    /// Sum of all primary balances
    pub total_primary_supply: BigDecimal,
    /// Sum of all secondary balances
    pub total_secondary_supply: BigDecimal,
    /// Cumulative native currency accepted by the exchange
    pub ether_collected: BigDecimal,
    /// Hard ceiling on `ether_collected`
    pub max_ether_cap: BigDecimal,
    /// Primary units issued per unit of native currency
    pub exchange_rate: BigDecimal,
    /// Secondary units issued per primary unit per elapsed block
    pub yield_rate_per_block: BigDecimal,
    /// Gate on the exchange
    pub exchange_available: bool,
    /// Height at which the rate scheduler next fires
    pub next_adjustment_height: BlockHeight,
    /// Blocks between scheduler checkpoints
    pub adjustment_period: BlockHeight,
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient {asset} balance: needed {needed}, available {available}")]
    InsufficientBalance {
        asset: Asset,
        needed: BigDecimal,
        available: BigDecimal,
    },
    #[error("Exchange cap exceeded: requested {requested}, remaining {remaining}")]
    ExchangeCapExceeded {
        requested: BigDecimal,
        remaining: BigDecimal,
    },
    #[error("Exchange is not available")]
    ExchangeUnavailable,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Block height {height} precedes last sequenced height {last}")]
    BlockHeightRegression {
        height: BlockHeight,
        last: BlockHeight,
    },
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    #[error("Ledger has not been initialized")]
    NotInitialized,
    #[error("Ledger is already initialized")]
    AlreadyInitialized,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_truncate_to_scale_drops_residue() {
        let value = BigDecimal::from_str("1.0000000000000000019").unwrap();
        let truncated = truncate_to_scale(&value);
        assert_eq!(truncated, BigDecimal::from_str("1.000000000000000001").unwrap());
        assert!(!is_representable(&value));
        assert!(is_representable(&truncated));
    }

    #[test]
    fn test_representability_from_digit_layout() {
        assert!(is_representable(&BigDecimal::from_str("1e50000000").unwrap()));
        assert!(is_representable(
            &BigDecimal::from_str("2.500000000000000000000000").unwrap()
        ));
        assert!(!is_representable(&BigDecimal::from_str("1e-50000000").unwrap()));
        assert!(is_representable(&BigDecimal::from(0)));
    }

    #[test]
    fn test_smallest_units() {
        let one = from_smallest_units(1_000_000_000_000_000_000);
        assert_eq!(one, BigDecimal::from(1));
        assert_eq!(from_smallest_units(1), smallest_unit());
    }

    #[test]
    fn test_account_balance_selection() {
        let mut account = Account::new(Address::new("alice").unwrap());
        *account.balance_mut(Asset::Secondary) += BigDecimal::from(5);

        assert_eq!(account.balance(Asset::Primary), &BigDecimal::from(0));
        assert_eq!(account.balance(Asset::Secondary), &BigDecimal::from(5));
        assert_eq!(account.last_mint_height, None);
    }

    #[test]
    fn test_asset_display() {
        assert_eq!(Asset::Primary.to_string(), "sire");
        assert_eq!(Asset::Secondary.to_string(), "relic");
    }
}
