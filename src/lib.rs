//! # Sire Ledger
//!
//! A two-asset balance ledger driven by block height: a primary asset
//! ("sire") issued through a capped, fixed-rate ether exchange, and a
//! secondary asset ("relic") minted as yield on held primary balance.
//!
//! ## Features
//!
//! - **Bonding exchange**: native currency converts to sire at the current rate, all-or-nothing under a hard cap
//! - **Transfers**: one conservation-preserving transfer path for both assets
//! - **Yield accrual**: relic minted as `balance × elapsed blocks × rate`, tracked by a per-account cursor
//! - **Rate scheduling**: pluggable policy fired at block-height checkpoints
//! - **Atomic commits**: every call commits fully or not at all; observers only see committed events
//! - **Storage abstraction**: the hosting platform supplies persistence through a trait
//!
//! ## Quick Start
//!
//! ```rust
//! use sire_ledger::{Address, Asset, CallContext, Ledger, LedgerConfig};
//! use sire_ledger::utils::MemoryStorage;
//! use bigdecimal::BigDecimal;
//!
//! # async fn run() -> sire_ledger::LedgerResult<()> {
//! let mut ledger = Ledger::open(MemoryStorage::new(), &LedgerConfig::default()).await?;
//! let owner = Address::new("owner")?;
//!
//! ledger.deposit(&CallContext::new(owner.clone(), 1), &BigDecimal::from(1)).await?;
//! assert_eq!(ledger.balance_of(Asset::Primary, &owner).await?, BigDecimal::from(34333));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
