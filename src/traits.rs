//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Storage abstraction for the ledger state
///
/// The hosting platform owns persistence. Implementations hand out the
/// last committed state and replace it wholesale on commit, so a failed
/// operation never leaves a partially written record behind.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Load the last committed state, or `None` before genesis
    async fn load_state(&self) -> LedgerResult<Option<LedgerState>>;

    /// Atomically replace the committed state
    async fn save_state(&mut self, state: &LedgerState) -> LedgerResult<()>;

    /// Get a single account by address
    async fn get_account(&self, address: &Address) -> LedgerResult<Option<Account>>;

    /// List every account ever referenced
    async fn list_accounts(&self) -> LedgerResult<Vec<Account>>;
}

/// Rates produced by a rate adjustment policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedRates {
    pub exchange_rate: BigDecimal,
    pub yield_rate_per_block: BigDecimal,
}

/// Strategy used by the scheduler to recompute rates at a checkpoint
///
/// Implementations should return strictly positive rates representable at
/// the ledger scale. Anything else is ignored at that checkpoint: the
/// previous rates stay in force and the scheduler moves on to the next one.
pub trait RateAdjustmentPolicy: Send + Sync {
    /// Short name used in logs and events
    fn name(&self) -> &str;

    /// Compute the rates that apply from this checkpoint on
    fn adjust(&self, state: &LedgerState) -> AdjustedRates;
}

/// Receives committed ledger events
///
/// Observers run only after the new state has been persisted, so they can
/// never see a half-applied operation.
pub trait LedgerObserver: Send + Sync {
    fn on_event(&self, event: &crate::ledger::LedgerEvent);
}
