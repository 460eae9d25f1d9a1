//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<Option<LedgerState>>>,
}

impl MemoryStorage {
    /// Create a new, uninitialized memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> LedgerResult<Option<LedgerState>> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Option<LedgerState>>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("state lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Option<LedgerState>>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("state lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn load_state(&self) -> LedgerResult<Option<LedgerState>> {
        self.snapshot()
    }

    async fn save_state(&mut self, state: &LedgerState) -> LedgerResult<()> {
        *self.write()? = Some(state.clone());
        Ok(())
    }

    async fn get_account(&self, address: &Address) -> LedgerResult<Option<Account>> {
        Ok(self
            .read()?
            .as_ref()
            .and_then(|state| state.accounts.get(address).cloned()))
    }

    async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        Ok(self
            .read()?
            .as_ref()
            .map(|state| state.accounts.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;

    #[tokio::test]
    async fn test_memory_storage_operations() {
        let mut storage = MemoryStorage::new();
        assert!(storage.load_state().await.unwrap().is_none());
        assert!(storage.list_accounts().await.unwrap().is_empty());

        let state = LedgerState::genesis(&LedgerConfig::default()).unwrap();
        storage.save_state(&state).await.unwrap();

        let owner = Address::new("owner").unwrap();
        let account = storage.get_account(&owner).await.unwrap().unwrap();
        assert_eq!(account.address, owner);
        assert_eq!(storage.list_accounts().await.unwrap().len(), 1);

        // Clones observe the same committed state
        let shared = storage.clone();
        assert_eq!(shared.load_state().await.unwrap(), Some(state));
    }
}
