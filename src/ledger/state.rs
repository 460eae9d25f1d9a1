//! Ledger state construction, lookups and invariant checks

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

use crate::config::LedgerConfig;
use crate::types::*;

impl LedgerState {
    /// Build the genesis state from a validated configuration
    pub fn genesis(config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;

        let owner = Address::new(config.genesis.owner.clone())?;
        let genesis_height = config.genesis.height;

        let mut state = Self {
            genesis_height,
            last_height: genesis_height,
            accounts: BTreeMap::new(),
            total_primary_supply: BigDecimal::from(0),
            total_secondary_supply: BigDecimal::from(0),
            ether_collected: BigDecimal::from(0),
            max_ether_cap: config.exchange.max_ether.clone(),
            exchange_rate: config.exchange.rate.clone(),
            yield_rate_per_block: config.accrual.yield_rate_per_block.clone(),
            exchange_available: config.exchange.available,
            next_adjustment_height: genesis_height.saturating_add(config.adjustment.period_blocks),
            adjustment_period: config.adjustment.period_blocks,
        };
        state.credit(Asset::Primary, &owner, &config.genesis.initial_allocation);

        Ok(state)
    }

    /// Look up an account without creating it
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Get an account, creating an empty one on first reference
    pub(crate) fn account_entry(&mut self, address: &Address) -> &mut Account {
        self.accounts
            .entry(address.clone())
            .or_insert_with(|| Account::new(address.clone()))
    }

    /// Balance of an address; unknown addresses hold nothing
    pub fn balance_of(&self, asset: Asset, address: &Address) -> BigDecimal {
        self.account(address)
            .map(|account| account.balance(asset).clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Circulating supply of an asset
    pub fn total_supply(&self, asset: Asset) -> &BigDecimal {
        match asset {
            Asset::Primary => &self.total_primary_supply,
            Asset::Secondary => &self.total_secondary_supply,
        }
    }

    fn total_supply_mut(&mut self, asset: Asset) -> &mut BigDecimal {
        match asset {
            Asset::Primary => &mut self.total_primary_supply,
            Asset::Secondary => &mut self.total_secondary_supply,
        }
    }

    /// Accrual cursor of an address
    pub fn last_mint_height(&self, address: &Address) -> Option<BlockHeight> {
        self.account(address).and_then(|account| account.last_mint_height)
    }

    /// Native currency the exchange can still accept
    pub fn remaining_cap(&self) -> BigDecimal {
        &self.max_ether_cap - &self.ether_collected
    }

    /// Issue new units of `asset` to `address`, keeping supply in step.
    ///
    /// Shared by genesis, the exchange and yield accrual.
    pub(crate) fn credit(&mut self, asset: Asset, address: &Address, amount: &BigDecimal) {
        *self.account_entry(address).balance_mut(asset) += amount;
        *self.total_supply_mut(asset) += amount;
    }

    /// Record that a write was sequenced at `height`
    pub(crate) fn observe_height(&mut self, height: BlockHeight) {
        if height > self.last_height {
            self.last_height = height;
        }
    }

    /// Describe every violated invariant; empty when the state is sound
    pub fn invariant_violations(&self) -> Vec<String> {
        let zero = BigDecimal::from(0);
        let mut issues = Vec::new();

        for asset in [Asset::Primary, Asset::Secondary] {
            let sum: BigDecimal = self
                .accounts
                .values()
                .map(|account| account.balance(asset))
                .sum();
            if &sum != self.total_supply(asset) {
                issues.push(format!(
                    "Sum of {} balances {} does not match total supply {}",
                    asset,
                    sum,
                    self.total_supply(asset)
                ));
            }
            if *self.total_supply(asset) < zero {
                issues.push(format!("Total {} supply is negative", asset));
            }
        }

        if self.ether_collected > self.max_ether_cap {
            issues.push(format!(
                "Ether collected {} exceeds cap {}",
                self.ether_collected, self.max_ether_cap
            ));
        }

        if self.ether_collected < zero {
            issues.push("Ether collected is negative".to_string());
        }

        for account in self.accounts.values() {
            if account.primary_balance < zero || account.secondary_balance < zero {
                issues.push(format!("Account {} has a negative balance", account.address));
            }
            if let Some(height) = account.last_mint_height {
                if height > self.last_height {
                    issues.push(format!(
                        "Account {} minted at {} beyond last sequenced height {}",
                        account.address, height, self.last_height
                    ));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> Address {
        Address::new(name).unwrap()
    }

    #[test]
    fn test_genesis_allocates_owner() {
        let state = LedgerState::genesis(&LedgerConfig::default()).unwrap();

        assert_eq!(
            state.balance_of(Asset::Primary, &addr("owner")),
            BigDecimal::from(33333)
        );
        assert_eq!(state.total_primary_supply, BigDecimal::from(33333));
        assert_eq!(state.total_secondary_supply, BigDecimal::from(0));
        assert_eq!(state.next_adjustment_height, 5760);
        assert_eq!(state.last_mint_height(&addr("owner")), None);
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn test_unknown_account_reads_zero() {
        let state = LedgerState::genesis(&LedgerConfig::default()).unwrap();
        assert_eq!(
            state.balance_of(Asset::Secondary, &addr("nobody")),
            BigDecimal::from(0)
        );
        assert!(state.account(&addr("nobody")).is_none());
    }

    #[test]
    fn test_invariant_violations_detects_drift() {
        let mut state = LedgerState::genesis(&LedgerConfig::default()).unwrap();
        state.total_primary_supply = BigDecimal::from(1);
        state.ether_collected = &state.max_ether_cap + BigDecimal::from(1);

        let issues = state.invariant_violations();
        assert_eq!(issues.len(), 2);
    }
}
