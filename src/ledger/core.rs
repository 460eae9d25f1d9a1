//! Main ledger orchestrator that sequences calls against the stored state

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::ledger::{
    Accrual, ExchangeModule, RateAdjustment, RateAdjustmentScheduler, TransferProcessor,
    YieldAccrualEngine,
};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_height;

/// What a committed call changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    Deposited {
        sender: Address,
        native_value: BigDecimal,
        primary_minted: BigDecimal,
    },
    Transferred {
        asset: Asset,
        from: Address,
        to: Address,
        amount: BigDecimal,
    },
    Minted {
        caller: Address,
        target: Address,
        secondary_minted: BigDecimal,
    },
    RatesAdjusted(RateAdjustment),
}

/// Notification emitted after a call has been committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: Uuid,
    pub height: BlockHeight,
    pub recorded_at: DateTime<Utc>,
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    fn new(height: BlockHeight, kind: LedgerEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            height,
            recorded_at: Utc::now(),
            kind,
        }
    }
}

/// Main ledger system: sequences calls, commits state, notifies observers.
///
/// Every write follows the same path: load the committed state, run the
/// rate scheduler and the operation against a working copy, save the copy,
/// then tell observers. A failure anywhere before the save drops the copy,
/// so nothing partial is ever persisted or observed.
pub struct Ledger<S: LedgerStorage> {
    storage: S,
    exchange: ExchangeModule,
    transfers: TransferProcessor,
    accrual: YieldAccrualEngine,
    scheduler: RateAdjustmentScheduler,
    observers: Vec<Box<dyn LedgerObserver>>,
}

impl<S: LedgerStorage> Ledger<S> {
    /// Open the ledger, creating genesis if storage holds no state yet.
    ///
    /// An existing state is never reset; the configuration then only
    /// selects the rate policy.
    pub async fn open(mut storage: S, config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;

        if storage.load_state().await?.is_none() {
            let state = LedgerState::genesis(config)?;
            storage.save_state(&state).await?;
            tracing::info!(
                owner = %config.genesis.owner,
                allocation = %config.genesis.initial_allocation,
                height = state.genesis_height,
                "Ledger genesis created"
            );
        }

        Ok(Self::with_scheduler(
            storage,
            RateAdjustmentScheduler::from_config(config),
        ))
    }

    /// Create genesis, failing if storage already holds a ledger
    pub async fn initialize(storage: S, config: &LedgerConfig) -> LedgerResult<Self> {
        if storage.load_state().await?.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }
        Self::open(storage, config).await
    }

    /// Attach to initialized storage with a custom scheduler
    pub fn with_scheduler(storage: S, scheduler: RateAdjustmentScheduler) -> Self {
        Self {
            storage,
            exchange: ExchangeModule::new(),
            transfers: TransferProcessor::new(),
            accrual: YieldAccrualEngine::new(),
            scheduler,
            observers: Vec::new(),
        }
    }

    /// Register an observer for committed events
    pub fn subscribe(&mut self, observer: Box<dyn LedgerObserver>) {
        self.observers.push(observer);
    }

    /// Borrow the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn state(&self) -> LedgerResult<LedgerState> {
        self.storage
            .load_state()
            .await?
            .ok_or(LedgerError::NotInitialized)
    }

    /// Run `op` against a working copy and commit it on success
    async fn execute<T, F>(&mut self, ctx: &CallContext, op: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LedgerState, &mut Vec<LedgerEventKind>) -> LedgerResult<T>,
    {
        let mut working = self.state().await?;
        let mut events = Vec::new();

        let outcome = (|| {
            validate_height(&working, ctx.height)?;
            if let Some(adjustment) = self.scheduler.maybe_fire(&mut working, ctx.height)? {
                events.push(LedgerEventKind::RatesAdjusted(adjustment));
            }
            op(&mut working, &mut events)
        })();

        let value = match outcome {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    sender = %ctx.sender,
                    height = ctx.height,
                    error = %err,
                    "Call rejected"
                );
                return Err(err);
            }
        };

        working.observe_height(ctx.height);
        self.storage.save_state(&working).await?;

        for kind in events {
            let event = LedgerEvent::new(ctx.height, kind);
            for observer in &self.observers {
                observer.on_event(&event);
            }
        }

        Ok(value)
    }

    // Write operations
    /// Exchange native currency for primary units; returns the amount minted
    pub async fn deposit(
        &mut self,
        ctx: &CallContext,
        native_value: &BigDecimal,
    ) -> LedgerResult<BigDecimal> {
        let exchange = self.exchange;
        let minted = self
            .execute(ctx, |state, events| {
                let minted = exchange.deposit(state, ctx, native_value)?;
                events.push(LedgerEventKind::Deposited {
                    sender: ctx.sender.clone(),
                    native_value: native_value.clone(),
                    primary_minted: minted.clone(),
                });
                Ok(minted)
            })
            .await?;

        tracing::info!(
            sender = %ctx.sender,
            height = ctx.height,
            native_value = %native_value,
            minted = %minted,
            "Deposit committed"
        );
        Ok(minted)
    }

    /// Move `amount` of `asset` from the caller to `to`
    pub async fn transfer(
        &mut self,
        ctx: &CallContext,
        asset: Asset,
        to: &Address,
        amount: &BigDecimal,
    ) -> LedgerResult<()> {
        let transfers = self.transfers;
        self.execute(ctx, |state, events| {
            transfers.transfer(state, ctx, asset, to, amount)?;
            events.push(LedgerEventKind::Transferred {
                asset,
                from: ctx.sender.clone(),
                to: to.clone(),
                amount: amount.clone(),
            });
            Ok(())
        })
        .await?;

        tracing::debug!(
            asset = %asset,
            from = %ctx.sender,
            to = %to,
            amount = %amount,
            "Transfer committed"
        );
        Ok(())
    }

    /// Accrue yield for `target`; any caller may trigger it
    pub async fn mint(&mut self, ctx: &CallContext, target: &Address) -> LedgerResult<BigDecimal> {
        let accrual = self.accrual;
        let minted = self
            .execute(ctx, |state, events| {
                let minted = accrual.mint(state, ctx, target)?;
                events.push(LedgerEventKind::Minted {
                    caller: ctx.sender.clone(),
                    target: target.clone(),
                    secondary_minted: minted.clone(),
                });
                Ok(minted)
            })
            .await?;

        tracing::info!(
            caller = %ctx.sender,
            account = %target,
            height = ctx.height,
            minted = %minted,
            "Mint committed"
        );
        Ok(minted)
    }

    // Read operations
    /// Current balance of `address` in `asset`
    pub async fn balance_of(&self, asset: Asset, address: &Address) -> LedgerResult<BigDecimal> {
        Ok(self
            .storage
            .get_account(address)
            .await?
            .map(|account| account.balance(asset).clone())
            .unwrap_or_else(|| BigDecimal::from(0)))
    }

    /// Circulating supply of `asset`
    pub async fn total_supply(&self, asset: Asset) -> LedgerResult<BigDecimal> {
        Ok(self.state().await?.total_supply(asset).clone())
    }

    pub async fn ether_collected(&self) -> LedgerResult<BigDecimal> {
        Ok(self.state().await?.ether_collected)
    }

    pub async fn max_ether_cap(&self) -> LedgerResult<BigDecimal> {
        Ok(self.state().await?.max_ether_cap)
    }

    pub async fn exchange_available(&self) -> LedgerResult<bool> {
        Ok(self.state().await?.exchange_available)
    }

    pub async fn next_adjustment_height(&self) -> LedgerResult<BlockHeight> {
        Ok(self.state().await?.next_adjustment_height)
    }

    pub async fn yield_rate_per_block(&self) -> LedgerResult<BigDecimal> {
        Ok(self.state().await?.yield_rate_per_block)
    }

    pub async fn exchange_rate(&self) -> LedgerResult<BigDecimal> {
        Ok(self.state().await?.exchange_rate)
    }

    /// Accrual cursor of `address`; `None` if it has never minted
    pub async fn last_mint_height(&self, address: &Address) -> LedgerResult<Option<BlockHeight>> {
        Ok(self
            .storage
            .get_account(address)
            .await?
            .and_then(|account| account.last_mint_height))
    }

    /// Highest block height any write has been sequenced at
    pub async fn current_height(&self) -> LedgerResult<BlockHeight> {
        Ok(self.state().await?.last_height)
    }

    /// Every account ever referenced
    pub async fn accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts().await
    }

    /// Yield `address` would receive if minted at `height`
    pub async fn pending_yield(
        &self,
        address: &Address,
        height: BlockHeight,
    ) -> LedgerResult<Accrual> {
        let state = self.state().await?;
        Ok(self.accrual.preview(&state, address, height))
    }

    /// Everything a dashboard shows for one account, read from one state
    pub async fn dashboard(&self, address: &Address) -> LedgerResult<DashboardSnapshot> {
        let state = self.state().await?;

        Ok(DashboardSnapshot {
            address: address.clone(),
            primary_balance: state.balance_of(Asset::Primary, address),
            secondary_balance: state.balance_of(Asset::Secondary, address),
            last_mint_height: state.last_mint_height(address),
            ether_collected: state.ether_collected.clone(),
            max_ether_cap: state.max_ether_cap.clone(),
            exchange_available: state.exchange_available,
            primary_in_circulation: state.total_primary_supply.clone(),
            secondary_in_circulation: state.total_secondary_supply.clone(),
            current_height: state.last_height,
            exchange_rate: state.exchange_rate.clone(),
            next_adjustment_height: state.next_adjustment_height,
            yield_rate_per_block: state.yield_rate_per_block.clone(),
        })
    }

    /// Validate the integrity of the ledger
    pub async fn validate_integrity(&self) -> LedgerResult<LedgerIntegrityReport> {
        let state = self.state().await?;
        let issues = state.invariant_violations();

        let sum_primary: BigDecimal = state.accounts.values().map(|a| &a.primary_balance).sum();
        let sum_secondary: BigDecimal =
            state.accounts.values().map(|a| &a.secondary_balance).sum();

        Ok(LedgerIntegrityReport {
            height: state.last_height,
            is_valid: issues.is_empty(),
            issues,
            account_count: state.accounts.len(),
            sum_primary_balances: sum_primary,
            total_primary_supply: state.total_primary_supply,
            sum_secondary_balances: sum_secondary,
            total_secondary_supply: state.total_secondary_supply,
            ether_collected: state.ether_collected,
            max_ether_cap: state.max_ether_cap,
        })
    }
}

/// Read model behind the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub address: Address,
    pub primary_balance: BigDecimal,
    pub secondary_balance: BigDecimal,
    pub last_mint_height: Option<BlockHeight>,
    pub ether_collected: BigDecimal,
    pub max_ether_cap: BigDecimal,
    pub exchange_available: bool,
    pub primary_in_circulation: BigDecimal,
    pub secondary_in_circulation: BigDecimal,
    pub current_height: BlockHeight,
    pub exchange_rate: BigDecimal,
    pub next_adjustment_height: BlockHeight,
    pub yield_rate_per_block: BigDecimal,
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub height: BlockHeight,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub account_count: usize,
    pub sum_primary_balances: BigDecimal,
    pub total_primary_supply: BigDecimal,
    pub sum_secondary_balances: BigDecimal,
    pub total_secondary_supply: BigDecimal,
    pub ether_collected: BigDecimal,
    pub max_ether_cap: BigDecimal,
}
