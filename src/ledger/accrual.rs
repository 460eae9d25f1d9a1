//! Yield accrual: minting secondary balance from held primary balance over
//! elapsed blocks.
//!
//! `minted = primary_balance × elapsed × yield_rate_per_block`
//!
//! where `elapsed` counts blocks since the account's last accrual, or since
//! the ledger's genesis height for an account that has never minted. The
//! reward is linear in both balance and blocks; there is no cap on
//! `elapsed` and no decay.

use bigdecimal::BigDecimal;

use crate::types::*;

/// Result of an accrual computation
#[derive(Debug, Clone, PartialEq)]
pub struct Accrual {
    /// Height the elapsed window starts from
    pub baseline: BlockHeight,
    /// Blocks in the window
    pub elapsed: BlockHeight,
    /// Secondary units earned over the window
    pub minted: BigDecimal,
}

/// Computes and credits secondary-asset yield
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldAccrualEngine;

impl YieldAccrualEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute what `target` would earn at `height` without touching state
    pub fn preview(&self, state: &LedgerState, target: &Address, height: BlockHeight) -> Accrual {
        let baseline = state
            .last_mint_height(target)
            .unwrap_or(state.genesis_height);
        let elapsed = height.saturating_sub(baseline);
        let balance = state.balance_of(Asset::Primary, target);

        let minted = truncate_to_scale(
            &(&balance * BigDecimal::from(elapsed) * &state.yield_rate_per_block),
        );

        Accrual {
            baseline,
            elapsed,
            minted,
        }
    }

    /// Credit `target` with the yield accrued up to `ctx.height`.
    ///
    /// Anyone may trigger accrual for any account; the reward always lands
    /// on the target. The cursor advances even when nothing is minted so a
    /// later balance cannot earn retroactively.
    pub fn mint(
        &self,
        state: &mut LedgerState,
        ctx: &CallContext,
        target: &Address,
    ) -> LedgerResult<BigDecimal> {
        let accrual = self.preview(state, target, ctx.height);
        if ctx.height < accrual.baseline {
            return Err(LedgerError::BlockHeightRegression {
                height: ctx.height,
                last: accrual.baseline,
            });
        }

        state.credit(Asset::Secondary, target, &accrual.minted);
        state.account_entry(target).last_mint_height = Some(ctx.height);

        if accrual.elapsed == 0 {
            tracing::debug!(account = %target, height = ctx.height, "Accrual in same block, nothing minted");
        }

        Ok(accrual.minted)
    }
}
