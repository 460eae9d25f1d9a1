//! Balance transfers between accounts

use bigdecimal::BigDecimal;

use crate::types::*;
use crate::utils::validation::validate_amount;

/// Moves primary or secondary balances between accounts.
///
/// One implementation serves both assets; the `Asset` tag picks the field.
/// Supply is never touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferProcessor;

impl TransferProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Debit the caller and credit `to`.
    ///
    /// All checks run before any balance moves, so a rejected transfer
    /// leaves the state untouched. A zero amount is a no-op that still
    /// materialises the recipient account.
    pub fn transfer(
        &self,
        state: &mut LedgerState,
        ctx: &CallContext,
        asset: Asset,
        to: &Address,
        amount: &BigDecimal,
    ) -> LedgerResult<()> {
        validate_amount(amount)?;

        let available = state.balance_of(asset, &ctx.sender);
        if available < *amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                needed: amount.clone(),
                available,
            });
        }

        // A missing sender can only get here with a zero amount
        if let Some(sender) = state.accounts.get_mut(&ctx.sender) {
            *sender.balance_mut(asset) -= amount;
        }
        *state.account_entry(to).balance_mut(asset) += amount;

        Ok(())
    }
}
