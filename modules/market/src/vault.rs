//! Vault - conserved pool of deposited campaign budgets
//!
//! Inflow is campaign deposits, outflow is reward payouts; the vault
//! balance is always inflow minus outflow. Deposit changes are built only
//! by campaign creation and payout changes only by reward withdrawal;
//! both are committed inside the caller's atomic batch.

use adrail_core::{AdrailError, AdrailResult, Address, Amount, StateChange};
use adrail_state::{
    account_key, encode_u128, AccountRecord, StateStore, TOTAL_DEPOSITED_KEY, TOTAL_PAID_KEY,
    VAULT_BALANCE_KEY,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Vault over the shared market state
pub struct Vault<S: StateStore> {
    state: Arc<S>,
}

impl<S: StateStore> Clone for Vault<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S: StateStore + 'static> Vault<S> {
    pub fn new(state: Arc<S>) -> Self {
        Self { state }
    }

    /// Current vault balance (deposits minus payouts)
    pub async fn balance(&self) -> AdrailResult<Amount> {
        Ok(Amount::new(self.state.amount_counter(VAULT_BALANCE_KEY).await?))
    }

    /// Sum of all campaign deposits ever made
    pub async fn total_deposited(&self) -> AdrailResult<Amount> {
        Ok(Amount::new(self.state.amount_counter(TOTAL_DEPOSITED_KEY).await?))
    }

    /// Sum of all rewards ever paid out
    pub async fn total_paid(&self) -> AdrailResult<Amount> {
        Ok(Amount::new(self.state.amount_counter(TOTAL_PAID_KEY).await?))
    }

    /// Payout account balance for an address
    pub async fn account_balance(&self, address: &Address) -> AdrailResult<Amount> {
        Ok(Amount::new(self.state.get_balance(address).await?))
    }

    /// Build the state changes for a deposit. Committed by the campaign
    /// creation batch.
    pub(crate) async fn deposit_changes(&self, amount: Amount) -> AdrailResult<Vec<StateChange>> {
        let balance = self.balance().await?;
        let deposited = self.total_deposited().await?;

        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| AdrailError::Internal("vault balance overflow".into()))?;
        let new_deposited = deposited
            .checked_add(amount)
            .ok_or_else(|| AdrailError::Internal("vault deposit counter overflow".into()))?;

        debug!("Vault deposit: {} (balance {} -> {})", amount, balance, new_balance);

        Ok(vec![
            StateChange::set(VAULT_BALANCE_KEY.to_vec(), encode_u128(new_balance.0)),
            StateChange::set(TOTAL_DEPOSITED_KEY.to_vec(), encode_u128(new_deposited.0)),
        ])
    }

    /// Build the state changes for a payout: debit the vault, credit the
    /// recipient's account. Committed by the withdrawal batch.
    pub(crate) async fn pay_out_changes(
        &self,
        recipient: &Address,
        amount: Amount,
    ) -> AdrailResult<Vec<StateChange>> {
        let balance = self.balance().await?;

        // Should never fire while conservation holds; treat as fatal
        // internal inconsistency, not a user error.
        if amount > balance {
            error!(
                "Vault invariant violation: payout {} exceeds balance {}",
                amount, balance
            );
            return Err(AdrailError::InsufficientVaultBalance {
                required: amount.0,
                available: balance.0,
            });
        }

        let paid = self.total_paid().await?;
        let new_paid = paid
            .checked_add(amount)
            .ok_or_else(|| AdrailError::Internal("vault payout counter overflow".into()))?;

        let mut account = self
            .state
            .get_account(recipient)
            .await?
            .unwrap_or_default();
        account.balance = account
            .balance
            .checked_add(amount.0)
            .ok_or_else(|| AdrailError::Internal("account balance overflow".into()))?;

        Ok(vec![
            StateChange::set(
                VAULT_BALANCE_KEY.to_vec(),
                encode_u128(balance.saturating_sub(amount).0),
            ),
            StateChange::set(TOTAL_PAID_KEY.to_vec(), encode_u128(new_paid.0)),
            StateChange::set(account_key(recipient), AccountRecord::new(account.balance).to_bytes()),
        ])
    }
}
