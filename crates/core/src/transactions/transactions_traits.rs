//! Repository trait for transactions.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::transactions_model::{NewTransaction, Transaction};
use crate::errors::Result;

/// Access to the transaction ledger of local accounts.
///
/// Broker sync appends reconciling entries; everything else is owned by the
/// manual bookkeeping side of the application.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Balance recorded by the newest transaction on the account, if any.
    fn get_latest_balance(&self, account_id: &str) -> Result<Option<Decimal>>;

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction>;
}
