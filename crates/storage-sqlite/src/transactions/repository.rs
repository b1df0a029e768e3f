//! Repository for transactions.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;

use formue_core::errors::Result;
use formue_core::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::utils::parse_decimal;

use super::model::TransactionDB;

/// Repository for the transaction ledger.
pub struct TransactionRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    /// Balance of the newest transaction on the account.
    ///
    /// Newest by creation time, with the id as a tie breaker for entries
    /// created in the same microsecond.
    fn get_latest_balance(&self, account_id: &str) -> Result<Option<Decimal>> {
        let mut conn = get_connection(&self.pool)?;

        let latest = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .order((transactions::created_at.desc(), transactions::id.desc()))
            .select(transactions::balance)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(latest.map(|raw| parse_decimal(&raw)))
    }

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        new_transaction.validate()?;

        self.writer
            .exec(move |conn| {
                let transaction = Transaction {
                    id: uuid::Uuid::new_v4().to_string(),
                    account_id: new_transaction.account_id,
                    description: new_transaction.description,
                    amount: new_transaction.amount,
                    balance: new_transaction.balance,
                    transaction_date: new_transaction.transaction_date,
                    created_at: Utc::now(),
                };
                let db: TransactionDB = transaction.into();

                diesel::insert_into(transactions::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(db.into())
            })
            .await
    }
}
