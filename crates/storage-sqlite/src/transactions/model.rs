//! Database model for transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use formue_core::transactions::Transaction;

use crate::utils::{
    format_date, format_datetime, format_decimal, parse_date, parse_datetime, parse_decimal,
};

/// Database model for transactions
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub account_id: String,
    pub description: String,
    pub amount: String,
    pub balance: String,
    pub transaction_date: String,
    pub created_at: String,
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            description: db.description,
            amount: parse_decimal(&db.amount),
            balance: parse_decimal(&db.balance),
            transaction_date: parse_date(&db.transaction_date),
            created_at: parse_datetime(&db.created_at),
        }
    }
}

impl From<Transaction> for TransactionDB {
    fn from(domain: Transaction) -> Self {
        Self {
            id: domain.id,
            account_id: domain.account_id,
            description: domain.description,
            amount: format_decimal(domain.amount),
            balance: format_decimal(domain.balance),
            transaction_date: format_date(domain.transaction_date),
            created_at: format_datetime(domain.created_at),
        }
    }
}
