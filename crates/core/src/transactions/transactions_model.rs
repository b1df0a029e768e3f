//! Transaction domain models.
//!
//! Transactions carry both the entry amount and the running balance after the
//! entry, so the latest balance of an account is the balance of its newest
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::{Error, Result};

/// Domain model representing one transaction on a local account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub description: String,
    pub amount: Decimal,
    /// Account balance after this entry.
    pub balance: Decimal,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input model for creating a new transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: String,
    pub description: String,
    pub amount: Decimal,
    pub balance: Decimal,
    pub transaction_date: NaiveDate,
}

impl NewTransaction {
    /// Validates the new transaction data.
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "accountId".to_string(),
            )));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Transaction description cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}
