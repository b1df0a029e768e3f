//! Account mapping domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::{Error, Result};

/// Association between an external broker account and a local account
/// within one connection.
///
/// Unique per (connection, external account) and per (connection, local
/// account); the storage layer enforces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMapping {
    pub id: String,
    pub connection_id: String,
    pub account_id: String,
    pub external_account_id: String,
    /// Display name cached from the broker for the mapping UI.
    pub external_account_name: Option<String>,
    pub auto_sync: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for creating a new mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountMapping {
    pub connection_id: String,
    pub account_id: String,
    pub external_account_id: String,
    pub external_account_name: Option<String>,
    pub auto_sync: bool,
}

impl NewAccountMapping {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("connectionId", &self.connection_id),
            ("accountId", &self.account_id),
            ("externalAccountId", &self.external_account_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(ValidationError::MissingField(
                    field.to_string(),
                )));
            }
        }
        Ok(())
    }
}
