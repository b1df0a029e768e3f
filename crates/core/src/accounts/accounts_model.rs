//! Account domain models.
//!
//! Accounts are owned by the manual-entry side of the application; broker
//! sync only reads them to resolve mappings and currencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain model representing a local account.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
