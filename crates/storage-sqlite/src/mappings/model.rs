//! Database model for account mappings.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use formue_core::mappings::AccountMapping;

use crate::utils::{format_datetime, parse_datetime};

/// Database model for account mappings
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::account_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountMappingDB {
    pub id: String,
    pub connection_id: String,
    pub account_id: String,
    pub external_account_id: String,
    pub external_account_name: Option<String>,
    pub auto_sync: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AccountMappingDB> for AccountMapping {
    fn from(db: AccountMappingDB) -> Self {
        Self {
            id: db.id,
            connection_id: db.connection_id,
            account_id: db.account_id,
            external_account_id: db.external_account_id,
            external_account_name: db.external_account_name,
            auto_sync: db.auto_sync,
            created_at: parse_datetime(&db.created_at),
            updated_at: parse_datetime(&db.updated_at),
        }
    }
}

impl From<AccountMapping> for AccountMappingDB {
    fn from(domain: AccountMapping) -> Self {
        Self {
            id: domain.id,
            connection_id: domain.connection_id,
            account_id: domain.account_id,
            external_account_id: domain.external_account_id,
            external_account_name: domain.external_account_name,
            auto_sync: domain.auto_sync,
            created_at: format_datetime(domain.created_at),
            updated_at: format_datetime(domain.updated_at),
        }
    }
}
