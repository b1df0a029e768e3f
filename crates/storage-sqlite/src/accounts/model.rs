//! Database model for accounts.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use formue_core::accounts::Account;

use crate::utils::{format_datetime, parse_datetime};

/// Database model for accounts
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            currency: db.currency,
            is_active: db.is_active,
            created_at: parse_datetime(&db.created_at),
            updated_at: parse_datetime(&db.updated_at),
        }
    }
}

impl From<Account> for AccountDB {
    fn from(domain: Account) -> Self {
        Self {
            id: domain.id,
            user_id: domain.user_id,
            name: domain.name,
            currency: domain.currency,
            is_active: domain.is_active,
            created_at: format_datetime(domain.created_at),
            updated_at: format_datetime(domain.updated_at),
        }
    }
}
