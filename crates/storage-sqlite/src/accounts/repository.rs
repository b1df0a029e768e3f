//! Repository for account lookups.

use diesel::prelude::*;

use formue_core::accounts::{Account, AccountRepositoryTrait};
use formue_core::errors::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::accounts;

use super::model::AccountDB;

/// Repository for reading account data from the database.
///
/// Account CRUD belongs to the manual bookkeeping side; broker sync only
/// resolves accounts referenced by mappings. `insert` exists so owning
/// code (and fixtures) can seed accounts through the writer.
pub struct AccountRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Inserts an account row as-is.
    pub async fn insert(&self, account: Account) -> Result<Account> {
        self.writer
            .exec(move |conn| {
                let db: AccountDB = account.into();
                diesel::insert_into(accounts::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(db.into())
            })
            .await
    }
}

impl AccountRepositoryTrait for AccountRepository {
    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;

        let account = accounts::table
            .select(AccountDB::as_select())
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(account.into())
    }
}
