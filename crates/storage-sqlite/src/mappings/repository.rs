//! Repository for account mappings.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use formue_core::errors::Result;
use formue_core::mappings::{AccountMapping, MappingRepositoryTrait, NewAccountMapping};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::account_mappings;
use crate::utils::format_datetime;

use super::model::AccountMappingDB;

/// Repository for managing mapping data in the database.
///
/// The unique indexes on (connection, external account) and (connection,
/// local account) surface as unique-violation errors on create.
pub struct MappingRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl MappingRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MappingRepositoryTrait for MappingRepository {
    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<AccountMapping>> {
        let mut conn = get_connection(&self.pool)?;

        let results = account_mappings::table
            .filter(account_mappings::connection_id.eq(connection_id))
            .select(AccountMappingDB::as_select())
            .order(account_mappings::created_at.asc())
            .load::<AccountMappingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(AccountMapping::from).collect())
    }

    fn get_by_external_id(
        &self,
        connection_id: &str,
        external_account_id: &str,
    ) -> Result<Option<AccountMapping>> {
        let mut conn = get_connection(&self.pool)?;

        let result = account_mappings::table
            .filter(account_mappings::connection_id.eq(connection_id))
            .filter(account_mappings::external_account_id.eq(external_account_id))
            .select(AccountMappingDB::as_select())
            .first::<AccountMappingDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(result.map(Into::into))
    }

    fn list_auto_sync(&self, connection_id: &str) -> Result<Vec<AccountMapping>> {
        let mut conn = get_connection(&self.pool)?;

        let results = account_mappings::table
            .filter(account_mappings::connection_id.eq(connection_id))
            .filter(account_mappings::auto_sync.eq(true))
            .select(AccountMappingDB::as_select())
            .order(account_mappings::created_at.asc())
            .load::<AccountMappingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(AccountMapping::from).collect())
    }

    async fn create(&self, new_mapping: NewAccountMapping) -> Result<AccountMapping> {
        new_mapping.validate()?;

        self.writer
            .exec(move |conn| {
                let now = format_datetime(Utc::now());
                let db = AccountMappingDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    connection_id: new_mapping.connection_id,
                    account_id: new_mapping.account_id,
                    external_account_id: new_mapping.external_account_id,
                    external_account_name: new_mapping.external_account_name,
                    auto_sync: new_mapping.auto_sync,
                    created_at: now.clone(),
                    updated_at: now,
                };

                diesel::insert_into(account_mappings::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(db.into())
            })
            .await
    }

    async fn delete(&self, mapping_id: &str) -> Result<usize> {
        let id_owned = mapping_id.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::delete(account_mappings::table.find(id_owned))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
