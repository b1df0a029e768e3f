//! Repository for sync history persistence.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use formue_core::errors::Result;
use formue_core::sync_history::{SyncHistory, SyncHistoryRepositoryTrait, SyncHistoryStatus};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::broker_sync_history;
use crate::utils::format_datetime;

use super::model::SyncHistoryDB;

/// Repository for sync attempt audit records.
pub struct SyncHistoryRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl SyncHistoryRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncHistoryRepositoryTrait for SyncHistoryRepository {
    async fn start(&self, connection_id: &str) -> Result<SyncHistory> {
        let connection_owned = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let record = SyncHistory {
                    id: uuid::Uuid::new_v4().to_string(),
                    connection_id: connection_owned,
                    status: SyncHistoryStatus::Started,
                    accounts_synced: 0,
                    positions_synced: 0,
                    error_message: None,
                    started_at: Utc::now(),
                    completed_at: None,
                };
                let db: SyncHistoryDB = record.into();

                diesel::insert_into(broker_sync_history::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(db.into())
            })
            .await
    }

    async fn complete(
        &self,
        history_id: &str,
        accounts_synced: i32,
        positions_synced: i32,
    ) -> Result<()> {
        let id_owned = history_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(broker_sync_history::table.find(id_owned))
                    .set((
                        broker_sync_history::status
                            .eq(SyncHistoryStatus::Success.as_str().to_string()),
                        broker_sync_history::accounts_synced.eq(accounts_synced),
                        broker_sync_history::positions_synced.eq(positions_synced),
                        broker_sync_history::completed_at.eq(Some(format_datetime(Utc::now()))),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn fail(&self, history_id: &str, error_message: &str) -> Result<()> {
        let id_owned = history_id.to_string();
        let message_owned = error_message.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(broker_sync_history::table.find(id_owned))
                    .set((
                        broker_sync_history::status
                            .eq(SyncHistoryStatus::Error.as_str().to_string()),
                        broker_sync_history::error_message.eq(Some(message_owned)),
                        broker_sync_history::completed_at.eq(Some(format_datetime(Utc::now()))),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<SyncHistory>> {
        let mut conn = get_connection(&self.pool)?;

        let results = broker_sync_history::table
            .filter(broker_sync_history::connection_id.eq(connection_id))
            .select(SyncHistoryDB::as_select())
            .order(broker_sync_history::started_at.desc())
            .load::<SyncHistoryDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(SyncHistory::from).collect())
    }
}
