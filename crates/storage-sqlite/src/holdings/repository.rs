//! Repository for holdings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use formue_core::errors::Result;
use formue_core::holdings::{Holding, HoldingRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::holdings;
use crate::utils::format_datetime;

use super::model::HoldingDB;

/// Repository for synced position snapshots.
pub struct HoldingRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl HoldingRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl HoldingRepositoryTrait for HoldingRepository {
    /// Inserts the holding or, when (account, symbol) already exists,
    /// replaces the snapshot columns in place, keeping the original row id.
    async fn upsert(&self, holding: Holding) -> Result<Holding> {
        self.writer
            .exec(move |conn| {
                let db: HoldingDB = holding.into();

                diesel::insert_into(holdings::table)
                    .values(&db)
                    .on_conflict((holdings::account_id, holdings::symbol))
                    .do_update()
                    .set((
                        holdings::name.eq(&db.name),
                        holdings::quantity.eq(&db.quantity),
                        holdings::average_price.eq(&db.average_price),
                        holdings::current_price.eq(&db.current_price),
                        holdings::market_value.eq(&db.market_value),
                        holdings::currency.eq(&db.currency),
                        holdings::instrument_type.eq(&db.instrument_type),
                        holdings::synced_at.eq(&db.synced_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(db.into())
            })
            .await
    }

    /// Deletes holdings of the account not touched by the current pass.
    async fn delete_stale(&self, account_id: &str, since: DateTime<Utc>) -> Result<usize> {
        let account_owned = account_id.to_string();
        let since_str = format_datetime(since);
        self.writer
            .exec(move |conn| {
                let affected = diesel::delete(
                    holdings::table
                        .filter(holdings::account_id.eq(account_owned))
                        .filter(holdings::synced_at.lt(since_str)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)?;

        let results = holdings::table
            .filter(holdings::account_id.eq(account_id))
            .select(HoldingDB::as_select())
            .order(holdings::symbol.asc())
            .load::<HoldingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }
}
