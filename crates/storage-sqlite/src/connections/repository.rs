//! Repository for broker connections.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use formue_core::connections::{
    BrokerConnection, ConnectionRepositoryTrait, ConnectionSyncStatus, NewBrokerConnection,
};
use formue_core::errors::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::broker_connections;
use crate::utils::format_datetime;

use super::model::BrokerConnectionDB;

/// Repository for managing broker connection data in the database.
///
/// Deletes cascade to mappings and sync history through the schema's
/// foreign keys.
pub struct ConnectionRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl ConnectionRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for ConnectionRepository {
    fn get_by_id(&self, connection_id: &str) -> Result<BrokerConnection> {
        let mut conn = get_connection(&self.pool)?;

        let connection = broker_connections::table
            .select(BrokerConnectionDB::as_select())
            .find(connection_id)
            .first::<BrokerConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(connection.into())
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<BrokerConnection>> {
        let mut conn = get_connection(&self.pool)?;

        let results = broker_connections::table
            .filter(broker_connections::user_id.eq(user_id))
            .select(BrokerConnectionDB::as_select())
            .order(broker_connections::created_at.asc())
            .load::<BrokerConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(BrokerConnection::from).collect())
    }

    async fn create(&self, new_connection: NewBrokerConnection) -> Result<BrokerConnection> {
        new_connection.validate()?;

        self.writer
            .exec(move |conn| {
                let now = format_datetime(Utc::now());
                let db = BrokerConnectionDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: new_connection.user_id,
                    broker_type: new_connection.broker_type,
                    country: new_connection.country,
                    username: new_connection.username,
                    app_key: new_connection.app_key,
                    app_secret: new_connection.app_secret,
                    redirect_uri: new_connection.redirect_uri,
                    access_token: None,
                    refresh_token: None,
                    is_active: true,
                    last_sync_at: None,
                    last_sync_status: None,
                    last_sync_error: None,
                    created_at: now.clone(),
                    updated_at: now,
                };

                diesel::insert_into(broker_connections::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(db.into())
            })
            .await
    }

    async fn delete(&self, connection_id: &str) -> Result<usize> {
        let id_owned = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::delete(broker_connections::table.find(id_owned))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }

    async fn update_sync_status(
        &self,
        connection_id: &str,
        status: ConnectionSyncStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let id_owned = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = format_datetime(Utc::now());
                diesel::update(broker_connections::table.find(id_owned))
                    .set((
                        broker_connections::last_sync_at.eq(Some(now.clone())),
                        broker_connections::last_sync_status.eq(Some(status.as_str().to_string())),
                        broker_connections::last_sync_error.eq(error_message),
                        broker_connections::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn update_tokens(
        &self,
        connection_id: &str,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<()> {
        let id_owned = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = format_datetime(Utc::now());
                diesel::update(broker_connections::table.find(&id_owned))
                    .set((
                        broker_connections::access_token.eq(access_token),
                        broker_connections::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                // A token response without a new refresh token keeps the
                // old one.
                if let Some(refresh) = refresh_token {
                    diesel::update(broker_connections::table.find(&id_owned))
                        .set(broker_connections::refresh_token.eq(Some(refresh)))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }

    async fn update_app_credentials(
        &self,
        connection_id: &str,
        app_key: String,
        app_secret: Option<String>,
        redirect_uri: String,
    ) -> Result<()> {
        let id_owned = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = format_datetime(Utc::now());
                diesel::update(broker_connections::table.find(id_owned))
                    .set((
                        broker_connections::app_key.eq(Some(app_key)),
                        broker_connections::app_secret.eq(app_secret),
                        broker_connections::redirect_uri.eq(Some(redirect_uri)),
                        // Old tokens were issued to the old app identity.
                        broker_connections::access_token.eq(None::<String>),
                        broker_connections::refresh_token.eq(None::<String>),
                        broker_connections::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
