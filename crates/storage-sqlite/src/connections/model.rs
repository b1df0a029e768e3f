//! Database model for broker connections.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use formue_core::connections::BrokerConnection;

use crate::utils::{format_datetime, parse_datetime};

/// Database model for broker connections
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::broker_connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BrokerConnectionDB {
    pub id: String,
    pub user_id: String,
    pub broker_type: String,
    pub country: Option<String>,
    pub username: Option<String>,
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_active: bool,
    pub last_sync_at: Option<String>,
    pub last_sync_status: Option<String>,
    pub last_sync_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BrokerConnectionDB> for BrokerConnection {
    fn from(db: BrokerConnectionDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            broker_type: db.broker_type,
            country: db.country,
            username: db.username,
            app_key: db.app_key,
            app_secret: db.app_secret,
            redirect_uri: db.redirect_uri,
            access_token: db.access_token,
            refresh_token: db.refresh_token,
            is_active: db.is_active,
            last_sync_at: db.last_sync_at.as_deref().map(parse_datetime),
            last_sync_status: db.last_sync_status,
            last_sync_error: db.last_sync_error,
            created_at: parse_datetime(&db.created_at),
            updated_at: parse_datetime(&db.updated_at),
        }
    }
}

impl From<BrokerConnection> for BrokerConnectionDB {
    fn from(domain: BrokerConnection) -> Self {
        Self {
            id: domain.id,
            user_id: domain.user_id,
            broker_type: domain.broker_type,
            country: domain.country,
            username: domain.username,
            app_key: domain.app_key,
            app_secret: domain.app_secret,
            redirect_uri: domain.redirect_uri,
            access_token: domain.access_token,
            refresh_token: domain.refresh_token,
            is_active: domain.is_active,
            last_sync_at: domain.last_sync_at.map(format_datetime),
            last_sync_status: domain.last_sync_status,
            last_sync_error: domain.last_sync_error,
            created_at: format_datetime(domain.created_at),
            updated_at: format_datetime(domain.updated_at),
        }
    }
}
