//! Database model for sync history.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use formue_core::sync_history::{SyncHistory, SyncHistoryStatus};

use crate::utils::{format_datetime, parse_datetime};

/// Database model for sync history records
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::broker_sync_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncHistoryDB {
    pub id: String,
    pub connection_id: String,
    pub status: String,
    pub accounts_synced: i32,
    pub positions_synced: i32,
    pub error_message: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

fn parse_status(raw: &str) -> SyncHistoryStatus {
    match raw {
        "success" => SyncHistoryStatus::Success,
        "error" => SyncHistoryStatus::Error,
        _ => SyncHistoryStatus::Started,
    }
}

impl From<SyncHistoryDB> for SyncHistory {
    fn from(db: SyncHistoryDB) -> Self {
        Self {
            id: db.id,
            connection_id: db.connection_id,
            status: parse_status(&db.status),
            accounts_synced: db.accounts_synced,
            positions_synced: db.positions_synced,
            error_message: db.error_message,
            started_at: parse_datetime(&db.started_at),
            completed_at: db.completed_at.as_deref().map(parse_datetime),
        }
    }
}

impl From<SyncHistory> for SyncHistoryDB {
    fn from(domain: SyncHistory) -> Self {
        Self {
            id: domain.id,
            connection_id: domain.connection_id,
            status: domain.status.as_str().to_string(),
            accounts_synced: domain.accounts_synced,
            positions_synced: domain.positions_synced,
            error_message: domain.error_message,
            started_at: format_datetime(domain.started_at),
            completed_at: domain.completed_at.map(format_datetime),
        }
    }
}
