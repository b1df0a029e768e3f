//! Repository trait for sync history.

use async_trait::async_trait;

use super::sync_history_model::SyncHistory;
use crate::errors::Result;

/// Persistence for sync attempt audit records.
///
/// One `start` is paired with exactly one `complete` or `fail` per attempt.
#[async_trait]
pub trait SyncHistoryRepositoryTrait: Send + Sync {
    /// Opens a new record in `started` state.
    async fn start(&self, connection_id: &str) -> Result<SyncHistory>;

    /// Closes the record as `success` with the attempt's counts.
    async fn complete(
        &self,
        history_id: &str,
        accounts_synced: i32,
        positions_synced: i32,
    ) -> Result<()>;

    /// Closes the record as `error` with a human-readable message.
    async fn fail(&self, history_id: &str, error_message: &str) -> Result<()>;

    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<SyncHistory>>;
}
