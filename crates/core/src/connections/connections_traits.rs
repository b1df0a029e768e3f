//! Repository trait for broker connections.

use async_trait::async_trait;

use super::connections_model::{BrokerConnection, ConnectionSyncStatus, NewBrokerConnection};
use crate::errors::Result;

/// Persistence for broker connections.
///
/// Deleting a connection cascades to its mappings and sync history.
#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    fn get_by_id(&self, connection_id: &str) -> Result<BrokerConnection>;

    fn list_by_user(&self, user_id: &str) -> Result<Vec<BrokerConnection>>;

    async fn create(&self, new_connection: NewBrokerConnection) -> Result<BrokerConnection>;

    async fn delete(&self, connection_id: &str) -> Result<usize>;

    /// Records the outcome of a sync attempt and stamps `last_sync_at`.
    async fn update_sync_status(
        &self,
        connection_id: &str,
        status: ConnectionSyncStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    /// Stores freshly issued OAuth tokens (already encrypted).
    async fn update_tokens(
        &self,
        connection_id: &str,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<()>;

    /// Replaces the OAuth application credentials (secret already encrypted).
    async fn update_app_credentials(
        &self,
        connection_id: &str,
        app_key: String,
        app_secret: Option<String>,
        redirect_uri: String,
    ) -> Result<()>;
}
