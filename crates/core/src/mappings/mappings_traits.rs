//! Repository trait for account mappings.

use async_trait::async_trait;

use super::mappings_model::{AccountMapping, NewAccountMapping};
use crate::errors::Result;

/// Persistence for local/external account mappings.
#[async_trait]
pub trait MappingRepositoryTrait: Send + Sync {
    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<AccountMapping>>;

    fn get_by_external_id(
        &self,
        connection_id: &str,
        external_account_id: &str,
    ) -> Result<Option<AccountMapping>>;

    /// Mappings whose accounts are synced automatically on every pass.
    fn list_auto_sync(&self, connection_id: &str) -> Result<Vec<AccountMapping>>;

    async fn create(&self, new_mapping: NewAccountMapping) -> Result<AccountMapping>;

    async fn delete(&self, mapping_id: &str) -> Result<usize>;
}
