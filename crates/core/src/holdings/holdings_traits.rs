//! Repository trait for holdings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::holdings_model::Holding;
use crate::errors::Result;

/// Persistence for synced position snapshots.
#[async_trait]
pub trait HoldingRepositoryTrait: Send + Sync {
    /// Inserts or replaces the holding keyed by (account, symbol).
    async fn upsert(&self, holding: Holding) -> Result<Holding>;

    /// Deletes holdings of the account whose `synced_at` is older than
    /// `since`. Returns the number of rows removed.
    async fn delete_stale(&self, account_id: &str, since: DateTime<Utc>) -> Result<usize>;

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Holding>>;
}
