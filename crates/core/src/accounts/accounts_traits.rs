//! Repository trait for account lookups.

use super::accounts_model::Account;
use crate::errors::Result;

/// Read-only access to local accounts.
///
/// Account CRUD lives outside the sync subsystem; sync only resolves the
/// accounts that mappings point at.
pub trait AccountRepositoryTrait: Send + Sync {
    fn get_by_id(&self, account_id: &str) -> Result<Account>;
}
