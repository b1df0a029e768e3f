//! Broker protocol adapters.
//!
//! Each adapter speaks one broker's REST surface and maps the responses
//! into the broker-agnostic shapes from [`crate::models`]. Reads share the
//! [`BrokerClient`] trait; login is protocol-specific and lives on the
//! concrete clients.

pub mod nordnet;
pub mod saxo;

use async_trait::async_trait;

use crate::errors::{BrokerSyncError, Result};
use crate::models::{ExternalAccount, ExternalLedger, ExternalPosition};
use crate::session::BrokerSession;

/// Read operations common to all brokers.
///
/// Every method requires a live session and fails fast with
/// [`BrokerSyncError::SessionExpired`] before any network call when the
/// session has lapsed. A 401 from the broker maps to the same error so the
/// orchestrator can decide to re-authenticate.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn get_accounts(&self, session: &BrokerSession) -> Result<Vec<ExternalAccount>>;

    async fn get_positions(
        &self,
        session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalPosition>>;

    async fn get_ledgers(
        &self,
        session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalLedger>>;

    /// Cheap server-side check that the session is still accepted.
    async fn validate_session(&self, session: &BrokerSession) -> Result<bool>;
}

/// Guard shared by every read: expired sessions never reach the network.
pub(crate) fn require_live(session: &BrokerSession) -> Result<()> {
    if session.is_expired() {
        return Err(BrokerSyncError::SessionExpired);
    }
    Ok(())
}
