//! Centralized broker sync orchestrator.
//!
//! One invocation authenticates against the connection's broker, walks the
//! auto-sync account mappings, reconciles external positions into local
//! holdings, and leaves an audit trail in sync history. Per-account
//! failures are isolated; authentication and bookkeeping failures are
//! fatal to the attempt.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use formue_core::connections::{
    BrokerConnection, BrokerType, ConnectionRepositoryTrait, ConnectionSyncStatus,
};
use formue_core::holdings::{Holding, HoldingRepositoryTrait};
use formue_core::mappings::{AccountMapping, MappingRepositoryTrait};
use formue_core::sync_history::SyncHistoryRepositoryTrait;
use formue_core::transactions::{NewTransaction, TransactionRepositoryTrait};

use crate::auth::{NordnetAuthService, SaxoAuthService};
use crate::brokers::BrokerClient;
use crate::errors::{BrokerSyncError, Result};
use crate::models::{ExternalAccount, ExternalLedger, ExternalPosition};
use crate::session::BrokerSession;

/// Description used for reconciling transactions appended by sync.
const RECONCILE_DESCRIPTION: &str = "Broker sync adjustment";

/// Counts of one completed sync attempt.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub accounts_synced: usize,
    pub positions_synced: usize,
}

/// Seam between the orchestrator and the per-broker authentication paths.
///
/// Production dispatches to the QR flow or the OAuth flow; tests inject a
/// fake returning a canned client and session.
#[async_trait]
pub trait ConnectionAuthenticator: Send + Sync {
    async fn authenticate(
        &self,
        connection: &BrokerConnection,
    ) -> Result<(Arc<dyn BrokerClient>, BrokerSession)>;
}

/// Production authenticator dispatching on the connection's broker type.
pub struct BrokerAuthDispatcher {
    nordnet: Arc<NordnetAuthService>,
    saxo: Arc<SaxoAuthService>,
}

impl BrokerAuthDispatcher {
    pub fn new(nordnet: Arc<NordnetAuthService>, saxo: Arc<SaxoAuthService>) -> Self {
        Self { nordnet, saxo }
    }
}

#[async_trait]
impl ConnectionAuthenticator for BrokerAuthDispatcher {
    async fn authenticate(
        &self,
        connection: &BrokerConnection,
    ) -> Result<(Arc<dyn BrokerClient>, BrokerSession)> {
        let broker_type = connection
            .broker_type()
            .map_err(|_| BrokerSyncError::UnsupportedBroker(connection.broker_type.clone()))?;
        match broker_type {
            BrokerType::Nordnet => {
                let (client, session) = self.nordnet.authenticate(connection).await?;
                Ok((client as Arc<dyn BrokerClient>, session))
            }
            BrokerType::Saxo => {
                let (client, session) = self.saxo.get_session(connection).await?;
                Ok((client as Arc<dyn BrokerClient>, session))
            }
        }
    }
}

/// Orchestrates broker data synchronization into the local stores.
pub struct SyncOrchestrator {
    connections: Arc<dyn ConnectionRepositoryTrait>,
    mappings: Arc<dyn MappingRepositoryTrait>,
    holdings: Arc<dyn HoldingRepositoryTrait>,
    transactions: Arc<dyn TransactionRepositoryTrait>,
    history: Arc<dyn SyncHistoryRepositoryTrait>,
    authenticator: Arc<dyn ConnectionAuthenticator>,
}

impl SyncOrchestrator {
    pub fn new(
        connections: Arc<dyn ConnectionRepositoryTrait>,
        mappings: Arc<dyn MappingRepositoryTrait>,
        holdings: Arc<dyn HoldingRepositoryTrait>,
        transactions: Arc<dyn TransactionRepositoryTrait>,
        history: Arc<dyn SyncHistoryRepositoryTrait>,
        authenticator: Arc<dyn ConnectionAuthenticator>,
    ) -> Self {
        Self {
            connections,
            mappings,
            holdings,
            transactions,
            history,
            authenticator,
        }
    }

    /// Runs one full sync attempt for the connection.
    ///
    /// Blocks the calling worker for the duration of the attempt, which
    /// includes interactive authentication; callers must treat this as
    /// long-running. The sync-history record opened at the start is closed
    /// exactly once whatever the outcome.
    pub async fn sync_connection(&self, connection_id: &str) -> Result<SyncOutcome> {
        info!("Starting sync for connection {}", connection_id);

        // Opened first so even early failures leave an audit record.
        let history = self.history.start(connection_id).await?;

        let result = self.run_sync(connection_id).await;

        match &result {
            Ok(outcome) => {
                if let Err(e) = self
                    .history
                    .complete(
                        &history.id,
                        outcome.accounts_synced as i32,
                        outcome.positions_synced as i32,
                    )
                    .await
                {
                    error!("Failed to close sync history {}: {}", history.id, e);
                }
            }
            Err(err) => {
                if let Err(e) = self.history.fail(&history.id, &err.to_string()).await {
                    error!("Failed to close sync history {}: {}", history.id, e);
                }
            }
        }

        result
    }

    async fn run_sync(&self, connection_id: &str) -> Result<SyncOutcome> {
        // A missing connection is fatal.
        let connection = self.connections.get_by_id(connection_id)?;

        // Unknown broker types fail before any network or crypto work.
        connection
            .broker_type()
            .map_err(|_| BrokerSyncError::UnsupportedBroker(connection.broker_type.clone()))?;

        // Sync never proceeds without a live session.
        let (client, session) = match self.authenticator.authenticate(&connection).await {
            Ok(pair) => pair,
            Err(err) => {
                warn!(
                    "Authentication failed for connection {}: {}",
                    connection.id, err
                );
                if let Err(e) = self
                    .connections
                    .update_sync_status(
                        &connection.id,
                        ConnectionSyncStatus::AuthFailed,
                        Some(err.to_string()),
                    )
                    .await
                {
                    error!(
                        "Failed to record auth failure on connection {}: {}",
                        connection.id, e
                    );
                }
                return Err(err);
            }
        };

        let mappings = self.mappings.list_auto_sync(&connection.id)?;
        info!(
            "Syncing {} mapped accounts for connection {}",
            mappings.len(),
            connection.id
        );

        let mut outcome = SyncOutcome::default();
        for mapping in &mappings {
            match self.sync_mapping(client.as_ref(), &session, mapping).await {
                Ok(position_count) => {
                    outcome.accounts_synced += 1;
                    outcome.positions_synced += position_count;
                }
                Err(err) => {
                    // One failed account never aborts the batch; only
                    // successful accounts are tallied.
                    warn!(
                        "Sync failed for account {} (external {}): {}",
                        mapping.account_id, mapping.external_account_id, err
                    );
                }
            }
        }

        // Connection-level semantics: the attempt succeeded even if some
        // accounts did not.
        self.connections
            .update_sync_status(&connection.id, ConnectionSyncStatus::Success, None)
            .await?;

        info!(
            "Sync completed for connection {}: {} accounts, {} positions",
            connection.id, outcome.accounts_synced, outcome.positions_synced
        );
        Ok(outcome)
    }

    /// Syncs one mapped account. Returns the number of positions synced.
    async fn sync_mapping(
        &self,
        client: &dyn BrokerClient,
        session: &BrokerSession,
        mapping: &AccountMapping,
    ) -> Result<usize> {
        let positions = client
            .get_positions(session, &mapping.external_account_id)
            .await?;

        // Cash is best-effort: a failed ledger fetch understates the total
        // but does not fail the account.
        let ledgers = match client
            .get_ledgers(session, &mapping.external_account_id)
            .await
        {
            Ok(ledgers) => ledgers,
            Err(err) => {
                warn!(
                    "Ledger fetch failed for account {}, cash will be understated: {}",
                    mapping.account_id, err
                );
                Vec::new()
            }
        };

        let synced_at = Utc::now();
        for position in &positions {
            let holding = Holding {
                id: Uuid::new_v4().to_string(),
                account_id: mapping.account_id.clone(),
                symbol: position.symbol.clone(),
                name: position.name.clone(),
                quantity: position.quantity,
                average_price: position.average_price,
                current_price: position.current_price,
                market_value: position.market_value,
                currency: position.currency.clone(),
                instrument_type: position.instrument_type.clone(),
                synced_at,
            };
            self.holdings.upsert(holding).await?;
        }

        // Rows untouched by this pass no longer exist at the broker.
        let removed = self
            .holdings
            .delete_stale(&mapping.account_id, synced_at)
            .await?;
        if removed > 0 {
            debug!(
                "Removed {} stale holdings from account {}",
                removed, mapping.account_id
            );
        }

        self.reconcile_balance(mapping, &positions, &ledgers).await?;

        Ok(positions.len())
    }

    /// Appends one reconciling transaction when the computed total
    /// (positions plus cash) differs from the account's latest balance.
    async fn reconcile_balance(
        &self,
        mapping: &AccountMapping,
        positions: &[ExternalPosition],
        ledgers: &[ExternalLedger],
    ) -> Result<()> {
        let position_total: Decimal = positions.iter().map(|p| p.market_value).sum();
        let cash_total: Decimal = ledgers.iter().map(|l| l.balance).sum();
        let total = position_total + cash_total;

        let last_balance = self
            .transactions
            .get_latest_balance(&mapping.account_id)?
            .unwrap_or(Decimal::ZERO);

        if total == last_balance {
            return Ok(());
        }

        let delta = total - last_balance;
        debug!(
            "Reconciling account {}: balance {} -> {} (delta {})",
            mapping.account_id, last_balance, total, delta
        );
        self.transactions
            .create(NewTransaction {
                account_id: mapping.account_id.clone(),
                description: RECONCILE_DESCRIPTION.to_string(),
                amount: delta,
                balance: total,
                transaction_date: Utc::now().date_naive(),
            })
            .await?;
        Ok(())
    }

    /// Lists the broker's accounts for the mapping UI.
    ///
    /// Reuses the per-broker authentication path without running a sync.
    pub async fn get_external_accounts(
        &self,
        connection_id: &str,
    ) -> Result<Vec<ExternalAccount>> {
        let connection = self.connections.get_by_id(connection_id)?;
        connection
            .broker_type()
            .map_err(|_| BrokerSyncError::UnsupportedBroker(connection.broker_type.clone()))?;

        let (client, session) = self.authenticator.authenticate(&connection).await?;
        client.get_accounts(&session).await
    }
}
