//! In-memory fakes for the store traits and the broker seam.
//!
//! Shared by several test binaries; not every binary uses every fake.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use formue_broker_sync::brokers::BrokerClient;
use formue_broker_sync::orchestrator::ConnectionAuthenticator;
use formue_broker_sync::{
    BrokerSession, BrokerSyncError, ExternalAccount, ExternalLedger, ExternalPosition, SessionAuth,
};
use formue_core::connections::{
    BrokerConnection, ConnectionRepositoryTrait, ConnectionSyncStatus, NewBrokerConnection,
};
use formue_core::errors::{DatabaseError, Error};
use formue_core::holdings::{Holding, HoldingRepositoryTrait};
use formue_core::mappings::{AccountMapping, MappingRepositoryTrait, NewAccountMapping};
use formue_core::sync_history::{SyncHistory, SyncHistoryRepositoryTrait, SyncHistoryStatus};
use formue_core::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};

pub fn test_connection(id: &str, broker_type: &str) -> BrokerConnection {
    let now = Utc::now();
    BrokerConnection {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        broker_type: broker_type.to_string(),
        country: Some("dk".to_string()),
        username: None,
        app_key: None,
        app_secret: None,
        redirect_uri: None,
        access_token: None,
        refresh_token: None,
        is_active: true,
        last_sync_at: None,
        last_sync_status: None,
        last_sync_error: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_mapping(connection_id: &str, account_id: &str, external_id: &str) -> AccountMapping {
    let now = Utc::now();
    AccountMapping {
        id: Uuid::new_v4().to_string(),
        connection_id: connection_id.to_string(),
        account_id: account_id.to_string(),
        external_account_id: external_id.to_string(),
        external_account_name: None,
        auto_sync: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn position(symbol: &str, market_value: Decimal) -> ExternalPosition {
    ExternalPosition {
        symbol: symbol.to_string(),
        name: Some(symbol.to_string()),
        quantity: Decimal::ONE,
        average_price: market_value,
        current_price: market_value,
        market_value,
        currency: "DKK".to_string(),
        instrument_type: Some("stock".to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store fakes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryConnections {
    inner: Mutex<HashMap<String, BrokerConnection>>,
}

impl InMemoryConnections {
    pub fn with(connection: BrokerConnection) -> Arc<Self> {
        let store = Self::default();
        store
            .inner
            .lock()
            .unwrap()
            .insert(connection.id.clone(), connection);
        Arc::new(store)
    }

    pub fn snapshot(&self, id: &str) -> Option<BrokerConnection> {
        self.inner.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for InMemoryConnections {
    fn get_by_id(&self, connection_id: &str) -> Result<BrokerConnection, Error> {
        self.inner
            .lock()
            .unwrap()
            .get(connection_id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(connection_id.to_string())))
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<BrokerConnection>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new_connection: NewBrokerConnection) -> Result<BrokerConnection, Error> {
        new_connection.validate()?;
        let now = Utc::now();
        let connection = BrokerConnection {
            id: Uuid::new_v4().to_string(),
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
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .unwrap()
            .insert(connection.id.clone(), connection.clone());
        Ok(connection)
    }

    async fn delete(&self, connection_id: &str) -> Result<usize, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .remove(connection_id)
            .map(|_| 1)
            .unwrap_or(0))
    }

    async fn update_sync_status(
        &self,
        connection_id: &str,
        status: ConnectionSyncStatus,
        error_message: Option<String>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let connection = inner
            .get_mut(connection_id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(connection_id.to_string())))?;
        connection.last_sync_at = Some(Utc::now());
        connection.last_sync_status = Some(status.as_str().to_string());
        connection.last_sync_error = error_message;
        Ok(())
    }

    async fn update_tokens(
        &self,
        connection_id: &str,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let connection = inner
            .get_mut(connection_id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(connection_id.to_string())))?;
        connection.access_token = access_token;
        if refresh_token.is_some() {
            connection.refresh_token = refresh_token;
        }
        Ok(())
    }

    async fn update_app_credentials(
        &self,
        connection_id: &str,
        app_key: String,
        app_secret: Option<String>,
        redirect_uri: String,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let connection = inner
            .get_mut(connection_id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(connection_id.to_string())))?;
        connection.app_key = Some(app_key);
        connection.app_secret = app_secret;
        connection.redirect_uri = Some(redirect_uri);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMappings {
    inner: Mutex<Vec<AccountMapping>>,
}

impl InMemoryMappings {
    pub fn with(mappings: Vec<AccountMapping>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(mappings),
        })
    }
}

#[async_trait]
impl MappingRepositoryTrait for InMemoryMappings {
    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<AccountMapping>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.connection_id == connection_id)
            .cloned()
            .collect())
    }

    fn get_by_external_id(
        &self,
        connection_id: &str,
        external_account_id: &str,
    ) -> Result<Option<AccountMapping>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .find(|m| {
                m.connection_id == connection_id && m.external_account_id == external_account_id
            })
            .cloned())
    }

    fn list_auto_sync(&self, connection_id: &str) -> Result<Vec<AccountMapping>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.connection_id == connection_id && m.auto_sync)
            .cloned()
            .collect())
    }

    async fn create(&self, new_mapping: NewAccountMapping) -> Result<AccountMapping, Error> {
        new_mapping.validate()?;
        let now = Utc::now();
        let mapping = AccountMapping {
            id: Uuid::new_v4().to_string(),
            connection_id: new_mapping.connection_id,
            account_id: new_mapping.account_id,
            external_account_id: new_mapping.external_account_id,
            external_account_name: new_mapping.external_account_name,
            auto_sync: new_mapping.auto_sync,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().push(mapping.clone());
        Ok(mapping)
    }

    async fn delete(&self, mapping_id: &str) -> Result<usize, Error> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.len();
        inner.retain(|m| m.id != mapping_id);
        Ok(before - inner.len())
    }
}

#[derive(Default)]
pub struct InMemoryHoldings {
    inner: Mutex<Vec<Holding>>,
}

impl InMemoryHoldings {
    pub fn with(holdings: Vec<Holding>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(holdings),
        })
    }

    pub fn snapshot(&self, account_id: &str) -> Vec<Holding> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HoldingRepositoryTrait for InMemoryHoldings {
    async fn upsert(&self, holding: Holding) -> Result<Holding, Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.retain(|h| !(h.account_id == holding.account_id && h.symbol == holding.symbol));
        inner.push(holding.clone());
        Ok(holding)
    }

    async fn delete_stale(
        &self,
        account_id: &str,
        since: chrono::DateTime<Utc>,
    ) -> Result<usize, Error> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.len();
        inner.retain(|h| h.account_id != account_id || h.synced_at >= since);
        Ok(before - inner.len())
    }

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Holding>, Error> {
        Ok(self.snapshot(account_id))
    }
}

#[derive(Default)]
pub struct InMemoryTransactions {
    inner: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactions {
    pub fn with_balance(account_id: &str, balance: Decimal) -> Arc<Self> {
        let store = Self::default();
        store.inner.lock().unwrap().push(Transaction {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            description: "Opening balance".to_string(),
            amount: balance,
            balance,
            transaction_date: Utc::now().date_naive(),
            created_at: Utc::now(),
        });
        Arc::new(store)
    }

    pub fn snapshot(&self, account_id: &str) -> Vec<Transaction> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryTransactions {
    fn get_latest_balance(&self, account_id: &str) -> Result<Option<Decimal>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == account_id)
            .last()
            .map(|t| t.balance))
    }

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        new_transaction.validate()?;
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            account_id: new_transaction.account_id,
            description: new_transaction.description,
            amount: new_transaction.amount,
            balance: new_transaction.balance,
            transaction_date: new_transaction.transaction_date,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().push(transaction.clone());
        Ok(transaction)
    }
}

#[derive(Default)]
pub struct InMemorySyncHistory {
    inner: Mutex<Vec<SyncHistory>>,
}

impl InMemorySyncHistory {
    pub fn records(&self) -> Vec<SyncHistory> {
        self.inner.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncHistoryRepositoryTrait for InMemorySyncHistory {
    async fn start(&self, connection_id: &str) -> Result<SyncHistory, Error> {
        let record = SyncHistory {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            status: SyncHistoryStatus::Started,
            accounts_synced: 0,
            positions_synced: 0,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
        };
        self.inner.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn complete(
        &self,
        history_id: &str,
        accounts_synced: i32,
        positions_synced: i32,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .iter_mut()
            .find(|r| r.id == history_id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(history_id.to_string())))?;
        record.status = SyncHistoryStatus::Success;
        record.accounts_synced = accounts_synced;
        record.positions_synced = positions_synced;
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn fail(&self, history_id: &str, error_message: &str) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .iter_mut()
            .find(|r| r.id == history_id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(history_id.to_string())))?;
        record.status = SyncHistoryStatus::Error;
        record.error_message = Some(error_message.to_string());
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    fn list_by_connection(&self, connection_id: &str) -> Result<Vec<SyncHistory>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.connection_id == connection_id)
            .cloned()
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Broker seam fakes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeBrokerClient {
    pub accounts: Vec<ExternalAccount>,
    pub positions: HashMap<String, Vec<ExternalPosition>>,
    pub ledgers: HashMap<String, Vec<ExternalLedger>>,
    pub failing_positions: HashSet<String>,
    pub failing_ledgers: HashSet<String>,
}

#[async_trait]
impl BrokerClient for FakeBrokerClient {
    async fn get_accounts(
        &self,
        _session: &BrokerSession,
    ) -> Result<Vec<ExternalAccount>, BrokerSyncError> {
        Ok(self.accounts.clone())
    }

    async fn get_positions(
        &self,
        _session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalPosition>, BrokerSyncError> {
        if self.failing_positions.contains(account_id) {
            return Err(BrokerSyncError::Api {
                status: 500,
                body: "backend unavailable".to_string(),
            });
        }
        Ok(self.positions.get(account_id).cloned().unwrap_or_default())
    }

    async fn get_ledgers(
        &self,
        _session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalLedger>, BrokerSyncError> {
        if self.failing_ledgers.contains(account_id) {
            return Err(BrokerSyncError::Api {
                status: 502,
                body: "ledger backend unavailable".to_string(),
            });
        }
        Ok(self.ledgers.get(account_id).cloned().unwrap_or_default())
    }

    async fn validate_session(
        &self,
        session: &BrokerSession,
    ) -> Result<bool, BrokerSyncError> {
        Ok(!session.is_expired())
    }
}

/// Canned authenticator: either hands out the fake client with a live
/// session or fails like a rejected login.
pub struct FakeAuthenticator {
    client: Arc<FakeBrokerClient>,
    fail_with: Option<String>,
}

impl FakeAuthenticator {
    pub fn succeeding(client: Arc<FakeBrokerClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            fail_with: None,
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            client: Arc::new(FakeBrokerClient::default()),
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl ConnectionAuthenticator for FakeAuthenticator {
    async fn authenticate(
        &self,
        _connection: &BrokerConnection,
    ) -> Result<(Arc<dyn BrokerClient>, BrokerSession), BrokerSyncError> {
        if let Some(message) = &self.fail_with {
            return Err(BrokerSyncError::AuthFailed(message.clone()));
        }
        Ok((
            self.client.clone() as Arc<dyn BrokerClient>,
            BrokerSession::with_ttl(
                SessionAuth::OAuth {
                    access_token: "test-token".to_string(),
                },
                600,
            ),
        ))
    }
}
