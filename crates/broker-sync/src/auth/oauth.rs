//! Browser OAuth redirect flow for the OAuth2 broker.
//!
//! The service tracks one pending exchange per connection while the user
//! completes the browser login, exchanges the returned code for tokens,
//! and keeps tokens encrypted at rest. Live sessions are cached in memory
//! and renewed from the refresh token when they lapse.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{info, warn};
use uuid::Uuid;

use formue_core::connections::{BrokerConnection, ConnectionRepositoryTrait};

use crate::brokers::saxo::{SaxoAppCredentials, SaxoClient};
use crate::config::BrokerSyncConfig;
use crate::crypto::CredentialEncryptor;
use crate::errors::{BrokerSyncError, Result};
use crate::session::BrokerSession;

/// Pollable state of a connection's OAuth authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthStatus {
    /// No authorization started and no tokens stored.
    None,
    /// Authorization URL issued; waiting for the redirect.
    Pending,
    /// Tokens are stored or a live session is cached.
    Authenticated,
    /// The last exchange attempt failed.
    Failed,
}

/// One authorization waiting for its redirect.
#[derive(Debug, Clone)]
struct PendingExchange {
    authorize_url: String,
    state: String,
    failed: bool,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

/// Orchestrates OAuth logins for the OAuth2 broker.
pub struct SaxoAuthService {
    config: BrokerSyncConfig,
    encryptor: Arc<CredentialEncryptor>,
    connections: Arc<dyn ConnectionRepositoryTrait>,
    pending: RwLock<HashMap<String, PendingExchange>>,
    sessions: RwLock<HashMap<String, BrokerSession>>,
}

impl SaxoAuthService {
    pub fn new(
        config: BrokerSyncConfig,
        encryptor: Arc<CredentialEncryptor>,
        connections: Arc<dyn ConnectionRepositoryTrait>,
    ) -> Self {
        Self {
            config,
            encryptor,
            connections,
            pending: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn pending_read(&self) -> RwLockReadGuard<'_, HashMap<String, PendingExchange>> {
        self.pending.read().unwrap_or_else(|p| {
            warn!("OAuth pending lock was poisoned, recovering");
            p.into_inner()
        })
    }

    fn pending_write(&self) -> RwLockWriteGuard<'_, HashMap<String, PendingExchange>> {
        self.pending.write().unwrap_or_else(|p| {
            warn!("OAuth pending lock was poisoned, recovering");
            p.into_inner()
        })
    }

    fn sessions_read(&self) -> RwLockReadGuard<'_, HashMap<String, BrokerSession>> {
        self.sessions.read().unwrap_or_else(|p| {
            warn!("OAuth session lock was poisoned, recovering");
            p.into_inner()
        })
    }

    fn sessions_write(&self) -> RwLockWriteGuard<'_, HashMap<String, BrokerSession>> {
        self.sessions.write().unwrap_or_else(|p| {
            warn!("OAuth session lock was poisoned, recovering");
            p.into_inner()
        })
    }

    /// Builds a client from the connection's app credentials, decrypting
    /// the app secret for the duration of the call.
    pub fn client_for(&self, connection: &BrokerConnection) -> Result<SaxoClient> {
        let app_key = connection.app_key.clone().ok_or_else(|| {
            BrokerSyncError::Config("Connection has no app key configured".to_string())
        })?;
        let redirect_uri = connection.redirect_uri.clone().ok_or_else(|| {
            BrokerSyncError::Config("Connection has no redirect URI configured".to_string())
        })?;
        let app_secret = match connection.app_secret.as_deref() {
            Some(encoded) => self
                .encryptor
                .decrypt_from_string(encoded, &connection.user_id)?,
            None => String::new(),
        };
        SaxoClient::new(
            SaxoAppCredentials {
                app_key,
                app_secret,
                redirect_uri,
            },
            &self.config,
        )
    }

    /// Starts an authorization and returns the URL the browser should open.
    ///
    /// Replaces any pending exchange for the connection.
    pub fn begin_authorization(&self, connection: &BrokerConnection) -> Result<String> {
        let client = self.client_for(connection)?;
        let state = Uuid::new_v4().to_string();
        let authorize_url = client.authorize_url(&state);

        self.pending_write().insert(
            connection.id.clone(),
            PendingExchange {
                authorize_url: authorize_url.clone(),
                state,
                failed: false,
                created_at: Utc::now(),
            },
        );
        info!("OAuth authorization started for connection {}", connection.id);
        Ok(authorize_url)
    }

    /// The URL of the connection's pending authorization, if any.
    pub fn authorize_url(&self, connection_id: &str) -> Option<String> {
        self.pending_read()
            .get(connection_id)
            .map(|p| p.authorize_url.clone())
    }

    /// Current authorization status for the connection.
    pub fn status(&self, connection: &BrokerConnection) -> OAuthStatus {
        if let Some(pending) = self.pending_read().get(&connection.id) {
            return if pending.failed {
                OAuthStatus::Failed
            } else {
                OAuthStatus::Pending
            };
        }
        let cached_live = self
            .sessions_read()
            .get(&connection.id)
            .map(|s| !s.is_expired())
            .unwrap_or(false);
        if cached_live || connection.refresh_token.is_some() {
            return OAuthStatus::Authenticated;
        }
        OAuthStatus::None
    }

    /// Completes the exchange with the code from the redirect.
    ///
    /// Stores the encrypted token pair on the connection, caches the live
    /// session, and clears the pending entry.
    pub async fn complete_authorization(
        &self,
        connection: &BrokerConnection,
        code: &str,
        state: &str,
    ) -> Result<BrokerSession> {
        let expected_state = self
            .pending_read()
            .get(&connection.id)
            .map(|p| p.state.clone());
        match expected_state {
            Some(expected) if expected == state => {}
            Some(_) => {
                self.mark_failed(&connection.id);
                return Err(BrokerSyncError::AuthFailed(
                    "OAuth state mismatch".to_string(),
                ));
            }
            None => return Err(BrokerSyncError::AuthPending),
        }

        let client = self.client_for(connection)?;
        let token = match client.exchange_code(code).await {
            Ok(token) => token,
            Err(e) => {
                self.mark_failed(&connection.id);
                return Err(e);
            }
        };

        self.store_tokens(connection, &token.access_token, token.refresh_token.as_deref())
            .await?;

        let session = SaxoClient::session_from_token(&token);
        self.sessions_write()
            .insert(connection.id.clone(), session.clone());
        self.pending_write().remove(&connection.id);
        info!(
            "OAuth authorization completed for connection {}",
            connection.id
        );
        Ok(session)
    }

    /// Returns a live session and client for the connection.
    ///
    /// Uses the cached session while it lasts, then renews from the stored
    /// refresh token. Without either, authorization is still pending.
    pub async fn get_session(
        &self,
        connection: &BrokerConnection,
    ) -> Result<(Arc<SaxoClient>, BrokerSession)> {
        let client = Arc::new(self.client_for(connection)?);

        if let Some(session) = self.sessions_read().get(&connection.id) {
            if !session.is_expired() {
                return Ok((client, session.clone()));
            }
        }

        let refresh_enc = connection
            .refresh_token
            .as_deref()
            .ok_or(BrokerSyncError::AuthPending)?;
        let refresh_token = self
            .encryptor
            .decrypt_from_string(refresh_enc, &connection.user_id)?;

        let token = client.refresh_tokens(&refresh_token).await?;
        self.store_tokens(connection, &token.access_token, token.refresh_token.as_deref())
            .await?;

        let session = SaxoClient::session_from_token(&token);
        self.sessions_write()
            .insert(connection.id.clone(), session.clone());
        Ok((client, session))
    }

    /// Replaces the connection's app credentials.
    ///
    /// Any cached session and pending exchange for the connection are
    /// invalidated; they were bound to the old credentials.
    pub async fn update_app_credentials(
        &self,
        connection_id: &str,
        app_key: String,
        app_secret: Option<String>,
        redirect_uri: String,
    ) -> Result<()> {
        let connection = self.connections.get_by_id(connection_id)?;
        let encrypted_secret = match app_secret {
            Some(secret) => Some(
                self.encryptor
                    .encrypt_to_string(&secret, &connection.user_id)?,
            ),
            None => None,
        };

        self.connections
            .update_app_credentials(connection_id, app_key, encrypted_secret, redirect_uri)
            .await?;

        self.sessions_write().remove(connection_id);
        self.pending_write().remove(connection_id);
        info!("App credentials updated for connection {}", connection_id);
        Ok(())
    }

    fn mark_failed(&self, connection_id: &str) {
        if let Some(pending) = self.pending_write().get_mut(connection_id) {
            pending.failed = true;
        }
    }

    async fn store_tokens(
        &self,
        connection: &BrokerConnection,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<()> {
        let access_enc = self
            .encryptor
            .encrypt_to_string(access_token, &connection.user_id)?;
        let refresh_enc = match refresh_token {
            Some(token) => Some(self.encryptor.encrypt_to_string(token, &connection.user_id)?),
            None => None,
        };
        self.connections
            .update_tokens(&connection.id, Some(access_enc), refresh_enc)
            .await?;
        Ok(())
    }
}
