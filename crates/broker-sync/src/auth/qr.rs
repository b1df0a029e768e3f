//! QR app-approval login flow for the cookie-protocol broker.
//!
//! The actual login happens in an out-of-process helper that drives a real
//! browser through the app-approval flow. The helper writes a status file
//! and a periodically replaced QR frame into its working directory and
//! prints a final JSON result on stdout. This module launches the helper
//! under a hard deadline, polls its artifacts on behalf of the UI, and
//! upgrades the resulting artifacts into an API session.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::process::Command;

use formue_core::connections::BrokerConnection;

use crate::brokers::nordnet::models::QrLoginArtifacts;
use crate::brokers::nordnet::NordnetClient;
use crate::config::BrokerSyncConfig;
use crate::crypto::CredentialEncryptor;
use crate::errors::{BrokerSyncError, Result};
use crate::session::BrokerSession;

use super::AuthRegistry;

/// File the helper keeps its current state in.
const STATUS_FILE: &str = "status.txt";

/// Current QR frame; replaced in place while the code rotates.
const QR_FRAME_FILE: &str = "qr.png";

/// Login method passed to the helper.
const LOGIN_METHOD: &str = "mitid-qr";

/// Input to one interactive login attempt.
#[derive(Debug, Clone)]
pub struct QrLoginRequest {
    pub country: String,
    pub username: String,
    pub method: String,
}

/// Pollable state of one QR login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrAuthStatus {
    /// No attempt in flight for the connection.
    None,
    Initializing,
    QrReady,
    Approved,
    TimedOut,
    Failed,
}

impl QrAuthStatus {
    fn from_file_content(content: &str) -> Self {
        match content.trim() {
            "qr_ready" => QrAuthStatus::QrReady,
            "approved" => QrAuthStatus::Approved,
            "timeout" => QrAuthStatus::TimedOut,
            "failed" => QrAuthStatus::Failed,
            // Includes "initializing" and anything a newer helper writes.
            _ => QrAuthStatus::Initializing,
        }
    }
}

/// Final JSON payload printed by the helper.
///
/// The helper emits this even on failure, with `success: false` and a
/// human-readable error, so the payload is parsed regardless of the exit
/// code.
#[derive(Debug, Deserialize)]
struct HelperResult {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    cookies: Option<String>,
    #[serde(default)]
    ntag: Option<String>,
    #[serde(default)]
    session_key: Option<String>,
}

/// Pluggable seam for the user-present login step.
///
/// Production shells out to the helper process; tests inject a fake that
/// returns canned artifacts instantly.
#[async_trait]
pub trait InteractiveAuthenticator: Send + Sync {
    async fn run(&self, request: &QrLoginRequest, work_dir: &Path) -> Result<QrLoginArtifacts>;
}

/// Production authenticator shelling out to the login helper.
pub struct HelperProcessAuthenticator {
    command: PathBuf,
    timeout: Duration,
}

impl HelperProcessAuthenticator {
    pub fn new(command: PathBuf, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl InteractiveAuthenticator for HelperProcessAuthenticator {
    async fn run(&self, request: &QrLoginRequest, work_dir: &Path) -> Result<QrLoginArtifacts> {
        let mut command = Command::new(&self.command);
        command
            .arg(&request.country)
            .arg(&request.username)
            .arg(&request.method)
            .arg(work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the timed-out future reaps the helper.
            .kill_on_drop(true);

        debug!(
            "Launching login helper {:?} for method {}",
            self.command, request.method
        );
        let child = command.spawn().map_err(|e| {
            BrokerSyncError::AuthFailed(format!("Failed to launch login helper: {e}"))
        })?;

        let started = Instant::now();
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(BrokerSyncError::Io)?,
            Err(_) => {
                warn!("Login helper exceeded {:?}, killing it", self.timeout);
                return Err(BrokerSyncError::AuthTimedOut);
            }
        };

        let deadline_exceeded = started.elapsed() >= self.timeout;
        classify_helper_output(&output.stdout, &output.stderr, deadline_exceeded)
    }
}

/// Interprets the helper's final output.
///
/// The stdout JSON wins even when the process exited non-zero. Unparsable
/// output classifies as timed-out when the deadline was the cause, and
/// otherwise as a failure carrying the truncated diagnostic text.
fn classify_helper_output(
    stdout: &[u8],
    stderr: &[u8],
    deadline_exceeded: bool,
) -> Result<QrLoginArtifacts> {
    let stdout_text = String::from_utf8_lossy(stdout);

    match serde_json::from_str::<HelperResult>(stdout_text.trim()) {
        Ok(result) if result.success => {
            let cookies = result.cookies.filter(|c| !c.is_empty()).ok_or_else(|| {
                BrokerSyncError::AuthFailed("Login helper returned no session cookies".to_string())
            })?;
            Ok(QrLoginArtifacts {
                cookies,
                ntag: result.ntag,
                session_key: result.session_key,
            })
        }
        Ok(result) => Err(BrokerSyncError::AuthFailed(
            result
                .error
                .unwrap_or_else(|| "Login helper reported failure".to_string()),
        )),
        Err(_) if deadline_exceeded => Err(BrokerSyncError::AuthTimedOut),
        Err(_) => {
            let diagnostic = if stdout_text.trim().is_empty() {
                String::from_utf8_lossy(stderr).into_owned()
            } else {
                stdout_text.into_owned()
            };
            Err(BrokerSyncError::AuthFailed(format!(
                "Login helper produced no result: {}",
                diagnostic.chars().take(200).collect::<String>()
            )))
        }
    }
}

/// Orchestrates QR logins for the cookie-protocol broker.
pub struct NordnetAuthService {
    config: BrokerSyncConfig,
    encryptor: Arc<CredentialEncryptor>,
    registry: Arc<AuthRegistry>,
    authenticator: Arc<dyn InteractiveAuthenticator>,
}

impl NordnetAuthService {
    pub fn new(
        config: BrokerSyncConfig,
        encryptor: Arc<CredentialEncryptor>,
        registry: Arc<AuthRegistry>,
        authenticator: Arc<dyn InteractiveAuthenticator>,
    ) -> Self {
        Self {
            config,
            encryptor,
            registry,
            authenticator,
        }
    }

    /// Wires the production helper-process authenticator.
    pub fn production(
        config: BrokerSyncConfig,
        encryptor: Arc<CredentialEncryptor>,
        registry: Arc<AuthRegistry>,
    ) -> Self {
        let authenticator = Arc::new(HelperProcessAuthenticator::new(
            config.auth_helper_command.clone(),
            config.auth_timeout,
        ));
        Self::new(config, encryptor, registry, authenticator)
    }

    /// Working directory for one connection's login artifacts.
    ///
    /// Deterministic so status polling resolves it without the registry.
    fn work_dir(&self, connection_id: &str) -> PathBuf {
        env::temp_dir().join(format!("formue-qr-login-{connection_id}"))
    }

    /// Runs the full interactive login and returns an authenticated client
    /// and session.
    ///
    /// Blocks the calling worker for up to the configured deadline (about
    /// two minutes); status and QR polling happen from other workers via
    /// [`get_status`](Self::get_status) and
    /// [`get_qr_image`](Self::get_qr_image).
    pub async fn authenticate(
        &self,
        connection: &BrokerConnection,
    ) -> Result<(Arc<NordnetClient>, BrokerSession)> {
        let username_enc = connection.username.as_deref().ok_or_else(|| {
            BrokerSyncError::Config("Connection has no username configured".to_string())
        })?;
        let username = self
            .encryptor
            .decrypt_from_string(username_enc, &connection.user_id)?;

        let work_dir = self.work_dir(&connection.id);

        // Only one attempt per connection: clear leftover state first.
        if self.registry.begin(&connection.id, work_dir.clone()).is_some() {
            info!(
                "Replacing leftover login attempt for connection {}",
                connection.id
            );
        }
        if work_dir.exists() {
            fs::remove_dir_all(&work_dir)?;
        }
        fs::create_dir_all(&work_dir)?;

        let request = QrLoginRequest {
            country: connection
                .country
                .clone()
                .unwrap_or_else(|| "dk".to_string()),
            username,
            method: LOGIN_METHOD.to_string(),
        };

        let outcome = self.authenticator.run(&request, &work_dir).await;

        // The tracking entry goes immediately; artifacts linger for a
        // grace period so a final poll still succeeds.
        self.registry.remove(&connection.id);
        self.schedule_artifact_cleanup(&connection.id, work_dir);

        let artifacts = outcome?;

        let client = Arc::new(NordnetClient::new(
            connection.country.as_deref(),
            &self.config,
        )?);
        let session = client.login(&artifacts).await?;
        info!("Interactive login completed for connection {}", connection.id);
        Ok((client, session))
    }

    /// Current state of the connection's login attempt. Non-blocking.
    pub fn get_status(&self, connection_id: &str) -> QrAuthStatus {
        let work_dir = self.work_dir(connection_id);
        if !work_dir.exists() {
            return QrAuthStatus::None;
        }
        match fs::read_to_string(work_dir.join(STATUS_FILE)) {
            Ok(content) => QrAuthStatus::from_file_content(&content),
            // The helper has not written its first status yet.
            Err(_) => QrAuthStatus::Initializing,
        }
    }

    /// Current QR frame for the connection's login attempt. Non-blocking.
    pub fn get_qr_image(&self, connection_id: &str) -> Result<Vec<u8>> {
        let path = self.work_dir(connection_id).join(QR_FRAME_FILE);
        fs::read(&path).map_err(|_| BrokerSyncError::QrNotReady)
    }

    fn schedule_artifact_cleanup(&self, connection_id: &str, work_dir: PathBuf) {
        let grace = self.config.artifact_grace;
        let registry = self.registry.clone();
        let connection_id = connection_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            // A newer attempt may own the directory by now.
            if registry.is_active(&connection_id) {
                return;
            }
            if let Err(e) = fs::remove_dir_all(&work_dir) {
                debug!("Login artifact cleanup skipped: {e}");
            }
        });
    }
}
