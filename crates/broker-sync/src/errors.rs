//! Error types for the broker sync crate.

use thiserror::Error;

/// Result type alias for broker sync operations.
pub type Result<T> = std::result::Result<T, BrokerSyncError>;

/// Errors that can occur in the broker synchronization subsystem.
///
/// The variants separate the cases callers react to differently:
/// configuration problems are rejected before any network or crypto work,
/// authentication errors prompt the user to log in again, and the
/// encryption-layer pair `InvalidInput`/`DecryptionFailed` distinguishes
/// malformed input from a failed integrity check.
#[derive(Debug, Error)]
pub enum BrokerSyncError {
    /// Invalid configuration (bad broker type, missing fields).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The connection references a broker this build does not support.
    #[error("Unsupported broker type: {0}")]
    UnsupportedBroker(String),

    /// Malformed input to the crypto layer (empty or wrong-size nonce).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authenticated decryption failed; the ciphertext or key is wrong.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Internal failure in the crypto layer (key derivation, sealing).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// No live session, or the broker rejected the session material.
    #[error("Session expired")]
    SessionExpired,

    /// The broker rejected the login attempt.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The user did not complete the interactive login in time.
    #[error("Authentication timed out")]
    AuthTimedOut,

    /// An OAuth authorization was started but not completed yet.
    #[error("Authorization pending: complete the browser login first")]
    AuthPending,

    /// The QR frame has not been produced yet; poll again.
    #[error("QR code not ready")]
    QrNotReady,

    /// The broker throttled us twice in a row for the same request.
    #[error("Rate limited by broker")]
    RateLimited,

    /// Non-success response from a broker API.
    #[error("Broker API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error from helper artifacts handling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error propagated from a storage collaborator.
    #[error("Storage error: {0}")]
    Store(#[from] formue_core::Error),
}

impl BrokerSyncError {
    /// Create an API error, truncating the body to keep logs readable.
    pub fn api(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            body: body.chars().take(200).collect(),
        }
    }

    /// True for the errors the UI should answer with a re-login prompt.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            BrokerSyncError::SessionExpired
                | BrokerSyncError::AuthFailed(_)
                | BrokerSyncError::AuthTimedOut
                | BrokerSyncError::AuthPending
        )
    }
}
