//! Broker connection domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::{Error, Result};

/// Supported broker back ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerType {
    /// Cookie/app-approval based login (MitID QR flow).
    Nordnet,
    /// OAuth2 authorization-code flow.
    Saxo,
}

impl BrokerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerType::Nordnet => "nordnet",
            BrokerType::Saxo => "saxo",
        }
    }
}

impl FromStr for BrokerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nordnet" => Ok(BrokerType::Nordnet),
            "saxo" => Ok(BrokerType::Saxo),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown broker type: {}",
                other
            )))),
        }
    }
}

impl fmt::Display for BrokerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection-level outcome of the last sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSyncStatus {
    Success,
    Error,
    AuthFailed,
}

impl ConnectionSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionSyncStatus::Success => "success",
            ConnectionSyncStatus::Error => "error",
            ConnectionSyncStatus::AuthFailed => "auth_failed",
        }
    }
}

impl fmt::Display for ConnectionSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured link between one user and one broker.
///
/// Secret fields (`app_secret`, `access_token`, `refresh_token`) hold
/// encrypted payloads in their encoded string form, never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConnection {
    pub id: String,
    pub user_id: String,
    pub broker_type: String,
    /// ISO country code selecting the broker's national endpoint (dk/se/no/fi).
    pub country: Option<String>,
    /// Login identifier for the app-approval flow (username or CPR number).
    pub username: Option<String>,
    /// OAuth application key.
    pub app_key: Option<String>,
    /// OAuth application secret, encrypted.
    pub app_secret: Option<String>,
    /// OAuth redirect URI registered with the broker.
    pub redirect_uri: Option<String>,
    /// OAuth access token, encrypted.
    pub access_token: Option<String>,
    /// OAuth refresh token, encrypted.
    pub refresh_token: Option<String>,
    pub is_active: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_status: Option<String>,
    pub last_sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrokerConnection {
    /// Parses the stored broker type string.
    pub fn broker_type(&self) -> Result<BrokerType> {
        self.broker_type.parse()
    }
}

/// Input model for creating a new broker connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBrokerConnection {
    pub user_id: String,
    pub broker_type: String,
    pub country: Option<String>,
    pub username: Option<String>,
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

impl NewBrokerConnection {
    /// Validates the new connection data.
    ///
    /// Broker-specific identity fields are required by the flow the broker
    /// uses: the app-approval broker needs a username, the OAuth broker
    /// needs an app key and redirect URI.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "userId".to_string(),
            )));
        }
        let broker_type: BrokerType = self.broker_type.parse()?;
        match broker_type {
            BrokerType::Nordnet => {
                if self.username.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(Error::Validation(ValidationError::MissingField(
                        "username".to_string(),
                    )));
                }
            }
            BrokerType::Saxo => {
                if self.app_key.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(Error::Validation(ValidationError::MissingField(
                        "appKey".to_string(),
                    )));
                }
                if self.redirect_uri.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(Error::Validation(ValidationError::MissingField(
                        "redirectUri".to_string(),
                    )));
                }
            }
        }
        Ok(())
    }
}
