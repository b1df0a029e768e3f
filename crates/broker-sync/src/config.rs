//! Configuration for the broker sync subsystem.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{BrokerSyncError, Result};

/// Environment variable holding the master encryption secret.
pub const MASTER_SECRET_ENV: &str = "FORMUE_SECRET";

/// Environment variable overriding the QR login helper command.
pub const AUTH_HELPER_ENV: &str = "FORMUE_AUTH_HELPER";

const DEFAULT_AUTH_HELPER: &str = "formue-auth-helper";

/// Hard deadline for one interactive login attempt.
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Grace period before login artifacts are removed, so a final status poll
/// still succeeds after completion.
const DEFAULT_ARTIFACT_GRACE: Duration = Duration::from_secs(5);

/// Minimum spacing between requests to one broker.
const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

/// Sleep before the single retry after a throttling response.
const DEFAULT_THROTTLE_BACKOFF: Duration = Duration::from_secs(2);

/// Runtime settings for the sync subsystem.
#[derive(Debug, Clone)]
pub struct BrokerSyncConfig {
    /// Master secret for the credential encryptor, at least 32 characters.
    pub master_secret: String,
    /// Command invoked for the QR app-approval login flow.
    pub auth_helper_command: PathBuf,
    /// Hard timeout for one interactive login attempt.
    pub auth_timeout: Duration,
    /// Delay before on-disk login artifacts are cleaned up.
    pub artifact_grace: Duration,
    /// Minimum spacing between requests to one broker.
    pub min_request_interval: Duration,
    /// Back-off before the single retry on a throttling response.
    pub throttle_backoff: Duration,
}

impl BrokerSyncConfig {
    /// Builds a config with defaults around the given master secret.
    pub fn new(master_secret: impl Into<String>) -> Self {
        Self {
            master_secret: master_secret.into(),
            auth_helper_command: PathBuf::from(DEFAULT_AUTH_HELPER),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            artifact_grace: DEFAULT_ARTIFACT_GRACE,
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL,
            throttle_backoff: DEFAULT_THROTTLE_BACKOFF,
        }
    }

    /// Reads the config from the environment.
    ///
    /// `FORMUE_SECRET` is required; `FORMUE_AUTH_HELPER` optionally points
    /// at the login helper binary.
    pub fn from_env() -> Result<Self> {
        let master_secret = env::var(MASTER_SECRET_ENV)
            .map_err(|_| BrokerSyncError::Config(format!("{} must be set", MASTER_SECRET_ENV)))?;

        let mut config = Self::new(master_secret);
        if let Ok(helper) = env::var(AUTH_HELPER_ENV) {
            config.auth_helper_command = PathBuf::from(helper);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants the rest of the subsystem relies on.
    pub fn validate(&self) -> Result<()> {
        if self.master_secret.len() < 32 {
            return Err(BrokerSyncError::Config(format!(
                "{} must be at least 32 characters",
                MASTER_SECRET_ENV
            )));
        }
        if self.auth_timeout.is_zero() {
            return Err(BrokerSyncError::Config(
                "auth timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
