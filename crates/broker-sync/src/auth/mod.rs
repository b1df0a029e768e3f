//! Interactive, user-present authentication flows.
//!
//! Two flows exist: the QR app-approval login for the cookie-protocol
//! broker ([`qr`]) and the browser OAuth redirect for the OAuth broker
//! ([`oauth`]). Both expose pollable status to the UI while a worker
//! blocks on the actual login.

pub mod oauth;
pub mod qr;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::warn;

pub use oauth::{OAuthStatus, SaxoAuthService};
pub use qr::{
    HelperProcessAuthenticator, InteractiveAuthenticator, NordnetAuthService, QrAuthStatus,
    QrLoginRequest,
};

/// One in-flight interactive login attempt.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    pub connection_id: String,
    pub work_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Registry of in-flight interactive logins, keyed by connection id.
///
/// Injected into the orchestrators rather than living as process-wide
/// state, so each test gets its own instance. Status and QR polling take
/// the read lock and never block each other; create/remove are exclusive.
#[derive(Default)]
pub struct AuthRegistry {
    attempts: RwLock<HashMap<String, AuthAttempt>>,
}

impl AuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, AuthAttempt>> {
        self.attempts.read().unwrap_or_else(|poisoned| {
            warn!("Auth registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, AuthAttempt>> {
        self.attempts.write().unwrap_or_else(|poisoned| {
            warn!("Auth registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Registers a new attempt, replacing any leftover entry for the
    /// connection. Returns the attempt it displaced, if any.
    pub fn begin(&self, connection_id: &str, work_dir: PathBuf) -> Option<AuthAttempt> {
        let attempt = AuthAttempt {
            connection_id: connection_id.to_string(),
            work_dir,
            started_at: Utc::now(),
        };
        self.write().insert(connection_id.to_string(), attempt)
    }

    pub fn get(&self, connection_id: &str) -> Option<AuthAttempt> {
        self.read().get(connection_id).cloned()
    }

    pub fn is_active(&self, connection_id: &str) -> bool {
        self.read().contains_key(connection_id)
    }

    /// Removes the attempt; called on every outcome before artifact
    /// cleanup is even scheduled.
    pub fn remove(&self, connection_id: &str) -> Option<AuthAttempt> {
        self.write().remove(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_replaces_leftover_attempt() {
        let registry = AuthRegistry::new();
        assert!(registry.begin("c1", PathBuf::from("/tmp/a")).is_none());
        assert!(registry.is_active("c1"));

        let displaced = registry.begin("c1", PathBuf::from("/tmp/b")).unwrap();
        assert_eq!(displaced.work_dir, PathBuf::from("/tmp/a"));

        assert_eq!(registry.get("c1").unwrap().work_dir, PathBuf::from("/tmp/b"));
        registry.remove("c1");
        assert!(!registry.is_active("c1"));
    }
}
