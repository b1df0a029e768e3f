//! In-memory broker sessions.
//!
//! Session material is held in memory only and never persisted in
//! plaintext; the OAuth token pair is stored encrypted on the connection
//! and decrypted into a session on demand.

use chrono::{DateTime, Duration, Utc};

/// Protocol-specific authentication material.
#[derive(Debug, Clone)]
pub enum SessionAuth {
    /// Classic web API login: session cookies plus a CSRF token.
    Cookies { cookies: String, csrf: String },
    /// NEXT-style API login: bearer token plus the rotating `ntag` header.
    Bearer { token: String, tag: String },
    /// OAuth2: the current access token.
    OAuth { access_token: String },
}

/// An authenticated context against one broker, with an expiry.
///
/// Invariant: a session is never used after `expires_at`; reads check
/// expiry before touching the network.
#[derive(Debug, Clone)]
pub struct BrokerSession {
    pub auth: SessionAuth,
    pub expires_at: DateTime<Utc>,
}

impl BrokerSession {
    /// Creates a session valid for `ttl_secs` from now.
    pub fn with_ttl(auth: SessionAuth, ttl_secs: i64) -> Self {
        Self {
            auth,
            expires_at: Utc::now() + Duration::seconds(ttl_secs),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
