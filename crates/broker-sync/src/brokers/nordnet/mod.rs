//! Client for the Nordnet REST API (cookie/app-approval protocol).
//!
//! Login is user-present: the QR helper completes the app approval in a
//! browser and hands back session artifacts, which [`NordnetClient::login`]
//! upgrades into an API session. Reads then carry the session cookies or
//! the bearer/ntag pair, depending on what the login produced.

pub mod models;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;

use crate::config::BrokerSyncConfig;
use crate::errors::{BrokerSyncError, Result};
use crate::models::{ExternalAccount, ExternalLedger, ExternalPosition};
use crate::session::{BrokerSession, SessionAuth};
use crate::transport::RateLimitedTransport;

use super::{require_live, BrokerClient};
use models::{
    NordnetAccount, NordnetLedgerInfo, NordnetLoginResponse, NordnetPosition, QrLoginArtifacts,
};

/// Countries Nordnet operates in, mapped to their national hosts.
const COUNTRY_HOSTS: &[(&str, &str)] = &[
    ("dk", "https://www.nordnet.dk"),
    ("se", "https://www.nordnet.se"),
    ("no", "https://www.nordnet.no"),
    ("fi", "https://www.nordnet.fi"),
];

/// HTTP client for one Nordnet connection.
#[derive(Debug)]
pub struct NordnetClient {
    transport: RateLimitedTransport,
    base_url: String,
}

impl NordnetClient {
    /// Creates a client for the connection's country (Denmark by default).
    pub fn new(country: Option<&str>, config: &BrokerSyncConfig) -> Result<Self> {
        let base_url = Self::host_for_country(country)?;
        Ok(Self {
            transport: RateLimitedTransport::new(
                config.min_request_interval,
                config.throttle_backoff,
            )?,
            base_url,
        })
    }

    /// Creates a client against an explicit base URL.
    pub fn with_base_url(base_url: &str, config: &BrokerSyncConfig) -> Result<Self> {
        Ok(Self {
            transport: RateLimitedTransport::new(
                config.min_request_interval,
                config.throttle_backoff,
            )?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn host_for_country(country: Option<&str>) -> Result<String> {
        let wanted = country.unwrap_or("dk").to_ascii_lowercase();
        COUNTRY_HOSTS
            .iter()
            .find(|(code, _)| *code == wanted)
            .map(|(_, host)| host.to_string())
            .ok_or_else(|| {
                BrokerSyncError::Config(format!("Unsupported Nordnet country: {}", wanted))
            })
    }

    /// Upgrades helper-produced login artifacts into an API session.
    pub async fn login(&self, artifacts: &QrLoginArtifacts) -> Result<BrokerSession> {
        let url = format!("{}/api/2/login", self.base_url);
        debug!("[Nordnet] POST {}", url);

        let mut request = self
            .transport
            .client()
            .post(&url)
            .header(reqwest::header::COOKIE, artifacts.cookies.as_str());
        if let Some(tag) = &artifacts.ntag {
            request = request.header("ntag", tag.as_str());
        }

        let response = self.transport.execute(request).await.map_err(|e| match e {
            // A 401 here is not an expired session but a rejected login.
            BrokerSyncError::SessionExpired => {
                BrokerSyncError::AuthFailed("Broker rejected the login artifacts".to_string())
            }
            other => other,
        })?;
        let response = RateLimitedTransport::error_for_status(response).await?;
        let login: NordnetLoginResponse = response.json().await.map_err(BrokerSyncError::Http)?;

        let session_key = login
            .session_key
            .or_else(|| artifacts.session_key.clone());
        let auth = match (session_key, artifacts.ntag.clone()) {
            (Some(token), Some(tag)) => SessionAuth::Bearer { token, tag },
            (_, ntag) => SessionAuth::Cookies {
                cookies: artifacts.cookies.clone(),
                csrf: ntag.unwrap_or_default(),
            },
        };
        Ok(BrokerSession::with_ttl(auth, login.expires_in))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &BrokerSession,
        path: &str,
    ) -> Result<T> {
        require_live(session)?;

        let url = format!("{}{}", self.base_url, path);
        debug!("[Nordnet] GET {}", url);

        let request =
            RateLimitedTransport::apply_auth(self.transport.client().get(&url), &session.auth);
        let response = self.transport.execute(request).await?;
        let response = RateLimitedTransport::error_for_status(response).await?;
        response.json().await.map_err(BrokerSyncError::Http)
    }
}

#[async_trait]
impl BrokerClient for NordnetClient {
    async fn get_accounts(&self, session: &BrokerSession) -> Result<Vec<ExternalAccount>> {
        let accounts: Vec<NordnetAccount> = self.get_json(session, "/api/2/accounts").await?;
        Ok(accounts
            .into_iter()
            .map(|account| ExternalAccount {
                id: account.accid.to_string(),
                account_number: account.accno.to_string(),
                display_name: account.alias,
                currency: account.currency,
                account_type: account.account_type,
                is_active: !account.is_blocked,
            })
            .collect())
    }

    async fn get_positions(
        &self,
        session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalPosition>> {
        let path = format!("/api/2/accounts/{}/positions", account_id);
        let positions: Vec<NordnetPosition> = self.get_json(session, &path).await?;
        Ok(positions
            .into_iter()
            .map(|position| {
                let currency = position
                    .instrument
                    .currency
                    .clone()
                    .unwrap_or_else(|| "DKK".to_string());
                ExternalPosition {
                    symbol: position.instrument.symbol,
                    name: position.instrument.name,
                    quantity: position.qty.value(),
                    average_price: position.acq_price.value(),
                    current_price: position.main_market_price.value(),
                    market_value: position.market_value.value(),
                    currency,
                    instrument_type: position.instrument.instrument_type,
                }
            })
            .collect())
    }

    async fn get_ledgers(
        &self,
        session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalLedger>> {
        let path = format!("/api/2/accounts/{}/ledgers", account_id);
        let info: NordnetLedgerInfo = self.get_json(session, &path).await?;
        Ok(info
            .ledgers
            .into_iter()
            .map(|ledger| ExternalLedger {
                currency: ledger.currency,
                balance: ledger.account_sum.value(),
            })
            .collect())
    }

    async fn validate_session(&self, session: &BrokerSession) -> Result<bool> {
        match self
            .get_json::<serde_json::Value>(session, "/api/2/login")
            .await
        {
            Ok(_) => Ok(true),
            Err(BrokerSyncError::SessionExpired) => Ok(false),
            Err(other) => Err(other),
        }
    }
}
