//! Client for the Saxo Bank OpenAPI (OAuth2 protocol).
//!
//! Authentication is the standard authorization-code flow: the user is sent
//! to the logon portal, the redirect hands back a code, and the token
//! endpoint issues an access/refresh pair. Portfolio reads go through the
//! OpenAPI gateway with the bearer token.

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
use models::{SaxoAccount, SaxoBalance, SaxoListResponse, SaxoPosition, SaxoTokenResponse};

/// Default OpenAPI gateway.
const DEFAULT_GATEWAY_URL: &str = "https://gateway.saxobank.com/openapi";

/// Default authorization/token host.
const DEFAULT_AUTH_URL: &str = "https://live.logonvalidation.net";

/// OAuth application credentials for one connection.
#[derive(Debug, Clone)]
pub struct SaxoAppCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub redirect_uri: String,
}

/// HTTP client for one Saxo connection.
#[derive(Debug)]
pub struct SaxoClient {
    transport: RateLimitedTransport,
    gateway_url: String,
    auth_url: String,
    credentials: SaxoAppCredentials,
}

impl SaxoClient {
    pub fn new(credentials: SaxoAppCredentials, config: &BrokerSyncConfig) -> Result<Self> {
        Self::with_urls(credentials, config, DEFAULT_GATEWAY_URL, DEFAULT_AUTH_URL)
    }

    /// Creates a client against explicit hosts (sim environment, tests).
    pub fn with_urls(
        credentials: SaxoAppCredentials,
        config: &BrokerSyncConfig,
        gateway_url: &str,
        auth_url: &str,
    ) -> Result<Self> {
        if credentials.app_key.trim().is_empty() || credentials.redirect_uri.trim().is_empty() {
            return Err(BrokerSyncError::Config(
                "Saxo connection is missing app key or redirect URI".to_string(),
            ));
        }
        Ok(Self {
            transport: RateLimitedTransport::new(
                config.min_request_interval,
                config.throttle_backoff,
            )?,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Authorization URL the user's browser is sent to.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?response_type=code&client_id={}&redirect_uri={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.credentials.app_key),
            urlencoding::encode(&self.credentials.redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<SaxoTokenResponse> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.credentials.redirect_uri),
        ])
        .await
    }

    /// Renews the token pair from a refresh token.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<SaxoTokenResponse> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<SaxoTokenResponse> {
        let url = format!("{}/token", self.auth_url);
        debug!("[Saxo] POST {}", url);

        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", self.credentials.app_key.as_str()));
        form.push(("client_secret", self.credentials.app_secret.as_str()));

        let request = self.transport.client().post(&url).form(&form);
        let response = self.transport.execute(request).await.map_err(|e| match e {
            // The token endpoint answers 401 for bad app credentials.
            BrokerSyncError::SessionExpired => {
                BrokerSyncError::AuthFailed("Token endpoint rejected the app credentials".into())
            }
            other => other,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerSyncError::AuthFailed(format!(
                "Token request failed ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        response.json().await.map_err(BrokerSyncError::Http)
    }

    /// Builds a session from a token response.
    pub fn session_from_token(token: &SaxoTokenResponse) -> BrokerSession {
        BrokerSession::with_ttl(
            SessionAuth::OAuth {
                access_token: token.access_token.clone(),
            },
            token.expires_in,
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &BrokerSession,
        path: &str,
    ) -> Result<T> {
        require_live(session)?;

        let url = format!("{}{}", self.gateway_url, path);
        debug!("[Saxo] GET {}", url);

        let request =
            RateLimitedTransport::apply_auth(self.transport.client().get(&url), &session.auth);
        let response = self.transport.execute(request).await?;
        let response = RateLimitedTransport::error_for_status(response).await?;
        response.json().await.map_err(BrokerSyncError::Http)
    }
}

#[async_trait]
impl BrokerClient for SaxoClient {
    async fn get_accounts(&self, session: &BrokerSession) -> Result<Vec<ExternalAccount>> {
        let response: SaxoListResponse<SaxoAccount> =
            self.get_json(session, "/port/v1/accounts/me").await?;
        Ok(response
            .data
            .into_iter()
            .map(|account| ExternalAccount {
                // The key, not the display id, addresses the account in
                // subsequent API calls.
                id: account.account_key,
                account_number: account.account_id,
                display_name: account.display_name,
                currency: account.currency,
                account_type: account.account_type,
                is_active: account.active,
            })
            .collect())
    }

    async fn get_positions(
        &self,
        session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalPosition>> {
        let path = format!(
            "/port/v1/positions?AccountKey={}&FieldGroups=PositionBase,PositionView,DisplayAndFormat",
            urlencoding::encode(account_id)
        );
        let response: SaxoListResponse<SaxoPosition> = self.get_json(session, &path).await?;
        Ok(response
            .data
            .into_iter()
            .map(|position| {
                let view = position.position_view.unwrap_or_default();
                let display = position.display_and_format.unwrap_or_default();
                ExternalPosition {
                    symbol: display.symbol.unwrap_or_else(|| "UNKNOWN".to_string()),
                    name: display.description,
                    quantity: position.position_base.amount,
                    average_price: position.position_base.open_price,
                    current_price: view.current_price,
                    market_value: view.market_value,
                    currency: display.currency.unwrap_or_else(|| "DKK".to_string()),
                    instrument_type: position.position_base.asset_type,
                }
            })
            .collect())
    }

    async fn get_ledgers(
        &self,
        session: &BrokerSession,
        account_id: &str,
    ) -> Result<Vec<ExternalLedger>> {
        let path = format!(
            "/port/v1/balances?AccountKey={}",
            urlencoding::encode(account_id)
        );
        let balance: SaxoBalance = self.get_json(session, &path).await?;
        Ok(vec![ExternalLedger {
            currency: balance.currency,
            balance: balance.cash_balance,
        }])
    }

    async fn validate_session(&self, session: &BrokerSession) -> Result<bool> {
        match self
            .get_json::<serde_json::Value>(session, "/port/v1/users/me")
            .await
        {
            Ok(_) => Ok(true),
            Err(BrokerSyncError::SessionExpired) => Ok(false),
            Err(other) => Err(other),
        }
    }
}
