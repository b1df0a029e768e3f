//! Wire models for the Nordnet REST API.
//!
//! Numeric fields use [`FlexValue`]: the API has shipped both bare numbers
//! and `{value: N}` wrappers for the same fields across versions.

use serde::Deserialize;

use crate::models::FlexValue;

/// Session artifacts produced by the external QR login helper.
///
/// The helper completes the app-approval flow in a real browser and hands
/// back the resulting cookie jar plus, on newer endpoints, a session key
/// and `ntag` pair.
#[derive(Debug, Clone, Deserialize)]
pub struct QrLoginArtifacts {
    pub cookies: String,
    #[serde(default)]
    pub ntag: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
}

/// Response of the session upgrade call.
#[derive(Debug, Deserialize)]
pub struct NordnetLoginResponse {
    #[serde(default)]
    pub session_key: Option<String>,
    /// Session lifetime in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    480
}

#[derive(Debug, Deserialize)]
pub struct NordnetAccount {
    pub accid: u64,
    pub accno: u64,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub is_blocked: bool,
}

fn default_currency() -> String {
    "DKK".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NordnetInstrument {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NordnetPosition {
    pub instrument: NordnetInstrument,
    #[serde(default)]
    pub qty: FlexValue,
    #[serde(default)]
    pub acq_price: FlexValue,
    #[serde(default)]
    pub main_market_price: FlexValue,
    #[serde(default)]
    pub market_value: FlexValue,
}

#[derive(Debug, Deserialize)]
pub struct NordnetLedger {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub account_sum: FlexValue,
}

#[derive(Debug, Deserialize)]
pub struct NordnetLedgerInfo {
    #[serde(default)]
    pub ledgers: Vec<NordnetLedger>,
}
