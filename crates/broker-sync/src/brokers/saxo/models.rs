//! Wire models for the Saxo Bank OpenAPI.
//!
//! The gateway uses PascalCase field names; the token endpoint follows the
//! OAuth2 convention of snake_case.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Token endpoint response for both code exchange and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct SaxoTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    1200
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoAccount {
    pub account_id: String,
    pub account_key: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default = "default_account_currency")]
    pub currency: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_account_currency() -> String {
    "DKK".to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoPosition {
    pub position_base: SaxoPositionBase,
    #[serde(default)]
    pub position_view: Option<SaxoPositionView>,
    #[serde(default)]
    pub display_and_format: Option<SaxoDisplayAndFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoPositionBase {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub open_price: Decimal,
    #[serde(default)]
    pub asset_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoPositionView {
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub market_value: Decimal,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoDisplayAndFormat {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaxoBalance {
    #[serde(default)]
    pub cash_balance: Decimal,
    #[serde(default = "default_account_currency")]
    pub currency: String,
}
