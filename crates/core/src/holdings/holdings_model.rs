//! Holding domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position snapshot for one instrument in one local account.
///
/// Upserted on every sync pass, keyed by (account, symbol). Rows whose
/// `synced_at` predates the pass are stale and get deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub currency: String,
    pub instrument_type: Option<String>,
    pub synced_at: DateTime<Utc>,
}
