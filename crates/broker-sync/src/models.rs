//! Broker-agnostic shapes returned by the protocol adapters.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Numeric field that may arrive bare or `{value: N}`-wrapped.
///
/// The upstream APIs are uncontrolled and have shipped both forms for the
/// same field. Parsing tries the bare number first, then the wrapper, and
/// defaults to zero on total failure instead of aborting the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FlexValue(pub Decimal);

impl FlexValue {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for FlexValue {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for FlexValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(Decimal),
            Wrapped { value: Decimal },
            // Anything else (null, unexpected object, junk string).
            Other(serde_json::Value),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(value) | Repr::Wrapped { value } => FlexValue(value),
            Repr::Other(_) => FlexValue(Decimal::ZERO),
        })
    }
}

/// One account as listed by the broker, for the mapping UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccount {
    /// Broker-side identifier used in subsequent API calls.
    pub id: String,
    /// Human-readable account number.
    pub account_number: String,
    pub display_name: Option<String>,
    pub currency: String,
    pub account_type: Option<String>,
    pub is_active: bool,
}

/// One open position as reported by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPosition {
    pub symbol: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub currency: String,
    pub instrument_type: Option<String>,
}

/// One cash ledger balance as reported by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLedger {
    pub currency: String,
    pub balance: Decimal,
}
