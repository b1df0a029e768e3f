//! Database model for holdings.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use formue_core::holdings::Holding;

use crate::utils::{format_datetime, format_decimal, parse_datetime, parse_decimal};

/// Database model for holdings
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub quantity: String,
    pub average_price: String,
    pub current_price: String,
    pub market_value: String,
    pub currency: String,
    pub instrument_type: Option<String>,
    pub synced_at: String,
}

impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            symbol: db.symbol,
            name: db.name,
            quantity: parse_decimal(&db.quantity),
            average_price: parse_decimal(&db.average_price),
            current_price: parse_decimal(&db.current_price),
            market_value: parse_decimal(&db.market_value),
            currency: db.currency,
            instrument_type: db.instrument_type,
            synced_at: parse_datetime(&db.synced_at),
        }
    }
}

impl From<Holding> for HoldingDB {
    fn from(domain: Holding) -> Self {
        Self {
            id: domain.id,
            account_id: domain.account_id,
            symbol: domain.symbol,
            name: domain.name,
            quantity: format_decimal(domain.quantity),
            average_price: format_decimal(domain.average_price),
            current_price: format_decimal(domain.current_price),
            market_value: format_decimal(domain.market_value),
            currency: domain.currency,
            instrument_type: domain.instrument_type,
            synced_at: format_datetime(domain.synced_at),
        }
    }
}
