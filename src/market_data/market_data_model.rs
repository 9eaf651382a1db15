use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domain model for a cached daily price point
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub id: String,
    pub security_id: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: i64,
}

/// Input model for caching a new price point
#[derive(Debug, Clone)]
pub struct NewPrice {
    pub security_id: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: i64,
}

impl NewPrice {
    pub fn from_provider(security_id: &str, provider_price: ProviderPrice) -> Self {
        Self {
            security_id: security_id.to_string(),
            date: provider_price.date,
            open: Decimal::from_f64(provider_price.open).unwrap_or_default(),
            high: Decimal::from_f64(provider_price.high).unwrap_or_default(),
            low: Decimal::from_f64(provider_price.low).unwrap_or_default(),
            close: Decimal::from_f64(provider_price.close).unwrap_or_default(),
            adjusted_close: Decimal::from_f64(provider_price.adjusted_close).unwrap_or_default(),
            volume: provider_price.volume,
        }
    }
}

/// One row of the provider's daily OHLCV series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPrice {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

/// One result row from the provider's instrument search endpoint.
/// Only the fields we read get named columns; everything else is kept
/// in `other` so the raw payload survives re-serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    pub code: String,
    pub exchange: String,
    pub name: String,
    pub currency: String,
    #[serde(rename = "ISIN", default)]
    pub isin: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

/// Database model for prices
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceDB {
    pub id: String,
    pub security_id: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
}

// Conversion implementations
impl From<PriceDB> for Price {
    fn from(db: PriceDB) -> Self {
        Self {
            id: db.id,
            security_id: db.security_id,
            date: db.date,
            open: Decimal::from_f64(db.open).unwrap_or_default(),
            high: Decimal::from_f64(db.high).unwrap_or_default(),
            low: Decimal::from_f64(db.low).unwrap_or_default(),
            close: Decimal::from_f64(db.close).unwrap_or_default(),
            adjusted_close: Decimal::from_f64(db.adjusted_close).unwrap_or_default(),
            volume: db.volume,
        }
    }
}

impl From<NewPrice> for PriceDB {
    fn from(new_price: NewPrice) -> Self {
        Self {
            id: String::new(),
            security_id: new_price.security_id,
            date: new_price.date,
            open: new_price.open.to_f64().unwrap_or(0.0),
            high: new_price.high.to_f64().unwrap_or(0.0),
            low: new_price.low.to_f64().unwrap_or(0.0),
            close: new_price.close.to_f64().unwrap_or(0.0),
            adjusted_close: new_price.adjusted_close.to_f64().unwrap_or(0.0),
            volume: new_price.volume,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
