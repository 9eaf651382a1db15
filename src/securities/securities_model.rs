use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Domain model for a canonical instrument, deduplicated by
/// `(symbol, exchange)` across all broker imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: String,
    pub symbol: String,
    pub exchange: String,
    pub currency: String,
    pub name: String,
    pub isin: Option<String>,
    pub is_active: bool,
    pub updated_at: NaiveDateTime,
}

impl Security {
    /// Symbol format expected by the market data provider, e.g. `SHOP.TO`.
    pub fn provider_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }
}

/// Input model for creating a new security
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSecurity {
    pub symbol: String,
    pub exchange: String,
    pub currency: String,
    pub name: String,
    pub isin: Option<String>,
}

/// Cached mapping from a broker-reported instrument to a canonical security.
/// Keyed by `(institution, broker_symbol, broker_exchange)` so a previously
/// seen broker instrument never hits the search provider again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityBrokerMapping {
    pub id: String,
    pub institution: String,
    pub broker_symbol: String,
    pub broker_exchange: String,
    pub mapped_symbol: String,
    pub mapped_exchange: String,
    pub broker_name: String,
    pub security_id: String,
    pub search_payload: String,
    pub created_at: NaiveDateTime,
}

/// Input model for recording a new broker mapping
#[derive(Debug, Clone)]
pub struct NewSecurityBrokerMapping {
    pub institution: String,
    pub broker_symbol: String,
    pub broker_exchange: String,
    pub mapped_symbol: String,
    pub mapped_exchange: String,
    pub broker_name: String,
    pub security_id: String,
    pub search_payload: String,
}

/// Database model for securities
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::securities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SecurityDB {
    pub id: String,
    pub symbol: String,
    pub exchange: String,
    pub currency: String,
    pub name: String,
    pub isin: Option<String>,
    pub is_active: bool,
    #[diesel(skip_insertion)]
    pub updated_at: NaiveDateTime,
}

/// Database model for security broker mappings
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::security_broker_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SecurityBrokerMappingDB {
    pub id: String,
    pub institution: String,
    pub broker_symbol: String,
    pub broker_exchange: String,
    pub mapped_symbol: String,
    pub mapped_exchange: String,
    pub broker_name: String,
    pub security_id: String,
    pub search_payload: String,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
}

// Conversion implementations
impl From<SecurityDB> for Security {
    fn from(db: SecurityDB) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            exchange: db.exchange,
            currency: db.currency,
            name: db.name,
            isin: db.isin,
            is_active: db.is_active,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewSecurity> for SecurityDB {
    fn from(new_security: NewSecurity) -> Self {
        Self {
            id: String::new(),
            symbol: new_security.symbol,
            exchange: new_security.exchange,
            currency: new_security.currency,
            name: new_security.name,
            isin: new_security.isin,
            is_active: true,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

impl From<SecurityBrokerMappingDB> for SecurityBrokerMapping {
    fn from(db: SecurityBrokerMappingDB) -> Self {
        Self {
            id: db.id,
            institution: db.institution,
            broker_symbol: db.broker_symbol,
            broker_exchange: db.broker_exchange,
            mapped_symbol: db.mapped_symbol,
            mapped_exchange: db.mapped_exchange,
            broker_name: db.broker_name,
            security_id: db.security_id,
            search_payload: db.search_payload,
            created_at: db.created_at,
        }
    }
}

impl From<NewSecurityBrokerMapping> for SecurityBrokerMappingDB {
    fn from(new_mapping: NewSecurityBrokerMapping) -> Self {
        Self {
            id: String::new(),
            institution: new_mapping.institution,
            broker_symbol: new_mapping.broker_symbol,
            broker_exchange: new_mapping.broker_exchange,
            mapped_symbol: new_mapping.mapped_symbol,
            mapped_exchange: new_mapping.mapped_exchange,
            broker_name: new_mapping.broker_name,
            security_id: new_mapping.security_id,
            search_payload: new_mapping.search_payload,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
