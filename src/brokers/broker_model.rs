use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::{AccountType, Institution};

/// Broker-side account identifier
pub type BrokerAccountId = String;

/// Account as reported by the broker API, after mapping broker-specific
/// codes onto canonical enums. Never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerAccount {
    pub id: BrokerAccountId,
    pub account_type: AccountType,
    pub institution: Institution,
    pub currency: String,
    pub display_name: String,
    pub value: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Position as reported by the broker API. The average cost is nullable:
/// the broker does not report it for every instrument type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerPosition {
    pub broker_account_id: BrokerAccountId,
    pub name: String,
    pub symbol: String,
    pub exchange: String,
    pub quantity: Decimal,
    pub average_cost: Option<Decimal>,
}

/// Key for the broker session store: one opaque session credential is
/// held per (institution, external username).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub institution: Institution,
    pub username: String,
}

impl SessionKey {
    pub fn new(institution: Institution, username: &str) -> Self {
        Self {
            institution,
            username: username.to_string(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.institution.as_str(), self.username)
    }
}
