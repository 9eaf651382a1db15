use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domain model representing a held position in an account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub account_id: String,
    pub security_id: String,
    pub quantity: Decimal,
    pub average_cost: Option<Decimal>,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub account_id: String,
    pub security_id: String,
    pub quantity: Decimal,
    pub average_cost: Option<Decimal>,
}

/// Database model for positions
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub id: String,
    pub account_id: String,
    pub security_id: String,
    pub quantity: f64,
    pub average_cost: Option<f64>,
    #[diesel(skip_insertion)]
    pub updated_at: NaiveDateTime,
}

// Conversion implementations
impl From<PositionDB> for Position {
    fn from(db: PositionDB) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            security_id: db.security_id,
            quantity: Decimal::from_f64(db.quantity).unwrap_or_default(),
            average_cost: db.average_cost.and_then(Decimal::from_f64),
            updated_at: db.updated_at,
        }
    }
}

impl From<NewPosition> for PositionDB {
    fn from(new_position: NewPosition) -> Self {
        Self {
            id: String::new(),
            account_id: new_position.account_id,
            security_id: new_position.security_id,
            quantity: new_position.quantity.to_f64().unwrap_or(0.0),
            average_cost: new_position.average_cost.and_then(|c| c.to_f64()),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
