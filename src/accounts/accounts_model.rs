use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::accounts_errors::{AccountError, Result};
use crate::brokers::broker_model::BrokerAccount;

/// Supported brokerage institutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Institution {
    Wealthsimple,
}

impl Institution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Institution::Wealthsimple => "WEALTHSIMPLE",
        }
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Institution {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WEALTHSIMPLE" => Ok(Institution::Wealthsimple),
            _ => Err(AccountError::InvalidData(format!(
                "Unknown institution: {}",
                s
            ))),
        }
    }
}

/// Canonical account types for imported brokerage accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Tfsa,
    Rrsp,
    Fhsa,
    NonRegistered,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Tfsa => "TFSA",
            AccountType::Rrsp => "RRSP",
            AccountType::Fhsa => "FHSA",
            AccountType::NonRegistered => "NON_REGISTERED",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain model representing an imported brokerage account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub user_id: String,
    pub account_type: String,
    pub institution: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub external_id: String,
    pub name: String,
    pub user_id: String,
    pub account_type: String,
    pub institution: String,
    pub currency: String,
    pub is_active: bool,
}

impl NewAccount {
    /// Builds a local account from a broker-reported account.
    pub fn from_broker(broker_account: &BrokerAccount, user_id: &str) -> Self {
        Self {
            external_id: broker_account.id.clone(),
            name: broker_account.display_name.clone(),
            user_id: user_id.to_string(),
            account_type: broker_account.account_type.as_str().to_string(),
            institution: broker_account.institution.as_str().to_string(),
            currency: broker_account.currency.clone(),
            is_active: true,
        }
    }

    /// Validates the new account data
    pub fn validate(&self) -> Result<()> {
        if self.external_id.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "External account id cannot be empty".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "User id cannot be empty".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for accounts
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub user_id: String,
    pub account_type: String,
    pub institution: String,
    pub currency: String,
    pub is_active: bool,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
    #[diesel(skip_insertion)]
    pub updated_at: NaiveDateTime,
}

// Conversion implementations
impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            external_id: db.external_id,
            name: db.name,
            user_id: db.user_id,
            account_type: db.account_type,
            institution: db.institution,
            currency: db.currency,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAccount> for AccountDB {
    fn from(new_account: NewAccount) -> Self {
        Self {
            id: String::new(),
            external_id: new_account.external_id,
            name: new_account.name,
            user_id: new_account.user_id,
            account_type: new_account.account_type,
            institution: new_account.institution,
            currency: new_account.currency,
            is_active: new_account.is_active,
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
