use std::sync::Arc;

use diesel::dsl::count_star;
use diesel::prelude::*;

use super::accounts_model::{Account, AccountDB, NewAccount};
use crate::accounts::{AccountError, Result};
use crate::db::{get_connection, DbPool};
use crate::schema::accounts;
use crate::schema::accounts::dsl::*;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<DbPool>,
}

impl AccountRepository {
    /// Creates a new AccountRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Creates a new account in the database
    pub fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        let mut account_db: AccountDB = new_account.into();
        account_db.id = uuid::Uuid::new_v4().to_string();

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        diesel::insert_into(accounts::table)
            .values(&account_db)
            .execute(&mut conn)
            .map_err(AccountError::from)?;

        Ok(account_db.into())
    }

    /// Retrieves an account by its ID
    pub fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let account = accounts
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with id {} not found", account_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        Ok(account.into())
    }

    /// Lists accounts belonging to a user
    pub fn list_by_user(&self, user: &str) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        accounts
            .filter(user_id.eq(user))
            .order(name.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(AccountError::from)
            .map(|results| results.into_iter().map(Account::from).collect())
    }

    /// Checks whether a broker account has already been imported for a user.
    /// `(user_id, institution, external_id)` is the import idempotence key.
    pub fn exists_by_import_key(
        &self,
        user: &str,
        institution_name: &str,
        external: &str,
    ) -> Result<bool> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let count: i64 = accounts
            .filter(user_id.eq(user))
            .filter(institution.eq(institution_name))
            .filter(external_id.eq(external))
            .select(count_star())
            .first(&mut conn)
            .map_err(AccountError::from)?;

        Ok(count > 0)
    }
}
