use std::sync::Arc;

use log::{debug, info};

use super::accounts_model::{Account, NewAccount};
use super::accounts_repository::AccountRepository;
use crate::accounts::Result;
use crate::brokers::broker_model::BrokerAccount;
use crate::db::DbPool;

/// Service for managing imported brokerage accounts
pub struct AccountService {
    repository: AccountRepository,
}

impl AccountService {
    /// Creates a new AccountService instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            repository: AccountRepository::new(pool),
        }
    }

    /// Retrieves an account by its ID
    pub fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    /// Lists all accounts belonging to a user
    pub fn list_accounts_by_user(&self, user_id: &str) -> Result<Vec<Account>> {
        self.repository.list_by_user(user_id)
    }

    /// Imports broker-reported accounts for a user, skipping accounts that
    /// were already imported. Returns the number of accounts created.
    pub fn import_from_broker(
        &self,
        broker_accounts: &[BrokerAccount],
        user_id: &str,
    ) -> Result<usize> {
        let mut created = 0;

        for broker_account in broker_accounts {
            let exists = self.repository.exists_by_import_key(
                user_id,
                broker_account.institution.as_str(),
                &broker_account.id,
            )?;

            if exists {
                debug!(
                    "Account {} already imported for user {}, skipping",
                    broker_account.id, user_id
                );
                continue;
            }

            self.repository
                .create(NewAccount::from_broker(broker_account, user_id))?;
            created += 1;
        }

        info!("Imported {} account(s) for user {}", created, user_id);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountType, Institution};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn broker_account(id: &str) -> BrokerAccount {
        BrokerAccount {
            id: id.to_string(),
            account_type: AccountType::Tfsa,
            institution: Institution::Wealthsimple,
            currency: "CAD".to_string(),
            display_name: format!("Account {}", id),
            value: dec!(1000.00),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn import_is_idempotent_per_external_account() {
        let pool = crate::db::memory_pool();
        let service = AccountService::new(pool);

        let broker_accounts = vec![broker_account("ws-account-1"), broker_account("ws-account-2")];

        let first = service
            .import_from_broker(&broker_accounts, "user-1")
            .unwrap();
        assert_eq!(first, 2);

        // Re-importing the same accounts creates nothing new
        let second = service
            .import_from_broker(&broker_accounts, "user-1")
            .unwrap();
        assert_eq!(second, 0);

        let accounts = service.list_accounts_by_user("user-1").unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.institution == "WEALTHSIMPLE"));
    }

    #[test]
    fn same_external_account_is_separate_per_user() {
        let pool = crate::db::memory_pool();
        let service = AccountService::new(pool);

        let broker_accounts = vec![broker_account("ws-account-1")];

        assert_eq!(
            service
                .import_from_broker(&broker_accounts, "user-1")
                .unwrap(),
            1
        );
        assert_eq!(
            service
                .import_from_broker(&broker_accounts, "user-2")
                .unwrap(),
            1
        );
    }
}
