use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};

use super::broker_errors::BrokerError;
use super::broker_factory::provider_for;
use super::broker_provider::BrokerProvider;
use super::session_store::SessionStore;
use crate::accounts::{AccountService, Institution};
use crate::db::DbPool;
use crate::errors::{Result, ValidationError};
use crate::positions::{NewPosition, PositionService};
use crate::securities::SecurityService;

/// Orchestrates a broker sync: login, account import, position import.
/// Composes the per-domain services and one provider per institution.
pub struct BrokerSyncService {
    account_service: AccountService,
    position_service: PositionService,
    security_service: Arc<SecurityService>,
    providers: HashMap<Institution, Arc<dyn BrokerProvider>>,
}

impl BrokerSyncService {
    /// Creates a sync service over an explicit provider set
    pub fn new(
        pool: Arc<DbPool>,
        security_service: Arc<SecurityService>,
        providers: Vec<Arc<dyn BrokerProvider>>,
    ) -> Self {
        Self {
            account_service: AccountService::new(pool.clone()),
            position_service: PositionService::new(pool),
            security_service,
            providers: providers
                .into_iter()
                .map(|p| (p.institution(), p))
                .collect(),
        }
    }

    /// Creates a sync service with the default provider for every
    /// supported institution, sharing one session store.
    pub fn with_session_store(
        pool: Arc<DbPool>,
        security_service: Arc<SecurityService>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let providers = vec![provider_for(Institution::Wealthsimple, session_store)];
        Self::new(pool, security_service, providers)
    }

    fn provider(&self, institution: Institution) -> Result<&Arc<dyn BrokerProvider>> {
        self.providers.get(&institution).ok_or_else(|| {
            BrokerError::UnsupportedInstitution(institution.as_str().to_string()).into()
        })
    }

    /// Logs the user into the institution. Returns `true` when a cached
    /// session was reused.
    pub async fn login(
        &self,
        institution: Institution,
        username: &str,
        password: Option<&str>,
        otp: Option<&str>,
    ) -> Result<bool> {
        let reused = self
            .provider(institution)?
            .login(username, password, otp)
            .await?;
        Ok(reused)
    }

    /// Imports the user's broker accounts, optionally restricted to an
    /// explicit id list. Accounts already imported are skipped; the created
    /// count is returned.
    ///
    /// A requested id that the broker no longer reports (closed since
    /// listing, or its account type stopped being supported) fails the
    /// whole import rather than silently importing less than asked.
    pub async fn import_accounts(
        &self,
        user_id: &str,
        institution: Institution,
        username: &str,
        account_ids: Option<&[String]>,
    ) -> Result<usize> {
        let mut broker_accounts = self.provider(institution)?.get_accounts(username).await?;

        if let Some(requested) = account_ids {
            for id in requested {
                if !broker_accounts.iter().any(|a| &a.id == id) {
                    return Err(BrokerError::UnknownAccountType(id.clone()).into());
                }
            }
            broker_accounts.retain(|a| requested.contains(&a.id));
        }

        let created = self
            .account_service
            .import_from_broker(&broker_accounts, user_id)?;
        Ok(created)
    }

    /// Refreshes the position set of one imported account from the broker.
    /// Instruments the resolver cannot place are skipped with a warning;
    /// the surviving set replaces the stored one atomically. Returns the
    /// number of positions stored.
    pub async fn import_positions(
        &self,
        user_id: &str,
        institution: Institution,
        username: &str,
        account_id: &str,
    ) -> Result<usize> {
        let account = self.account_service.get_account(account_id)?;

        if account.user_id != user_id {
            return Err(ValidationError::InvalidInput(format!(
                "Account {} does not belong to user {}",
                account_id, user_id
            ))
            .into());
        }
        if Institution::from_str(&account.institution)? != institution {
            return Err(ValidationError::InvalidInput(format!(
                "Account {} is not a {} account",
                account_id, institution
            ))
            .into());
        }

        let broker_positions = self
            .provider(institution)?
            .get_positions(username, &account.external_id)
            .await?;

        let mut new_positions = Vec::with_capacity(broker_positions.len());
        for broker_position in &broker_positions {
            let security = match self
                .security_service
                .resolve_from_broker(
                    institution,
                    &broker_position.symbol,
                    &broker_position.exchange,
                    &broker_position.name,
                )
                .await
            {
                Ok(security) => security,
                Err(e) => {
                    warn!(
                        "Skipped position {}:{}: {}",
                        broker_position.symbol, broker_position.exchange, e
                    );
                    continue;
                }
            };

            new_positions.push(NewPosition {
                account_id: account.id.clone(),
                security_id: security.id,
                quantity: broker_position.quantity,
                average_cost: broker_position.average_cost,
            });
        }

        let stored = self
            .position_service
            .replace_for_account(&account.id, new_positions)?;
        info!(
            "Imported {} of {} broker position(s) into account {}",
            stored,
            broker_positions.len(),
            account.id
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountType;
    use crate::brokers::broker_model::{BrokerAccount, BrokerPosition};
    use crate::market_data::{MarketDataError, MarketDataProvider, ProviderPrice, SearchResult};
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    struct FakeBroker {
        accounts: Vec<BrokerAccount>,
        positions: Vec<BrokerPosition>,
    }

    #[async_trait]
    impl BrokerProvider for FakeBroker {
        fn institution(&self) -> Institution {
            Institution::Wealthsimple
        }

        async fn login(
            &self,
            _username: &str,
            _password: Option<&str>,
            _otp: Option<&str>,
        ) -> std::result::Result<bool, BrokerError> {
            Ok(false)
        }

        async fn get_accounts(
            &self,
            _username: &str,
        ) -> std::result::Result<Vec<BrokerAccount>, BrokerError> {
            Ok(self.accounts.clone())
        }

        async fn get_positions(
            &self,
            _username: &str,
            broker_account_id: &str,
        ) -> std::result::Result<Vec<BrokerPosition>, BrokerError> {
            Ok(self
                .positions
                .iter()
                .filter(|p| p.broker_account_id == broker_account_id)
                .cloned()
                .collect())
        }
    }

    struct CannedSearchProvider;

    #[async_trait]
    impl MarketDataProvider for CannedSearchProvider {
        async fn search(
            &self,
            query: &str,
        ) -> std::result::Result<Vec<SearchResult>, MarketDataError> {
            // Only instruments the search provider knows resolve
            match query {
                "SHOP.TO" => Ok(vec![SearchResult {
                    code: "SHOP".to_string(),
                    exchange: "TO".to_string(),
                    name: "Shopify Inc".to_string(),
                    currency: "CAD".to_string(),
                    isin: None,
                    other: Default::default(),
                }]),
                "AAPL.US" => Ok(vec![SearchResult {
                    code: "AAPL".to_string(),
                    exchange: "US".to_string(),
                    name: "Apple Inc".to_string(),
                    currency: "USD".to_string(),
                    isin: None,
                    other: Default::default(),
                }]),
                _ => Ok(vec![]),
            }
        }

        async fn get_daily_prices(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> std::result::Result<Vec<ProviderPrice>, MarketDataError> {
            Ok(vec![])
        }
    }

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

    fn broker_position(account_id: &str, symbol: &str, exchange: &str) -> BrokerPosition {
        BrokerPosition {
            broker_account_id: account_id.to_string(),
            name: format!("{} Inc", symbol),
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            quantity: dec!(10),
            average_cost: Some(dec!(20.00)),
        }
    }

    fn sync_service(broker: FakeBroker) -> BrokerSyncService {
        let pool = crate::db::memory_pool();
        let security_service = Arc::new(SecurityService::new(
            pool.clone(),
            Arc::new(CannedSearchProvider),
        ));
        BrokerSyncService::new(pool, security_service, vec![Arc::new(broker)])
    }

    #[tokio::test]
    async fn unresolvable_instruments_are_skipped_not_fatal() {
        let broker = FakeBroker {
            accounts: vec![broker_account("ws-1")],
            positions: vec![
                broker_position("ws-1", "SHOP", "TSX"),
                broker_position("ws-1", "SAP", "XETRA"), // no market code
                broker_position("ws-1", "AAPL", "NASDAQ"),
            ],
        };
        let service = sync_service(broker);

        service
            .import_accounts("user-1", Institution::Wealthsimple, "u@x.com", None)
            .await
            .unwrap();
        let accounts = service.account_service.list_accounts_by_user("user-1").unwrap();
        let account = &accounts[0];

        let stored = service
            .import_positions("user-1", Institution::Wealthsimple, "u@x.com", &account.id)
            .await
            .unwrap();
        assert_eq!(stored, 2);

        let positions = service
            .position_service
            .get_positions_for_account(&account.id)
            .unwrap();
        assert_eq!(positions.len(), 2);
    }

    #[tokio::test]
    async fn requesting_an_account_the_broker_no_longer_lists_fails() {
        let broker = FakeBroker {
            accounts: vec![broker_account("ws-1")],
            positions: vec![],
        };
        let service = sync_service(broker);

        let requested = vec!["ws-1".to_string(), "ws-gone".to_string()];
        let err = service
            .import_accounts(
                "user-1",
                Institution::Wealthsimple,
                "u@x.com",
                Some(&requested),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::errors::Error::Broker(BrokerError::UnknownAccountType(_))
        ));
        // Nothing was imported
        assert!(service
            .account_service
            .list_accounts_by_user("user-1")
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn id_filter_imports_only_the_requested_accounts() {
        let broker = FakeBroker {
            accounts: vec![broker_account("ws-1"), broker_account("ws-2")],
            positions: vec![],
        };
        let service = sync_service(broker);

        let requested = vec!["ws-2".to_string()];
        let created = service
            .import_accounts(
                "user-1",
                Institution::Wealthsimple,
                "u@x.com",
                Some(&requested),
            )
            .await
            .unwrap();

        assert_eq!(created, 1);
        let accounts = service.account_service.list_accounts_by_user("user-1").unwrap();
        assert_eq!(accounts[0].external_id, "ws-2");
    }

    #[tokio::test]
    async fn importing_positions_into_another_users_account_fails() {
        let broker = FakeBroker {
            accounts: vec![broker_account("ws-1")],
            positions: vec![],
        };
        let service = sync_service(broker);

        service
            .import_accounts("user-1", Institution::Wealthsimple, "u@x.com", None)
            .await
            .unwrap();
        let accounts = service.account_service.list_accounts_by_user("user-1").unwrap();
        let account = &accounts[0];

        let err = service
            .import_positions("user-2", Institution::Wealthsimple, "u@x.com", &account.id)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::errors::Error::Validation(_)));
    }
}
