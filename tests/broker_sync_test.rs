use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use portfolio_core::accounts::Institution;
use portfolio_core::brokers::{
    BrokerAccount, BrokerError, BrokerPosition, BrokerProvider, BrokerSyncService,
};
use portfolio_core::fx::{FxError, FxRateProvider, FxService};
use portfolio_core::market_data::{
    expected_latest_close_date, MarketDataError, MarketDataProvider, MarketDataService,
    ProviderPrice, SearchResult,
};
use portfolio_core::portfolio::ValuationService;
use portfolio_core::securities::SecurityService;

mod common;

struct FakeBroker;

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
    ) -> Result<bool, BrokerError> {
        Ok(false)
    }

    async fn get_accounts(&self, _username: &str) -> Result<Vec<BrokerAccount>, BrokerError> {
        Ok(vec![BrokerAccount {
            id: "ws-tfsa-1".to_string(),
            account_type: portfolio_core::accounts::AccountType::Tfsa,
            institution: Institution::Wealthsimple,
            currency: "CAD".to_string(),
            display_name: "TFSA".to_string(),
            value: dec!(2500.00),
            created_at: Utc::now(),
        }])
    }

    async fn get_positions(
        &self,
        _username: &str,
        broker_account_id: &str,
    ) -> Result<Vec<BrokerPosition>, BrokerError> {
        Ok(vec![
            BrokerPosition {
                broker_account_id: broker_account_id.to_string(),
                name: "Shopify Inc".to_string(),
                symbol: "SHOP".to_string(),
                exchange: "TSX".to_string(),
                quantity: dec!(10),
                average_cost: Some(dec!(20.00)),
            },
            BrokerPosition {
                broker_account_id: broker_account_id.to_string(),
                name: "Apple Inc".to_string(),
                symbol: "AAPL".to_string(),
                exchange: "NASDAQ".to_string(),
                quantity: dec!(2),
                average_cost: Some(dec!(90.00)),
            },
        ])
    }
}

struct FakeMarketData;

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
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
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<ProviderPrice>, MarketDataError> {
        let close = match symbol {
            "SHOP.TO" => 30.0,
            "AAPL.US" => 100.0,
            _ => return Ok(vec![]),
        };
        Ok(vec![ProviderPrice {
            date: expected_latest_close_date(Utc::now().date_naive()),
            open: close,
            high: close,
            low: close,
            close,
            adjusted_close: close,
            volume: 1_000,
        }])
    }
}

/// 1.50 CAD per USD
struct UsdCadRate;

#[async_trait]
impl FxRateProvider for UsdCadRate {
    async fn get_rate(&self, _from: &str, _to: &str) -> Result<Decimal, FxError> {
        Ok(dec!(1.50))
    }
}

#[tokio::test]
async fn full_sync_imports_accounts_positions_and_values_them() {
    let (pool, db_path) = common::setup_db("full_sync");

    let market_provider = Arc::new(FakeMarketData);
    let security_service = Arc::new(SecurityService::new(pool.clone(), market_provider.clone()));
    let sync_service =
        BrokerSyncService::new(pool.clone(), security_service, vec![Arc::new(FakeBroker)]);

    // Login, then import the user's accounts
    let reused = sync_service
        .login(Institution::Wealthsimple, "user@example.com", Some("pw"), None)
        .await
        .unwrap();
    assert!(!reused);

    let created = sync_service
        .import_accounts("user-1", Institution::Wealthsimple, "user@example.com", None)
        .await
        .unwrap();
    assert_eq!(created, 1);

    // Re-running the import creates nothing new
    let created_again = sync_service
        .import_accounts("user-1", Institution::Wealthsimple, "user@example.com", None)
        .await
        .unwrap();
    assert_eq!(created_again, 0);

    let account_service = portfolio_core::accounts::AccountService::new(pool.clone());
    let accounts = account_service.list_accounts_by_user("user-1").unwrap();
    let account = &accounts[0];
    assert_eq!(account.external_id, "ws-tfsa-1");
    assert_eq!(account.account_type, "TFSA");

    // Import positions into the account
    let stored = sync_service
        .import_positions(
            "user-1",
            Institution::Wealthsimple,
            "user@example.com",
            &account.id,
        )
        .await
        .unwrap();
    assert_eq!(stored, 2);

    // A second import replaces, not appends
    let stored_again = sync_service
        .import_positions(
            "user-1",
            Institution::Wealthsimple,
            "user@example.com",
            &account.id,
        )
        .await
        .unwrap();
    assert_eq!(stored_again, 2);

    // Value the account in CAD:
    //   SHOP: 10 x 20.00 CAD cost, 10 x 30.00 CAD market value
    //   AAPL: 2 x 90.00 USD cost, 2 x 100.00 USD market value, at 1.50
    let market_data_service = Arc::new(MarketDataService::new(pool.clone(), market_provider));
    let fx_service = Arc::new(FxService::new(Arc::new(UsdCadRate)));
    let valuation_service = ValuationService::new(pool, market_data_service, fx_service);

    let totals = valuation_service
        .get_account_totals(&account.id, "CAD")
        .await
        .unwrap();

    assert_eq!(totals.cost, dec!(470.00));
    assert_eq!(totals.market_value, dec!(600.00));
    assert_eq!(totals.currency, "CAD");

    common::cleanup_db(&db_path);
}
