use async_trait::async_trait;
use chrono::NaiveDate;

use super::super::market_data_errors::MarketDataError;
use super::super::market_data_model::{ProviderPrice, SearchResult};

/// Remote market data source: instrument search plus daily OHLCV history.
/// `symbol` is the provider-format identifier, e.g. `SHOP.TO`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError>;

    async fn get_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderPrice>, MarketDataError>;
}
