use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use log::debug;

use super::market_data_errors::Result;
use super::market_data_model::{NewPrice, Price};
use super::market_data_repository::MarketDataRepository;
use super::providers::MarketDataProvider;
use crate::db::DbPool;
use crate::securities::Security;

const LATEST_CLOSE_LOOKBACK_DAYS: i64 = 7;

/// Most recent day for which a close is expected, relative to `today`:
/// yesterday, pulled back over weekends. Market holidays are not modeled;
/// on a holiday Monday this yields one redundant provider fetch.
pub fn expected_latest_close_date(today: NaiveDate) -> NaiveDate {
    let mut date = today - Duration::days(1);
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date -= Duration::days(1);
    }
    date
}

/// Service for retrieving daily prices through the local cache
pub struct MarketDataService {
    repository: MarketDataRepository,
    provider: Arc<dyn MarketDataProvider>,
}

impl MarketDataService {
    /// Creates a new MarketDataService instance
    pub fn new(pool: Arc<DbPool>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            repository: MarketDataRepository::new(pool),
            provider,
        }
    }

    /// Returns the daily series for a security over `[from, to]`. Served
    /// from the cache when it already extends through the last expected
    /// close; otherwise the full range is refetched and appended.
    pub async fn get_daily_prices(
        &self,
        security: &Security,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Price>> {
        let cached = self.repository.get_prices(&security.id, from, to)?;

        let expected_end = expected_latest_close_date(Utc::now().date_naive()).min(to);
        if let Some(newest) = cached.last() {
            if newest.date >= expected_end {
                return Ok(cached);
            }
        }

        debug!(
            "Price cache stale for {} ({} - {}), fetching from provider",
            security.provider_symbol(),
            from,
            to
        );

        let fetched = self
            .provider
            .get_daily_prices(&security.provider_symbol(), from, to)
            .await?;

        self.repository.save_prices(
            fetched
                .into_iter()
                .map(|p| NewPrice::from_provider(&security.id, p))
                .collect(),
        )?;

        self.repository.get_prices(&security.id, from, to)
    }

    /// Returns the latest known close for a security, or `None` when the
    /// provider has nothing within the lookback window.
    pub async fn get_latest_close(&self, security: &Security) -> Result<Option<Price>> {
        let today = Utc::now().date_naive();
        let expected = expected_latest_close_date(today);

        if let Some(latest) = self.repository.get_latest_price(&security.id)? {
            if latest.date >= expected {
                return Ok(Some(latest));
            }
        }

        let prices = self
            .get_daily_prices(
                security,
                today - Duration::days(LATEST_CLOSE_LOOKBACK_DAYS),
                expected,
            )
            .await?;

        Ok(prices.last().cloned())
    }

    /// Returns the close for a security on a specific date, fetching and
    /// caching it on a miss.
    pub async fn get_price_on_date(
        &self,
        security: &Security,
        date: NaiveDate,
    ) -> Result<Option<Price>> {
        if let Some(price) = self.repository.get_price_on_date(&security.id, date)? {
            return Ok(Some(price));
        }

        let fetched = self
            .provider
            .get_daily_prices(&security.provider_symbol(), date, date)
            .await?;

        self.repository.save_prices(
            fetched
                .into_iter()
                .map(|p| NewPrice::from_provider(&security.id, p))
                .collect(),
        )?;

        self.repository.get_price_on_date(&security.id, date)
    }
}
