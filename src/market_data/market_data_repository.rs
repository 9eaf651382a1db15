use std::sync::Arc;

use chrono::NaiveDate;
use diesel::prelude::*;

use super::market_data_errors::{MarketDataError, Result};
use super::market_data_model::{NewPrice, Price, PriceDB};
use crate::db::{get_connection, DbConnection, DbPool};
use crate::schema::prices;

/// Repository for the local daily price cache
pub struct MarketDataRepository {
    pool: Arc<DbPool>,
}

impl MarketDataRepository {
    /// Creates a new MarketDataRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<DbConnection> {
        get_connection(&self.pool).map_err(|e| MarketDataError::ProviderError(e.to_string()))
    }

    /// Loads cached prices for a security within a date range, oldest first
    pub fn get_prices(
        &self,
        security_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Price>> {
        let mut conn = self.connection()?;

        prices::table
            .filter(prices::security_id.eq(security_id))
            .filter(prices::date.ge(from))
            .filter(prices::date.le(to))
            .order(prices::date.asc())
            .load::<PriceDB>(&mut conn)
            .map_err(MarketDataError::from)
            .map(|results| results.into_iter().map(Price::from).collect())
    }

    /// Loads the newest cached price for a security
    pub fn get_latest_price(&self, security_id: &str) -> Result<Option<Price>> {
        let mut conn = self.connection()?;

        prices::table
            .filter(prices::security_id.eq(security_id))
            .order(prices::date.desc())
            .first::<PriceDB>(&mut conn)
            .optional()
            .map_err(MarketDataError::from)
            .map(|result| result.map(Price::from))
    }

    /// Loads the cached price for a security on a specific date
    pub fn get_price_on_date(&self, security_id: &str, date: NaiveDate) -> Result<Option<Price>> {
        let mut conn = self.connection()?;

        prices::table
            .filter(prices::security_id.eq(security_id))
            .filter(prices::date.eq(date))
            .first::<PriceDB>(&mut conn)
            .optional()
            .map_err(MarketDataError::from)
            .map(|result| result.map(Price::from))
    }

    /// Appends provider prices to the cache. The `(security_id, date)`
    /// unique index arbitrates overlapping fetches; existing rows are
    /// left untouched.
    pub fn save_prices(&self, new_prices: Vec<NewPrice>) -> Result<usize> {
        let mut conn = self.connection()?;
        let mut saved = 0;

        for new_price in new_prices {
            let mut price_db: PriceDB = new_price.into();
            price_db.id = uuid::Uuid::new_v4().to_string();

            saved += diesel::insert_into(prices::table)
                .values(&price_db)
                .on_conflict((prices::security_id, prices::date))
                .do_nothing()
                .execute(&mut conn)?;
        }

        Ok(saved)
    }
}
