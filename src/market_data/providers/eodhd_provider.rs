use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::super::market_data_errors::MarketDataError;
use super::super::market_data_model::{ProviderPrice, SearchResult};
use super::market_data_provider::MarketDataProvider;

const BASE_URL: &str = "https://eodhd.com/api";

/// EODHD market data client (search + end-of-day history)
pub struct EodhdProvider {
    client: Client,
    token: String,
}

impl EodhdProvider {
    pub fn new(token: String) -> Self {
        EodhdProvider {
            client: Client::new(),
            token,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(&str, &str)>,
    ) -> Result<T, MarketDataError> {
        let mut query_params = params;
        query_params.push(("api_token", &self.token));
        query_params.push(("fmt", "json"));

        let url =
            reqwest::Url::parse_with_params(&format!("{}/{}", BASE_URL, path), &query_params)
                .map_err(|e| MarketDataError::ProviderError(format!("Failed to build URL: {}", e)))?;

        debug!("GET {}/{}", BASE_URL, path);
        let response = self.client.get(url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<T>().await?),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
                MarketDataError::Unauthorized("EODHD rejected the API token".to_string()),
            ),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(MarketDataError::RateLimitExceeded),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MarketDataError::ProviderError(format!(
                    "EODHD API error: HTTP {}: {}",
                    status, body
                )))
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for EodhdProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        self.fetch_json(&format!("search/{}", query), vec![]).await
    }

    async fn get_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderPrice>, MarketDataError> {
        let from = start.format("%Y-%m-%d").to_string();
        let to = end.format("%Y-%m-%d").to_string();

        self.fetch_json(
            &format!("eod/{}", symbol),
            vec![("period", "d"), ("from", &from), ("to", &to)],
        )
        .await
    }
}
