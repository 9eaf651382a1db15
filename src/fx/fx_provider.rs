use std::str::FromStr;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::fx_errors::FxError;
use super::fx_traits::FxRateProvider;

const BASE_URL: &str = "https://eodhd.com/api/real-time";

/// Live FX rates from the EODHD real-time forex endpoint
pub struct EodhdFxProvider {
    client: Client,
    token: String,
}

/// Partial decode of the real-time quote; `close` is `"NA"` when the
/// pair has not traded yet.
#[derive(Debug, Deserialize)]
struct RealTimeQuote {
    close: serde_json::Value,
}

impl EodhdFxProvider {
    pub fn new(token: String) -> Self {
        EodhdFxProvider {
            client: Client::new(),
            token,
        }
    }

    fn parse_rate(pair: &str, quote: RealTimeQuote) -> Result<Decimal, FxError> {
        match quote.close {
            serde_json::Value::Number(n) => n
                .as_f64()
                .and_then(Decimal::from_f64)
                .ok_or_else(|| FxError::InvalidRate(format!("{}: {}", pair, n))),
            serde_json::Value::String(s) => Decimal::from_str(&s)
                .map_err(|_| FxError::RateNotFound(format!("{}: close is {}", pair, s))),
            other => Err(FxError::InvalidRate(format!("{}: {}", pair, other))),
        }
    }
}

#[async_trait]
impl FxRateProvider for EodhdFxProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, FxError> {
        let pair = format!("{}{}.FOREX", from, to);

        let url = reqwest::Url::parse_with_params(
            &format!("{}/{}", BASE_URL, pair),
            &[("api_token", self.token.as_str()), ("fmt", "json")],
        )
        .map_err(|e| FxError::ProviderError(format!("Failed to build URL: {}", e)))?;

        debug!("Fetching FX rate for {}/{}", from, to);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FxError::ProviderError(format!(
                "EODHD API error: HTTP {}: {}",
                status, body
            )));
        }

        let quote = response.json::<RealTimeQuote>().await?;
        Self::parse_rate(&pair, quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn numeric_close_parses_as_rate() {
        let quote: RealTimeQuote = serde_json::from_str(r#"{"close": 1.3701}"#).unwrap();
        let rate = EodhdFxProvider::parse_rate("USDCAD.FOREX", quote).unwrap();
        assert_eq!(rate, dec!(1.3701));
    }

    #[test]
    fn na_close_is_rate_not_found() {
        let quote: RealTimeQuote = serde_json::from_str(r#"{"close": "NA"}"#).unwrap();
        let err = EodhdFxProvider::parse_rate("USDCAD.FOREX", quote).unwrap_err();
        assert!(matches!(err, FxError::RateNotFound(_)));
    }
}
