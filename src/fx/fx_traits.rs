use async_trait::async_trait;
use rust_decimal::Decimal;

use super::fx_errors::FxError;

/// Point-in-time exchange-rate source
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, FxError>;
}
