use std::sync::Arc;

use rust_decimal::Decimal;

use super::fx_errors::Result;
use super::fx_traits::FxRateProvider;

/// Service converting amounts between currencies at the current rate
pub struct FxService {
    provider: Arc<dyn FxRateProvider>,
}

impl FxService {
    /// Creates a new FxService instance
    pub fn new(provider: Arc<dyn FxRateProvider>) -> Self {
        Self { provider }
    }

    /// Converts an amount into the target currency, rounded to 2 decimal
    /// places. An amount already in the target currency passes through
    /// unchanged, with no re-rounding.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }

        let rate = self.provider.get_rate(from, to).await?;
        Ok((amount * rate).round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::fx_errors::FxError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedRateProvider {
        rate: Decimal,
    }

    #[async_trait]
    impl FxRateProvider for FixedRateProvider {
        async fn get_rate(
            &self,
            _from: &str,
            _to: &str,
        ) -> std::result::Result<Decimal, FxError> {
            Ok(self.rate)
        }
    }

    struct UnreachableProvider;

    #[async_trait]
    impl FxRateProvider for UnreachableProvider {
        async fn get_rate(&self, from: &str, to: &str) -> std::result::Result<Decimal, FxError> {
            panic!("rate lookup for {}/{} should not happen", from, to);
        }
    }

    #[tokio::test]
    async fn same_currency_passes_through_untouched() {
        let service = FxService::new(Arc::new(UnreachableProvider));

        // Three decimal places survive: no rounding is re-applied
        let amount = dec!(1234.567);
        let converted = service.convert(amount, "CAD", "CAD").await.unwrap();
        assert_eq!(converted, amount);
    }

    #[tokio::test]
    async fn conversion_applies_rate_and_rounds() {
        let service = FxService::new(Arc::new(FixedRateProvider { rate: dec!(1.37) }));

        let converted = service.convert(dec!(100.10), "USD", "CAD").await.unwrap();
        assert_eq!(converted, dec!(137.14)); // 137.137 rounded
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        struct FailingProvider;

        #[async_trait]
        impl FxRateProvider for FailingProvider {
            async fn get_rate(
                &self,
                _from: &str,
                _to: &str,
            ) -> std::result::Result<Decimal, FxError> {
                Err(FxError::ProviderError("unreachable".to_string()))
            }
        }

        let service = FxService::new(Arc::new(FailingProvider));
        assert!(service.convert(dec!(1), "USD", "CAD").await.is_err());
    }
}
