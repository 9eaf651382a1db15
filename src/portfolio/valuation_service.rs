use std::sync::Arc;

use log::debug;
use rust_decimal::Decimal;

use super::portfolio_model::AccountTotals;
use crate::db::DbPool;
use crate::errors::Result;
use crate::fx::FxService;
use crate::market_data::MarketDataService;
use crate::positions::PositionService;
use crate::securities::SecurityRepository;

/// Values an account's positions at the latest known closes
pub struct ValuationService {
    position_service: PositionService,
    security_repository: SecurityRepository,
    market_data_service: Arc<MarketDataService>,
    fx_service: Arc<FxService>,
}

impl ValuationService {
    /// Creates a new ValuationService instance
    pub fn new(
        pool: Arc<DbPool>,
        market_data_service: Arc<MarketDataService>,
        fx_service: Arc<FxService>,
    ) -> Self {
        Self {
            position_service: PositionService::new(pool.clone()),
            security_repository: SecurityRepository::new(pool),
            market_data_service,
            fx_service,
        }
    }

    /// Totals the account's cost basis and market value in the reporting
    /// currency. Cost and value are computed per position in the security's
    /// own currency, rounded to 2 decimal places, converted, then summed.
    /// A security with no price in the lookback window contributes zero
    /// market value; a position pointing at a missing security is fatal.
    pub async fn get_account_totals(
        &self,
        account_id: &str,
        reporting_currency: &str,
    ) -> Result<AccountTotals> {
        let positions = self.position_service.get_positions_for_account(account_id)?;

        let mut total_cost = Decimal::ZERO;
        let mut total_market_value = Decimal::ZERO;

        for position in positions {
            let security = self.security_repository.get_by_id(&position.security_id)?;

            let average_cost = position.average_cost.unwrap_or(Decimal::ZERO);
            let cost = (position.quantity * average_cost).round_dp(2);

            let close = match self.market_data_service.get_latest_close(&security).await? {
                Some(price) => price.close,
                None => {
                    debug!(
                        "No recent close for {}, valuing at zero",
                        security.provider_symbol()
                    );
                    Decimal::ZERO
                }
            };
            let market_value = (close * position.quantity).round_dp(2);

            total_cost += self
                .fx_service
                .convert(cost, &security.currency, reporting_currency)
                .await?;
            total_market_value += self
                .fx_service
                .convert(market_value, &security.currency, reporting_currency)
                .await?;
        }

        Ok(AccountTotals {
            account_id: account_id.to_string(),
            currency: reporting_currency.to_string(),
            cost: total_cost,
            market_value: total_market_value,
        })
    }
}
