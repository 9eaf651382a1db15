use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated cost and market value of one account, expressed in the
/// reporting currency requested by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTotals {
    pub account_id: String,
    pub currency: String,
    pub cost: Decimal,
    pub market_value: Decimal,
}
