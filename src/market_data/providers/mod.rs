pub mod eodhd_provider;
pub mod market_data_provider;

pub use eodhd_provider::EodhdProvider;
pub use market_data_provider::MarketDataProvider;
