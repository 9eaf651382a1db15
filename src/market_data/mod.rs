// Module declarations
pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_repository;
pub(crate) mod market_data_service;
pub(crate) mod providers;

// Re-export the public interface
pub use market_data_model::{NewPrice, Price, PriceDB, ProviderPrice, SearchResult};
pub use market_data_repository::MarketDataRepository;
pub use market_data_service::{expected_latest_close_date, MarketDataService};

// Re-export provider types
pub use providers::{EodhdProvider, MarketDataProvider};

// Re-export error types for convenience
pub use market_data_errors::MarketDataError;
