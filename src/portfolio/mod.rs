// Module declarations
pub(crate) mod portfolio_model;
pub(crate) mod valuation_service;

// Re-export the public interface
pub use portfolio_model::AccountTotals;
pub use valuation_service::ValuationService;
