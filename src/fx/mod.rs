// Module declarations
pub(crate) mod fx_errors;
pub(crate) mod fx_provider;
pub(crate) mod fx_service;
pub(crate) mod fx_traits;

// Re-export the public interface
pub use fx_provider::EodhdFxProvider;
pub use fx_service::FxService;
pub use fx_traits::FxRateProvider;

// Re-export error types for convenience
pub use fx_errors::{FxError, Result};
