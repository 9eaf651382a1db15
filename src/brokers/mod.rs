// Module declarations
pub(crate) mod broker_errors;
pub(crate) mod broker_factory;
pub(crate) mod broker_model;
pub(crate) mod broker_provider;
pub(crate) mod broker_service;
pub(crate) mod providers;
pub(crate) mod session_store;

// Re-export the public interface
pub use broker_factory::provider_for;
pub use broker_model::{BrokerAccount, BrokerAccountId, BrokerPosition, SessionKey};
pub use broker_provider::BrokerProvider;
pub use broker_service::BrokerSyncService;
pub use providers::WealthsimpleProvider;
pub use session_store::{KeyringSessionStore, MemorySessionStore, SessionStore};

// Re-export error types for convenience
pub use broker_errors::{BrokerError, Result};
