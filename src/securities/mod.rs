// Module declarations
pub(crate) mod securities_errors;
pub(crate) mod securities_model;
pub(crate) mod securities_repository;
pub(crate) mod securities_service;

// Re-export the public interface
pub use securities_model::{
    NewSecurity, NewSecurityBrokerMapping, Security, SecurityBrokerMapping,
};
pub use securities_repository::SecurityRepository;
pub use securities_service::SecurityService;

// Re-export error types for convenience
pub use securities_errors::{Result, SecurityError};
