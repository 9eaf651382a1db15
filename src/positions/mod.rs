// Module declarations
pub(crate) mod positions_errors;
pub(crate) mod positions_model;
pub(crate) mod positions_repository;
pub(crate) mod positions_service;

// Re-export the public interface
pub use positions_model::{NewPosition, Position, PositionDB};
pub use positions_repository::PositionRepository;
pub use positions_service::PositionService;

// Re-export error types for convenience
pub use positions_errors::{PositionError, Result};
