pub mod db;

pub mod accounts;
pub mod brokers;
pub mod positions;
pub mod securities;

pub mod errors;
pub mod fx;
pub mod market_data;
pub mod portfolio;
pub mod schema;

pub use errors::{Error, Result};
