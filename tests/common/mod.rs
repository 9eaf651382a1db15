use std::sync::Arc;

use chrono::Local;
use portfolio_core::db::{self, DbPool};

/// Creates a throwaway file-backed database for one integration test and
/// returns the pool together with the path for cleanup.
pub fn setup_db(test_id: &str) -> (Arc<DbPool>, String) {
    let db_path = Local::now()
        .format(&format!("./tests/output/%Y%m%d-%H%M%S-{}.db", test_id))
        .to_string();

    db::init(&db_path).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");

    (pool, db_path)
}

pub fn cleanup_db(db_path: &str) {
    let _ = std::fs::remove_file(db_path);
}
