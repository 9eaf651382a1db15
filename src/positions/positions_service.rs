use std::sync::Arc;

use log::info;

use super::positions_model::{NewPosition, Position};
use super::positions_repository::PositionRepository;
use crate::db::DbPool;
use crate::positions::Result;

/// Service for managing account positions
pub struct PositionService {
    repository: PositionRepository,
}

impl PositionService {
    /// Creates a new PositionService instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            repository: PositionRepository::new(pool),
        }
    }

    /// Retrieves all positions held in an account
    pub fn get_positions_for_account(&self, account_id: &str) -> Result<Vec<Position>> {
        self.repository.get_by_account(account_id)
    }

    /// Replaces the account's position set with a freshly imported one
    pub fn replace_for_account(
        &self,
        account_id: &str,
        new_positions: Vec<NewPosition>,
    ) -> Result<usize> {
        let count = self.repository.replace_for_account(account_id, new_positions)?;
        info!("Refreshed {} position(s) for account {}", count, account_id);
        Ok(count)
    }
}
