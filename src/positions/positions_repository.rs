use std::sync::Arc;

use diesel::prelude::*;
use diesel::result::Error as DieselError;

use super::positions_model::{NewPosition, Position, PositionDB};
use crate::db::{get_connection, DbPool};
use crate::positions::{PositionError, Result};
use crate::schema::positions;
use crate::schema::positions::dsl::*;

/// Repository for managing position data in the database
pub struct PositionRepository {
    pool: Arc<DbPool>,
}

impl PositionRepository {
    /// Creates a new PositionRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Retrieves all positions held in an account
    pub fn get_by_account(&self, account: &str) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| PositionError::DatabaseError(e.to_string()))?;

        positions
            .filter(account_id.eq(account))
            .order(updated_at.asc())
            .load::<PositionDB>(&mut conn)
            .map_err(PositionError::from)
            .map(|results| results.into_iter().map(Position::from).collect())
    }

    /// Replaces the full position set of an account in one transaction.
    /// Positions no longer reported by the broker are removed, so a
    /// re-import converges to the broker's current state.
    pub fn replace_for_account(
        &self,
        account: &str,
        new_positions: Vec<NewPosition>,
    ) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| PositionError::DatabaseError(e.to_string()))?;

        conn.transaction::<usize, DieselError, _>(|conn| {
            diesel::delete(positions.filter(account_id.eq(account))).execute(conn)?;

            let mut inserted = 0;
            for new_position in new_positions {
                let mut position_db: PositionDB = new_position.into();
                position_db.id = uuid::Uuid::new_v4().to_string();

                diesel::insert_into(positions::table)
                    .values(&position_db)
                    .execute(conn)?;
                inserted += 1;
            }

            Ok(inserted)
        })
        .map_err(PositionError::from)
    }
}
