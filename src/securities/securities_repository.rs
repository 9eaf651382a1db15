use std::sync::Arc;

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::securities_model::{
    NewSecurity, NewSecurityBrokerMapping, Security, SecurityBrokerMapping,
    SecurityBrokerMappingDB, SecurityDB,
};
use crate::db::{get_connection, DbConnection, DbPool};
use crate::schema::{securities, security_broker_mappings};
use crate::securities::{Result, SecurityError};

/// Repository for canonical securities and their broker mappings
pub struct SecurityRepository {
    pool: Arc<DbPool>,
}

impl SecurityRepository {
    /// Creates a new SecurityRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<DbConnection> {
        get_connection(&self.pool).map_err(|e| SecurityError::DatabaseError(e.to_string()))
    }

    /// Retrieves a security by its ID
    pub fn get_by_id(&self, security_id: &str) -> Result<Security> {
        let mut conn = self.connection()?;

        let security = securities::table
            .find(security_id)
            .first::<SecurityDB>(&mut conn)
            .map_err(|e| match e {
                DieselError::NotFound => {
                    SecurityError::NotFound(format!("Security with id {} not found", security_id))
                }
                _ => SecurityError::DatabaseError(e.to_string()),
            })?;

        Ok(security.into())
    }

    fn find_by_symbol_and_exchange(
        &self,
        conn: &mut DbConnection,
        symbol: &str,
        exchange: &str,
    ) -> Result<Option<Security>> {
        securities::table
            .filter(securities::symbol.eq(symbol))
            .filter(securities::exchange.eq(exchange))
            .first::<SecurityDB>(conn)
            .optional()
            .map_err(SecurityError::from)
            .map(|result| result.map(Security::from))
    }

    /// Retrieves the security for `(symbol, exchange)`, creating it when
    /// absent. Concurrent creators converge on the same row: the unique
    /// index arbitrates, and the loser re-reads the winner's insert.
    pub fn get_or_create(&self, new_security: NewSecurity) -> Result<Security> {
        let mut conn = self.connection()?;

        if let Some(existing) =
            self.find_by_symbol_and_exchange(&mut conn, &new_security.symbol, &new_security.exchange)?
        {
            return Ok(existing);
        }

        let symbol = new_security.symbol.clone();
        let exchange = new_security.exchange.clone();

        let mut security_db: SecurityDB = new_security.into();
        security_db.id = uuid::Uuid::new_v4().to_string();

        match diesel::insert_into(securities::table)
            .values(&security_db)
            .execute(&mut conn)
        {
            Ok(_) => Ok(security_db.into()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => self
                .find_by_symbol_and_exchange(&mut conn, &symbol, &exchange)?
                .ok_or_else(|| {
                    SecurityError::NotFound(format!(
                        "Security {}.{} vanished after conflicting insert",
                        symbol, exchange
                    ))
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up a cached broker mapping
    pub fn get_mapping(
        &self,
        institution: &str,
        broker_symbol: &str,
        broker_exchange: &str,
    ) -> Result<Option<SecurityBrokerMapping>> {
        let mut conn = self.connection()?;

        security_broker_mappings::table
            .filter(security_broker_mappings::institution.eq(institution))
            .filter(security_broker_mappings::broker_symbol.eq(broker_symbol))
            .filter(security_broker_mappings::broker_exchange.eq(broker_exchange))
            .first::<SecurityBrokerMappingDB>(&mut conn)
            .optional()
            .map_err(SecurityError::from)
            .map(|result| result.map(SecurityBrokerMapping::from))
    }

    /// Records a broker mapping. A concurrent resolution of the same broker
    /// instrument may have inserted first; the existing row wins.
    pub fn create_mapping(
        &self,
        new_mapping: NewSecurityBrokerMapping,
    ) -> Result<SecurityBrokerMapping> {
        let mut conn = self.connection()?;

        let institution = new_mapping.institution.clone();
        let broker_symbol = new_mapping.broker_symbol.clone();
        let broker_exchange = new_mapping.broker_exchange.clone();

        let mut mapping_db: SecurityBrokerMappingDB = new_mapping.into();
        mapping_db.id = uuid::Uuid::new_v4().to_string();

        match diesel::insert_into(security_broker_mappings::table)
            .values(&mapping_db)
            .execute(&mut conn)
        {
            Ok(_) => Ok(mapping_db.into()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => self
                .get_mapping(&institution, &broker_symbol, &broker_exchange)?
                .ok_or_else(|| {
                    SecurityError::NotFound(format!(
                        "Broker mapping for {}:{} vanished after conflicting insert",
                        broker_symbol, broker_exchange
                    ))
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists all mappings recorded for a canonical security
    pub fn list_mappings_for_security(
        &self,
        security_id: &str,
    ) -> Result<Vec<SecurityBrokerMapping>> {
        let mut conn = self.connection()?;

        security_broker_mappings::table
            .filter(security_broker_mappings::security_id.eq(security_id))
            .order(security_broker_mappings::created_at.asc())
            .load::<SecurityBrokerMappingDB>(&mut conn)
            .map_err(SecurityError::from)
            .map(|results| {
                results
                    .into_iter()
                    .map(SecurityBrokerMapping::from)
                    .collect()
            })
    }
}
