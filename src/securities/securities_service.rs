use std::sync::Arc;

use log::{debug, info};

use super::securities_model::{NewSecurity, NewSecurityBrokerMapping, Security};
use super::securities_repository::SecurityRepository;
use crate::accounts::Institution;
use crate::db::DbPool;
use crate::market_data::MarketDataProvider;
use crate::securities::{Result, SecurityError};

/// Rewrites a broker symbol into the search provider's format.
/// Brokers use a period as the share-class separator, the provider a dash.
fn map_search_symbol(broker_symbol: &str) -> String {
    broker_symbol.replace('.', "-")
}

/// Maps a broker primary-exchange code onto the provider's market code.
/// Instruments on any other venue are not supported.
fn map_search_exchange(broker_exchange: &str) -> Option<&'static str> {
    match broker_exchange {
        "CSE" => Some("CA"),
        "TSX" => Some("TO"),
        "NYSE" => Some("US"),
        "NASDAQ" => Some("US"),
        _ => None,
    }
}

/// Service resolving broker-reported instruments to canonical securities
pub struct SecurityService {
    repository: SecurityRepository,
    provider: Arc<dyn MarketDataProvider>,
}

impl SecurityService {
    /// Creates a new SecurityService instance
    pub fn new(pool: Arc<DbPool>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            repository: SecurityRepository::new(pool),
            provider,
        }
    }

    /// Retrieves a security by its ID
    pub fn get_security(&self, security_id: &str) -> Result<Security> {
        self.repository.get_by_id(security_id)
    }

    /// Resolves a broker-reported `(symbol, exchange)` pair to a canonical
    /// security, creating it on first sight. Previously resolved broker
    /// instruments are served from the mapping cache without touching the
    /// search provider. Search results are taken in provider order, first
    /// result wins.
    pub async fn resolve_from_broker(
        &self,
        institution: Institution,
        broker_symbol: &str,
        broker_exchange: &str,
        broker_name: &str,
    ) -> Result<Security> {
        if let Some(mapping) =
            self.repository
                .get_mapping(institution.as_str(), broker_symbol, broker_exchange)?
        {
            debug!(
                "Broker instrument {}:{} served from mapping cache",
                broker_symbol, broker_exchange
            );
            return self.repository.get_by_id(&mapping.security_id);
        }

        let exchange = map_search_exchange(broker_exchange).ok_or_else(|| {
            SecurityError::UnsupportedSecurity(format!(
                "No market code for broker exchange {}",
                broker_exchange
            ))
        })?;

        let query = format!("{}.{}", map_search_symbol(broker_symbol), exchange);
        let results = self.provider.search(&query).await?;

        let best = results.first().cloned().ok_or_else(|| {
            SecurityError::UnsupportedSecurity(format!("No search results for {}", query))
        })?;

        let security = self.repository.get_or_create(NewSecurity {
            symbol: best.code.clone(),
            exchange: best.exchange.clone(),
            currency: best.currency.clone(),
            name: best.name.clone(),
            isin: best.isin.clone(),
        })?;

        // The raw payload is kept on the mapping row for auditability.
        self.repository.create_mapping(NewSecurityBrokerMapping {
            institution: institution.as_str().to_string(),
            broker_symbol: broker_symbol.to_string(),
            broker_exchange: broker_exchange.to_string(),
            mapped_symbol: best.code,
            mapped_exchange: best.exchange,
            broker_name: broker_name.to_string(),
            security_id: security.id.clone(),
            search_payload: serde_json::to_string(&results)?,
        })?;

        info!(
            "Resolved broker instrument {}:{} to security {}",
            broker_symbol, broker_exchange, security.id
        );
        Ok(security)
    }

    /// Lists the broker instruments that resolved to a canonical security
    pub fn get_broker_mappings(
        &self,
        security_id: &str,
    ) -> Result<Vec<super::securities_model::SecurityBrokerMapping>> {
        self.repository.list_mappings_for_security(security_id)
    }
}
