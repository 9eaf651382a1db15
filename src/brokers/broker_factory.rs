use std::sync::Arc;

use super::broker_provider::BrokerProvider;
use super::providers::WealthsimpleProvider;
use super::session_store::SessionStore;
use crate::accounts::Institution;

/// Builds the provider for an institution, wiring in the shared session
/// store. Every supported institution gets a match arm here.
pub fn provider_for(
    institution: Institution,
    session_store: Arc<dyn SessionStore>,
) -> Arc<dyn BrokerProvider> {
    match institution {
        Institution::Wealthsimple => Arc::new(WealthsimpleProvider::new(session_store)),
    }
}
