use async_trait::async_trait;

use super::broker_errors::Result;
use super::broker_model::{BrokerAccount, BrokerPosition};
use crate::accounts::Institution;

/// Read-only client for one brokerage institution.
///
/// `login` must be called (and succeed) before the fetch operations;
/// providers are expected to reuse a cached session when one is still
/// live and only fall back to credentials when it is not.
#[async_trait]
pub trait BrokerProvider: Send + Sync {
    fn institution(&self) -> Institution;

    /// Establishes a session for `username`. Returns `true` when a cached
    /// session was reused, `false` when a fresh login was performed.
    /// Fails with `OtpRequired` when the institution demands a one-time
    /// passcode that was not supplied, and with `SessionExpired` when the
    /// cached session is dead and no password was given.
    async fn login(
        &self,
        username: &str,
        password: Option<&str>,
        otp: Option<&str>,
    ) -> Result<bool>;

    /// Fetches the open accounts visible to `username`
    async fn get_accounts(&self, username: &str) -> Result<Vec<BrokerAccount>>;

    /// Fetches the positions held in one broker account
    async fn get_positions(
        &self,
        username: &str,
        broker_account_id: &str,
    ) -> Result<Vec<BrokerPosition>>;
}
