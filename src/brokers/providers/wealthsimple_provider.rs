use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::super::broker_errors::{BrokerError, Result};
use super::super::broker_model::{BrokerAccount, BrokerPosition, SessionKey};
use super::super::broker_provider::BrokerProvider;
use super::super::session_store::SessionStore;
use crate::accounts::{AccountType, Institution};

const WEALTHSIMPLE_API_URL: &str = "https://my.wealthsimple.com/api/v1";

// Cash balance lines share the holdings payload with securities
const CASH_SECURITY_PREFIX: &str = "sec-c-";

/// Maps the broker's unified account type onto a canonical account type.
/// Managed and crypto account flavours are deliberately absent.
fn map_account_type(unified_account_type: &str) -> Option<AccountType> {
    match unified_account_type {
        "SELF_DIRECTED_TFSA" => Some(AccountType::Tfsa),
        "SELF_DIRECTED_RRSP" => Some(AccountType::Rrsp),
        "SELF_DIRECTED_FHSA" => Some(AccountType::Fhsa),
        "SELF_DIRECTED_NON_REGISTERED" => Some(AccountType::NonRegistered),
        _ => None,
    }
}

/// The holdings endpoint wraps security ids in square brackets.
fn strip_security_id(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

// Wire structs: only the fields the importer reads are decoded, the rest
// of the payload is ignored.

#[derive(Debug, Deserialize)]
struct WsLoginResponse {
    session: String,
}

#[derive(Debug, Deserialize)]
struct WsErrorResponse {
    error: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WsMoney {
    amount: String,
}

impl WsMoney {
    fn to_decimal(&self) -> Result<Decimal> {
        Decimal::from_str(&self.amount).map_err(|_| {
            BrokerError::InvalidApiResponse(format!("Unparseable amount: {}", self.amount))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsAccount {
    id: String,
    status: String,
    unified_account_type: String,
    currency: String,
    created_at: DateTime<Utc>,
    custodian_accounts: Vec<WsCustodianAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsCustodianAccount {
    id: String,
    financials: WsFinancials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsFinancials {
    current: WsCurrentFinancials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsCurrentFinancials {
    net_liquidation_value: WsMoney,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsSecurityMarketData {
    stock: WsStock,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsStock {
    name: String,
    symbol: String,
    primary_exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsIdentityPosition {
    accounts: Vec<WsPositionAccount>,
    average_price: Option<WsMoney>,
}

#[derive(Debug, Deserialize)]
struct WsPositionAccount {
    id: String,
}

/// Wealthsimple self-directed investing client. Sessions are opaque token
/// strings owned by the injected store; a cached session is probed before
/// credentials are ever used.
pub struct WealthsimpleProvider {
    client: Client,
    base_url: String,
    session_store: Arc<dyn SessionStore>,
}

impl WealthsimpleProvider {
    pub fn new(session_store: Arc<dyn SessionStore>) -> Self {
        Self::with_base_url(session_store, WEALTHSIMPLE_API_URL)
    }

    pub fn with_base_url(session_store: Arc<dyn SessionStore>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_store,
        }
    }

    fn session_key(&self, username: &str) -> SessionKey {
        SessionKey::new(Institution::Wealthsimple, username)
    }

    fn require_session(&self, username: &str) -> Result<String> {
        self.session_store
            .get(&self.session_key(username))?
            .ok_or_else(|| BrokerError::SessionMissing(self.session_key(username).to_string()))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        session: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(session)
            .query(query)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BrokerError::SessionExpired),
            status if !status.is_success() => Err(BrokerError::ApiRequestFailed(format!(
                "{} returned status {}",
                path, status
            ))),
            _ => Ok(response.json::<T>().await?),
        }
    }

    /// Cheapest authenticated call, used to test whether a cached session
    /// is still live.
    async fn probe_session(&self, session: &str) -> Result<()> {
        let _: Vec<WsAccount> = self.fetch_json(session, "accounts", &[]).await?;
        Ok(())
    }

    async fn password_login(
        &self,
        username: &str,
        password: &str,
        otp: Option<&str>,
    ) -> Result<String> {
        let mut body = HashMap::from([("username", username), ("password", password)]);
        if let Some(otp) = otp {
            body.insert("otp", otp);
        }

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let failure = response.json::<WsErrorResponse>().await?;
            return Err(map_login_failure(&failure.error));
        }
        if !response.status().is_success() {
            return Err(BrokerError::ApiRequestFailed(format!(
                "login returned status {}",
                response.status()
            )));
        }

        Ok(response.json::<WsLoginResponse>().await?.session)
    }

    fn parse_account(&self, ws_account: WsAccount) -> Result<Option<BrokerAccount>> {
        if ws_account.status != "open" {
            return Ok(None);
        }

        let account_type = match map_account_type(&ws_account.unified_account_type) {
            Some(account_type) => account_type,
            None => {
                warn!(
                    "Unsupported account type {}",
                    ws_account.unified_account_type
                );
                return Ok(None);
            }
        };

        let custodian = ws_account.custodian_accounts.first().ok_or_else(|| {
            BrokerError::InvalidApiResponse(format!(
                "Account {} has no custodian account",
                ws_account.id
            ))
        })?;

        Ok(Some(BrokerAccount {
            id: ws_account.id,
            account_type,
            institution: Institution::Wealthsimple,
            currency: ws_account.currency,
            display_name: custodian.id.clone(),
            value: custodian.financials.current.net_liquidation_value.to_decimal()?,
            created_at: ws_account.created_at,
        }))
    }

    async fn fetch_position(
        &self,
        session: &str,
        broker_account_id: &str,
        security_id: &str,
        balance: f64,
    ) -> Result<Option<BrokerPosition>> {
        if security_id.starts_with(CASH_SECURITY_PREFIX) {
            info!("Skipping cash line {}", security_id);
            return Ok(None);
        }

        let security_id = strip_security_id(security_id);

        let market_data: WsSecurityMarketData = self
            .fetch_json(
                session,
                &format!("securities/{}/market-data", security_id),
                &[],
            )
            .await?;

        let exchange = match market_data.stock.primary_exchange {
            Some(exchange) => exchange,
            None => {
                warn!(
                    "Skipped security {}: no primary exchange",
                    market_data.stock.symbol
                );
                return Ok(None);
            }
        };

        let identity_positions: Vec<WsIdentityPosition> = self
            .fetch_json(
                session,
                "identity/positions",
                &[("security_ids", security_id), ("currency", "CAD")],
            )
            .await?;

        let average_cost = average_cost_for_account(&identity_positions, broker_account_id)?;

        let quantity = Decimal::from_f64(balance).ok_or_else(|| {
            BrokerError::InvalidApiResponse(format!("Unparseable balance: {}", balance))
        })?;

        Ok(Some(BrokerPosition {
            broker_account_id: broker_account_id.to_string(),
            name: market_data.stock.name,
            symbol: market_data.stock.symbol,
            exchange,
            quantity,
            average_cost,
        }))
    }
}

fn map_login_failure(error_code: &str) -> BrokerError {
    match error_code {
        "otp_required" => BrokerError::OtpRequired,
        "manual_login_required" => BrokerError::SessionExpired,
        _ => BrokerError::LoginFailed,
    }
}

/// The positions-detail payload covers every account holding the security;
/// only the entry for the requested account carries the right average cost.
fn average_cost_for_account(
    positions: &[WsIdentityPosition],
    broker_account_id: &str,
) -> Result<Option<Decimal>> {
    for position in positions {
        if position
            .accounts
            .first()
            .is_some_and(|account| account.id == broker_account_id)
        {
            return match &position.average_price {
                Some(money) => Ok(Some(money.to_decimal()?)),
                None => Ok(None),
            };
        }
    }
    Ok(None)
}

#[async_trait]
impl BrokerProvider for WealthsimpleProvider {
    fn institution(&self) -> Institution {
        Institution::Wealthsimple
    }

    async fn login(
        &self,
        username: &str,
        password: Option<&str>,
        otp: Option<&str>,
    ) -> Result<bool> {
        let key = self.session_key(username);

        let mut had_session = false;
        if let Some(session) = self.session_store.get(&key)? {
            match self.probe_session(&session).await {
                Ok(()) => {
                    info!("Reusing cached session for {}", key);
                    return Ok(true);
                }
                Err(BrokerError::SessionExpired) => {
                    had_session = true;
                    self.session_store.remove(&key)?;
                }
                Err(e) => return Err(e),
            }
        }

        // A dead cached session asks for a refresh, a missing one for
        // first-time credentials.
        let password = password.ok_or(if had_session {
            BrokerError::SessionExpired
        } else {
            BrokerError::LoginFailed
        })?;
        let session = self.password_login(username, password, otp).await?;
        self.session_store.put(&key, &session)?;

        info!("User {} logged into Wealthsimple", username);
        Ok(false)
    }

    async fn get_accounts(&self, username: &str) -> Result<Vec<BrokerAccount>> {
        let session = self.require_session(username)?;
        let ws_accounts: Vec<WsAccount> = self.fetch_json(&session, "accounts", &[]).await?;

        let mut accounts = Vec::new();
        for ws_account in ws_accounts {
            if let Some(account) = self.parse_account(ws_account)? {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    async fn get_positions(
        &self,
        username: &str,
        broker_account_id: &str,
    ) -> Result<Vec<BrokerPosition>> {
        let session = self.require_session(username)?;
        let balances: HashMap<String, f64> = self
            .fetch_json(
                &session,
                &format!("accounts/{}/balances", broker_account_id),
                &[],
            )
            .await?;

        let mut positions = Vec::new();
        for (security_id, balance) in balances {
            // One bad instrument never aborts the batch
            match self
                .fetch_position(&session, broker_account_id, &security_id, balance)
                .await
            {
                Ok(Some(position)) => positions.push(position),
                Ok(None) => {}
                Err(e) => warn!("Skipped holding {}: {}", security_id, e),
            }
        }
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unified_account_types_map_to_canonical_types() {
        assert_eq!(
            map_account_type("SELF_DIRECTED_TFSA"),
            Some(AccountType::Tfsa)
        );
        assert_eq!(
            map_account_type("SELF_DIRECTED_RRSP"),
            Some(AccountType::Rrsp)
        );
        assert_eq!(
            map_account_type("SELF_DIRECTED_FHSA"),
            Some(AccountType::Fhsa)
        );
        assert_eq!(
            map_account_type("SELF_DIRECTED_NON_REGISTERED"),
            Some(AccountType::NonRegistered)
        );
        assert_eq!(map_account_type("MANAGED_TFSA"), None);
    }

    #[test]
    fn login_failure_codes_map_to_typed_errors() {
        assert!(matches!(
            map_login_failure("otp_required"),
            BrokerError::OtpRequired
        ));
        assert!(matches!(
            map_login_failure("manual_login_required"),
            BrokerError::SessionExpired
        ));
        assert!(matches!(
            map_login_failure("invalid_credentials"),
            BrokerError::LoginFailed
        ));
    }

    #[test]
    fn bracket_wrapped_security_ids_are_stripped() {
        assert_eq!(strip_security_id("[sec-s-abc123]"), "sec-s-abc123");
        assert_eq!(strip_security_id("sec-s-abc123"), "sec-s-abc123");
        assert_eq!(strip_security_id(""), "");
    }

    #[test]
    fn account_payload_decodes_the_read_fields_only() {
        let json = r#"{
            "id": "account-123",
            "status": "open",
            "unifiedAccountType": "SELF_DIRECTED_TFSA",
            "currency": "CAD",
            "createdAt": "2021-03-14T09:26:53.589Z",
            "branch": "WS",
            "custodianAccounts": [{
                "id": "custodian-1",
                "financials": {
                    "current": {
                        "netLiquidationValue": {"amount": "1234.56", "currency": "CAD"}
                    }
                }
            }]
        }"#;

        let ws_account: WsAccount = serde_json::from_str(json).unwrap();
        assert_eq!(ws_account.unified_account_type, "SELF_DIRECTED_TFSA");
        assert_eq!(
            ws_account.custodian_accounts[0]
                .financials
                .current
                .net_liquidation_value
                .to_decimal()
                .unwrap(),
            dec!(1234.56)
        );
    }

    #[test]
    fn average_cost_is_cross_referenced_by_account() {
        let json = r#"[
            {
                "accounts": [{"id": "other-account"}],
                "averagePrice": {"amount": "10.00"}
            },
            {
                "accounts": [{"id": "account-123"}],
                "averagePrice": {"amount": "42.50"}
            }
        ]"#;
        let positions: Vec<WsIdentityPosition> = serde_json::from_str(json).unwrap();

        let cost = average_cost_for_account(&positions, "account-123").unwrap();
        assert_eq!(cost, Some(dec!(42.50)));

        let missing = average_cost_for_account(&positions, "account-999").unwrap();
        assert_eq!(missing, None);
    }
}
