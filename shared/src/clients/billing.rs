//! Client for the billing service's token ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{http_client, join_url};
use crate::{Error, Result};

/// Token ledger operations, keyed by user.
#[async_trait]
pub trait BillingClient: Send + Sync {
    /// Take one token from the user. Returns the new balance.
    ///
    /// An empty balance or unknown user is reported as [`Error::InsufficientFunds`].
    async fn debit_token(&self, user_id: Uuid) -> Result<i32>;

    /// Give the user `amount` tokens. Returns the new balance.
    async fn credit_tokens(&self, user_id: Uuid, amount: i32) -> Result<i32>;
}

#[derive(Debug, Serialize)]
struct DebitRequest {
    user_id: Uuid,
}

#[derive(Debug, Serialize)]
struct CreditRequest {
    user_id: Uuid,
    amount: i32,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    new_balance: i32,
}

/// Billing client that calls the billing service over HTTP.
pub struct HttpBillingClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBillingClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl BillingClient for HttpBillingClient {
    async fn debit_token(&self, user_id: Uuid) -> Result<i32> {
        let response = self
            .http
            .post(join_url(&self.base_url, "/token/debit"))
            .json(&DebitRequest { user_id })
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(response.json::<BalanceResponse>().await?.new_balance),
            // The ledger answers 409 when the conditional decrement matched no row.
            409 => Err(Error::InsufficientFunds),
            status => Err(Error::Upstream {
                service: "billing service",
                status,
            }),
        }
    }

    async fn credit_tokens(&self, user_id: Uuid, amount: i32) -> Result<i32> {
        let response = self
            .http
            .post(join_url(&self.base_url, "/token/add"))
            .json(&CreditRequest { user_id, amount })
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(response.json::<BalanceResponse>().await?.new_balance),
            404 => Err(Error::NotFound(format!("user {}", user_id))),
            status => Err(Error::Upstream {
                service: "billing service",
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_server::{never_respond, respond_once};

    #[tokio::test]
    async fn test_debit_returns_new_balance() {
        let (url, seen) = respond_once(200, r#"{"new_balance":2}"#).await;
        let client = HttpBillingClient::new(url, Duration::from_secs(5)).unwrap();
        let user_id = Uuid::new_v4();

        assert_eq!(client.debit_token(user_id).await.unwrap(), 2);

        let seen = seen.await.unwrap();
        assert!(seen.request_line.starts_with("POST /token/debit"));
        assert!(seen.body.contains(&user_id.to_string()));
    }

    #[tokio::test]
    async fn test_debit_conflict_is_insufficient_funds() {
        let (url, _seen) = respond_once(409, r#"{"error":"Insufficient funds or user not found"}"#).await;
        let client = HttpBillingClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.debit_token(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds));
    }

    #[tokio::test]
    async fn test_debit_server_error_is_upstream() {
        let (url, _seen) = respond_once(500, r#"{"error":"Could not process debit"}"#).await;
        let client = HttpBillingClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.debit_token(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_credit_unknown_user_is_not_found() {
        let (url, seen) = respond_once(404, r#"{"error":"User not found"}"#).await;
        let client = HttpBillingClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.credit_tokens(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(seen.await.unwrap().body.contains(r#""amount":1"#));
    }

    #[tokio::test]
    async fn test_debit_times_out() {
        let url = never_respond().await;
        let client = HttpBillingClient::new(url, Duration::from_millis(200)).unwrap();

        let err = client.debit_token(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_transport(), "expected timeout, got {err}");
    }
}
