//! Token ledger endpoints, called service-to-service.
//!
//! Endpoints:
//! - POST /token/debit - take one token, `{"new_balance"}` or 409
//! - POST /token/add   - credit tokens, `{"new_balance"}` or 404
//! - GET  /health

use lambda_http::{Body, Response};
use serde::{Deserialize, Serialize};
use shared::http::{error_response, json_response, success_response};
use shared::{parse_body, Error};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::ledger::TokenLedger;

type HttpResult = Result<Response<Body>, lambda_http::Error>;

#[derive(Debug, Deserialize)]
struct DebitPayload {
    user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
struct CreditPayload {
    user_id: Uuid,
    #[validate(range(min = 1))]
    amount: i32,
}

#[derive(Debug, Serialize)]
struct BalanceResponse {
    new_balance: i32,
}

pub async fn route(ledger: &dyn TokenLedger, method: &str, path: &str, body: &Body) -> HttpResult {
    info!("Billing call: {} {}", method, path);

    match (method, path) {
        ("GET", "/health") => success_response(200, "BillingService OK"),

        ("POST", "/token/debit") => {
            let payload: DebitPayload = parse_body!(body);
            match ledger.debit(payload.user_id).await {
                Ok(new_balance) => {
                    info!(user_id = %payload.user_id, new_balance, "Debited token");
                    json_response(200, &BalanceResponse { new_balance })
                }
                Err(Error::InsufficientFunds) => {
                    error_response(409, "Insufficient funds or user not found")
                }
                Err(e) => {
                    error!(user_id = %payload.user_id, error = %e, "Debit failed");
                    error_response(500, "Could not process debit")
                }
            }
        }

        ("POST", "/token/add") => {
            let payload: CreditPayload = parse_body!(body);
            if let Err(e) = payload.validate() {
                return error_response(400, e.to_string());
            }
            match ledger.credit(payload.user_id, payload.amount).await {
                Ok(new_balance) => {
                    info!(user_id = %payload.user_id, amount = payload.amount, new_balance, "Credited tokens");
                    json_response(200, &BalanceResponse { new_balance })
                }
                Err(Error::NotFound(_)) => error_response(404, "User not found"),
                Err(Error::Validation(message)) => error_response(400, message),
                Err(e) => {
                    error!(user_id = %payload.user_id, error = %e, "Credit failed");
                    error_response(500, "Could not process credit")
                }
            }
        }

        _ => error_response(404, "Not found"),
    }
}
