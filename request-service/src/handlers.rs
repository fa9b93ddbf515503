//! HTTP surface of the request service.
//!
//! Endpoints:
//! - POST /request/create   - user opens a request from a bot chat
//! - POST /request/rate     - user rates the expert after resolution
//! - GET  /request/pending  - expert queue, oldest first
//! - POST /request/accept   - expert claims a pending request
//! - POST /request/resolve  - expert closes their active request
//! - GET  /request/{id}     - requester or assigned expert reads one request
//! - GET  /request/{id}/rating - the same participants read its rating
//! - GET  /health

use lambda_http::{Body, Response};
use serde::Deserialize;
use shared::http::{error_response, success_response};
use shared::{parse_body, Caller};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ErrorKind, RequestError};
use crate::service::RequestService;

type HttpResult = Result<Response<Body>, lambda_http::Error>;

#[derive(Debug, Deserialize, Validate)]
struct CreateRequestPayload {
    #[validate(length(min = 1, max = 128))]
    chat_session_id: String,
}

#[derive(Debug, Deserialize)]
struct RequestIdPayload {
    request_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
struct RateRequestPayload {
    request_id: Uuid,
    expert_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    score: i16,
}

/// Dispatch one API Gateway request for an already-identified caller.
pub async fn route(
    service: &RequestService,
    caller: &Caller,
    method: &str,
    path: &str,
    body: &Body,
) -> HttpResult {
    info!("Request service call: {} {}", method, path);

    match (method, path) {
        ("GET", "/health") => success_response(200, "RequestService OK"),

        ("POST", "/request/create") => {
            if !caller.role.can_open_requests() {
                return error_response(403, "Experts cannot open requests");
            }
            let payload: CreateRequestPayload = parse_body!(body);
            if let Err(e) = payload.validate() {
                return error_response(400, e.to_string());
            }
            match service.create_request(caller, &payload.chat_session_id).await {
                Ok(req) => success_response(201, req),
                Err(e) => failure(&e, "Could not create request"),
            }
        }

        ("POST", "/request/rate") => {
            if !caller.role.can_rate() {
                return error_response(403, "Only the requester can rate");
            }
            let payload: RateRequestPayload = parse_body!(body);
            if let Err(e) = payload.validate() {
                return error_response(400, e.to_string());
            }
            match service
                .submit_rating(payload.request_id, caller.id, payload.expert_id, payload.score)
                .await
            {
                Ok(rating) => success_response(201, rating),
                Err(e) => failure(&e, "Could not submit rating"),
            }
        }

        ("GET", "/request/pending") => {
            if !caller.role.can_work_queue() {
                return error_response(403, "Expert access required");
            }
            match service.pending_requests().await {
                Ok(queue) => success_response(200, queue),
                Err(e) => failure(&e, "Could not fetch pending requests"),
            }
        }

        ("POST", "/request/accept") => {
            if !caller.role.can_work_queue() {
                return error_response(403, "Expert access required");
            }
            let payload: RequestIdPayload = parse_body!(body);
            match service.accept_request(payload.request_id, caller.id).await {
                Ok(req) => success_response(200, req),
                Err(e) => failure(&e, "Could not accept request"),
            }
        }

        ("POST", "/request/resolve") => {
            if !caller.role.can_work_queue() {
                return error_response(403, "Expert access required");
            }
            let payload: RequestIdPayload = parse_body!(body);
            match service.resolve_request(payload.request_id, caller.id).await {
                Ok(()) => success_response(200, serde_json::json!({ "status": "resolved" })),
                Err(e) => failure(&e, "Could not resolve request"),
            }
        }

        ("GET", _) if path.starts_with("/request/") => {
            let rest = path.trim_start_matches("/request/");
            let (id, want_rating) = match rest.strip_suffix("/rating") {
                Some(id) => (id, true),
                None => (rest, false),
            };
            let request_id = match Uuid::parse_str(id) {
                Ok(id) => id,
                Err(_) => return error_response(400, "Invalid request ID"),
            };
            let req = match service.get_request(request_id).await {
                Ok(req) => req,
                Err(e) => return failure(&e, "Could not fetch request"),
            };
            if req.user_id != caller.id && req.expert_id != Some(caller.id) {
                return error_response(403, "Not a participant in this request");
            }
            if !want_rating {
                return success_response(200, req);
            }
            match service.rating_for_request(request_id).await {
                Ok(Some(rating)) => success_response(200, rating),
                Ok(None) => error_response(404, "Request has not been rated"),
                Err(e) => failure(&e, "Could not fetch rating"),
            }
        }

        _ => error_response(404, "Not found"),
    }
}

/// Map an orchestrator error to the client-facing signal for its kind.
fn failure(err: &RequestError, generic_message: &str) -> HttpResult {
    let message = match err.kind() {
        ErrorKind::PaymentRequired => "Insufficient assistance tokens".to_string(),
        ErrorKind::Conflict if matches!(err, RequestError::AlreadyAccepted) => {
            "Request already accepted".to_string()
        }
        ErrorKind::Generic => {
            warn!(error = %err, "Request failed");
            generic_message.to_string()
        }
        _ => err.to_string(),
    };
    error_response(err.status_code(), message)
}
