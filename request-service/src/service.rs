//! The request orchestrator.
//!
//! Creation is a fixed sequence of calls across services: debit a token, summarize the
//! chat, persist the request, then take the bot out of the chat. Each step
//! short-circuits on failure except the last, which is best-effort. Acceptance is one
//! conditional write followed by adding the expert to the chat.

use shared::{
    AssistanceRequest, BillingClient, Caller, ChatClient, CompensationPolicy, ExpertRating,
    NewAssistanceRequest, NewExpertRating, RequestStatus, Summarizer,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{RequestError, Result};
use crate::store::RequestStore;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

pub struct RequestService {
    store: Arc<dyn RequestStore>,
    billing: Arc<dyn BillingClient>,
    summarizer: Arc<dyn Summarizer>,
    chat: Arc<dyn ChatClient>,
    policy: CompensationPolicy,
    bot_identity: String,
}

impl RequestService {
    pub fn new(
        store: Arc<dyn RequestStore>,
        billing: Arc<dyn BillingClient>,
        summarizer: Arc<dyn Summarizer>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            store,
            billing,
            summarizer,
            chat,
            policy: CompensationPolicy::default(),
            bot_identity: shared::config::DEFAULT_BOT_IDENTITY.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: CompensationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_bot_identity(mut self, identity: impl Into<String>) -> Self {
        self.bot_identity = identity.into();
        self
    }

    /// Open a new request for `requester` from the chat they had with the bot.
    pub async fn create_request(
        &self,
        requester: &Caller,
        chat_session_id: &str,
    ) -> Result<AssistanceRequest> {
        let user_id = requester.id;
        let debited = if requester.role.is_debit_exempt() {
            info!(%user_id, "Debit-exempt caller, skipping token debit");
            false
        } else {
            match self.billing.debit_token(user_id).await {
                Ok(balance) => {
                    info!(%user_id, balance, "Token debited");
                    true
                }
                Err(shared::Error::InsufficientFunds) => {
                    info!(%user_id, "Token debit refused");
                    return Err(RequestError::PaymentRequired(shared::Error::InsufficientFunds));
                }
                Err(e) => {
                    warn!(%user_id, transport = e.is_transport(), error = %e, "Billing call failed");
                    return Err(RequestError::Billing(e));
                }
            }
        };

        let summary = match self.summarizer.summarize(chat_session_id).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(%user_id, chat_session_id, error = %e, debited, "Summary failed after debit");
                self.refund(user_id, debited).await;
                return Err(RequestError::Summarize(e));
            }
        };

        let new = NewAssistanceRequest {
            user_id,
            summary,
            chat_session_id: chat_session_id.to_string(),
        };
        let req = match self.store.insert_request(new).await {
            Ok(req) => req,
            Err(e) => {
                error!(%user_id, chat_session_id, error = %e, debited, "Could not persist request");
                self.refund(user_id, debited).await;
                return Err(RequestError::Save(e));
            }
        };

        if let Err(e) = self
            .chat
            .remove_participant(chat_session_id, &self.bot_identity)
            .await
        {
            warn!(
                request_id = %req.request_id,
                chat_session_id,
                error = %e,
                "Failed to remove bot from chat"
            );
        }

        info!(request_id = %req.request_id, %user_id, "Assistance request created");
        Ok(req)
    }

    /// Best-effort credit of the token taken by a create that did not complete.
    async fn refund(&self, user_id: Uuid, debited: bool) {
        if !debited || !self.policy.refund_on_failure {
            return;
        }
        match self.billing.credit_tokens(user_id, 1).await {
            Ok(balance) => info!(%user_id, balance, "Refunded token"),
            Err(e) => error!(%user_id, error = %e, "Token refund failed"),
        }
    }

    /// Claim a pending request for `expert_id` and put the expert in the chat.
    pub async fn accept_request(
        &self,
        request_id: Uuid,
        expert_id: Uuid,
    ) -> Result<AssistanceRequest> {
        let claimed = self
            .store
            .mark_active(request_id, expert_id)
            .await
            .map_err(RequestError::Store)?;
        if !claimed {
            info!(%request_id, %expert_id, "Accept lost: request not pending");
            return Err(RequestError::AlreadyAccepted);
        }

        let req = self
            .store
            .get_request(request_id)
            .await
            .map_err(RequestError::Fetch)?;

        let joined = self
            .chat
            .add_participant(&req.chat_session_id, &expert_id.to_string())
            .await;
        if let Err(e) = joined {
            error!(
                severity = "CRITICAL",
                %request_id,
                %expert_id,
                chat_session_id = %req.chat_session_id,
                error = %e,
                "Request is active but the expert could not join the chat"
            );
            if self.policy.release_on_join_failure {
                match self.store.release(request_id, expert_id).await {
                    Ok(true) => info!(%request_id, "Released request back to the queue"),
                    Ok(false) => warn!(%request_id, "Release matched nothing"),
                    Err(release_err) => {
                        error!(%request_id, error = %release_err, "Release failed")
                    }
                }
            }
            return Err(RequestError::ChatJoin(e));
        }

        info!(%request_id, %expert_id, "Request accepted");
        Ok(req)
    }

    /// Close an active request. Only the assigned expert may resolve it.
    pub async fn resolve_request(&self, request_id: Uuid, expert_id: Uuid) -> Result<()> {
        let resolved = self
            .store
            .mark_resolved(request_id, expert_id)
            .await
            .map_err(RequestError::Store)?;
        if resolved {
            info!(%request_id, %expert_id, "Request resolved");
            return Ok(());
        }

        // Nothing matched; work out why for the caller.
        match self.store.get_request(request_id).await {
            Ok(req) if req.status == RequestStatus::Active && req.expert_id != Some(expert_id) => {
                Err(RequestError::Forbidden(format!(
                    "request {} is assigned to another expert",
                    request_id
                )))
            }
            Ok(_) | Err(shared::Error::NotFound(_)) => Err(RequestError::NotActive),
            Err(e) => Err(RequestError::Store(e)),
        }
    }

    /// The expert queue: every pending request, longest-waiting first.
    pub async fn pending_requests(&self) -> Result<Vec<AssistanceRequest>> {
        self.store
            .pending_requests()
            .await
            .map_err(RequestError::Store)
    }

    pub async fn get_request(&self, request_id: Uuid) -> Result<AssistanceRequest> {
        match self.store.get_request(request_id).await {
            Ok(req) => Ok(req),
            Err(shared::Error::NotFound(_)) => Err(RequestError::NotFound(request_id)),
            Err(e) => Err(RequestError::Store(e)),
        }
    }

    /// The rating left on a request, if any.
    pub async fn rating_for_request(&self, request_id: Uuid) -> Result<Option<ExpertRating>> {
        self.store
            .rating_for_request(request_id)
            .await
            .map_err(RequestError::Store)
    }

    /// Record the requester's score for the expert who resolved their request.
    pub async fn submit_rating(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        expert_id: Uuid,
        score: i16,
    ) -> Result<ExpertRating> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(RequestError::Validation(format!(
                "score must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            )));
        }

        let req = self.get_request(request_id).await?;
        if req.user_id != user_id {
            return Err(RequestError::Forbidden(
                "only the requester can rate this request".to_string(),
            ));
        }
        if req.status != RequestStatus::Resolved {
            return Err(RequestError::NotRated(request_id));
        }
        if req.expert_id != Some(expert_id) {
            return Err(RequestError::Forbidden(
                "expert did not handle this request".to_string(),
            ));
        }

        let rating = self
            .store
            .insert_rating(NewExpertRating {
                request_id,
                user_id,
                expert_id,
                score,
            })
            .await
            .map_err(|e| match e {
                shared::Error::Conflict(_) => RequestError::AlreadyRated(request_id),
                other => RequestError::Store(other),
            })?;

        info!(%request_id, %expert_id, score, "Rating recorded");
        Ok(rating)
    }
}
