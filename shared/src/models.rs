//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Where an assistance request is in its lifecycle.
///
/// Requests only ever move forward: `Pending -> Active -> Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Active,
    Resolved,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Active => "active",
            RequestStatus::Resolved => "resolved",
        }
    }

    /// Whether an expert has been assigned by the time a request reaches this status.
    pub fn has_expert(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "active" => Ok(RequestStatus::Active),
            "resolved" => Ok(RequestStatus::Resolved),
            other => Err(Error::Internal(format!("unknown request status '{}'", other))),
        }
    }
}

/// One instance of a user asking for expert help.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistanceRequest {
    pub request_id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expert_id: Option<Uuid>,
    pub status: RequestStatus,
    pub summary: String,
    pub chat_session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AssistanceRequest {
    /// Checks the field/status invariants a stored record must satisfy.
    pub fn is_consistent(&self) -> bool {
        let assigned = self.status.has_expert();
        self.expert_id.is_some() == assigned
            && self.accepted_at.is_some() == assigned
            && self.resolved_at.is_some() == (self.status == RequestStatus::Resolved)
    }
}

/// Fields the orchestrator supplies when persisting a new request.
///
/// The store assigns the id, status and creation time.
#[derive(Debug, Clone)]
pub struct NewAssistanceRequest {
    pub user_id: Uuid,
    pub summary: String,
    pub chat_session_id: String,
}

/// A 1-5 score a user gives the expert who resolved their request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertRating {
    pub rating_id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub expert_id: Uuid,
    pub score: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpertRating {
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub expert_id: Uuid,
    pub score: i16,
}

/// A single message from a chat session, as the chat gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sid: String,
    /// Identity of the sender (user id, expert id or the bot identity)
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> AssistanceRequest {
        AssistanceRequest {
            request_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expert_id: None,
            status: RequestStatus::Pending,
            summary: "User needs help with their Wi-Fi.".to_string(),
            chat_session_id: "CH123".to_string(),
            created_at: Utc::now(),
            accepted_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Active,
            RequestStatus::Resolved,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_consistency_invariants() {
        let mut req = pending();
        assert!(req.is_consistent());

        req.status = RequestStatus::Active;
        assert!(!req.is_consistent(), "active without expert");

        req.expert_id = Some(Uuid::new_v4());
        req.accepted_at = Some(Utc::now());
        assert!(req.is_consistent());

        req.status = RequestStatus::Resolved;
        assert!(!req.is_consistent(), "resolved without resolution time");
        req.resolved_at = Some(Utc::now());
        assert!(req.is_consistent());
    }

    #[test]
    fn test_pending_request_omits_absent_fields() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("expert_id").is_none());
        assert!(json.get("accepted_at").is_none());
    }
}
