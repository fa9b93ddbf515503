//! In-process request store for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{
    AssistanceRequest, Error, ExpertRating, NewAssistanceRequest, NewExpertRating,
    RequestStatus, Result,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::RequestStore;

#[derive(Default)]
struct Tables {
    requests: HashMap<Uuid, AssistanceRequest>,
    /// Keyed by request id: one rating per request.
    ratings: HashMap<Uuid, ExpertRating>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Microsecond timestamps, strictly increasing across every write.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now);
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// Request store held in memory.
///
/// Every operation runs inside one critical section over the tables, which gives the
/// conditional transitions the same all-or-nothing behaviour as a single SQL `UPDATE`.
#[derive(Default)]
pub struct MemoryRequestStore {
    tables: Mutex<Tables>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a request from `from` to `to` if it is in `from` and, when given, owned by `expert_id`.
    async fn transition(
        &self,
        request_id: Uuid,
        from: RequestStatus,
        owner: Option<Uuid>,
        apply: impl FnOnce(&mut AssistanceRequest, DateTime<Utc>) + Send,
    ) -> bool {
        let mut tables = self.tables.lock().await;
        let stamp = tables.stamp();
        match tables.requests.get_mut(&request_id) {
            Some(req) if req.status == from && owner.map_or(true, |o| req.expert_id == Some(o)) => {
                apply(req, stamp);
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn insert_request(&self, new: NewAssistanceRequest) -> Result<AssistanceRequest> {
        let mut tables = self.tables.lock().await;
        let req = AssistanceRequest {
            request_id: Uuid::new_v4(),
            user_id: new.user_id,
            expert_id: None,
            status: RequestStatus::Pending,
            summary: new.summary,
            chat_session_id: new.chat_session_id,
            created_at: tables.stamp(),
            accepted_at: None,
            resolved_at: None,
        };
        tables.requests.insert(req.request_id, req.clone());
        Ok(req)
    }

    async fn get_request(&self, request_id: Uuid) -> Result<AssistanceRequest> {
        self.tables
            .lock()
            .await
            .requests
            .get(&request_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("request {}", request_id)))
    }

    async fn pending_requests(&self) -> Result<Vec<AssistanceRequest>> {
        let tables = self.tables.lock().await;
        let mut pending: Vec<AssistanceRequest> = tables
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        Ok(pending)
    }

    async fn mark_active(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        Ok(self
            .transition(request_id, RequestStatus::Pending, None, |req, at| {
                req.status = RequestStatus::Active;
                req.expert_id = Some(expert_id);
                req.accepted_at = Some(at);
            })
            .await)
    }

    async fn mark_resolved(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        Ok(self
            .transition(
                request_id,
                RequestStatus::Active,
                Some(expert_id),
                |req, at| {
                    req.status = RequestStatus::Resolved;
                    req.resolved_at = Some(at);
                },
            )
            .await)
    }

    async fn release(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        Ok(self
            .transition(
                request_id,
                RequestStatus::Active,
                Some(expert_id),
                |req, _| {
                    req.status = RequestStatus::Pending;
                    req.expert_id = None;
                    req.accepted_at = None;
                },
            )
            .await)
    }

    async fn insert_rating(&self, new: NewExpertRating) -> Result<ExpertRating> {
        let mut tables = self.tables.lock().await;
        if tables.ratings.contains_key(&new.request_id) {
            return Err(Error::Conflict(format!(
                "request {} already rated",
                new.request_id
            )));
        }
        let rating = ExpertRating {
            rating_id: Uuid::new_v4(),
            request_id: new.request_id,
            user_id: new.user_id,
            expert_id: new.expert_id,
            score: new.score,
            created_at: tables.stamp(),
        };
        tables.ratings.insert(new.request_id, rating.clone());
        Ok(rating)
    }

    async fn rating_for_request(&self, request_id: Uuid) -> Result<Option<ExpertRating>> {
        Ok(self.tables.lock().await.ratings.get(&request_id).cloned())
    }
}
