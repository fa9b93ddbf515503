//! Storage for assistance requests and ratings.
//!
//! State transitions are conditional writes: each one names the status it expects to
//! find and reports whether it matched. That predicate, evaluated atomically by the
//! storage engine, is the only thing standing between two experts claiming the same
//! request.

mod memory;
mod postgres;

pub use memory::MemoryRequestStore;
pub use postgres::PgRequestStore;

use async_trait::async_trait;
use shared::{AssistanceRequest, ExpertRating, NewAssistanceRequest, NewExpertRating, Result};
use uuid::Uuid;

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a new `pending` request. The store assigns id and creation time.
    async fn insert_request(&self, new: NewAssistanceRequest) -> Result<AssistanceRequest>;

    /// Fetch one request; a missing id is `Error::NotFound`.
    async fn get_request(&self, request_id: Uuid) -> Result<AssistanceRequest>;

    /// All pending requests, oldest first, ties broken by id.
    async fn pending_requests(&self) -> Result<Vec<AssistanceRequest>>;

    /// `pending -> active`, assigning `expert_id`. False when the request is missing or not pending.
    async fn mark_active(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool>;

    /// `active -> resolved` for the assigned expert. False when nothing matched.
    async fn mark_resolved(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool>;

    /// `active -> pending`, undoing an accept by `expert_id`. False when nothing matched.
    async fn release(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool>;

    /// Append a rating. A second rating for the same request is `Error::Conflict`.
    async fn insert_rating(&self, new: NewExpertRating) -> Result<ExpertRating>;

    async fn rating_for_request(&self, request_id: Uuid) -> Result<Option<ExpertRating>>;
}
