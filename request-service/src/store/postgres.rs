//! Postgres-backed request store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    AssistanceRequest, Error, ExpertRating, NewAssistanceRequest, NewExpertRating,
    RequestStatus, Result,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::RequestStore;

const REQUEST_COLUMNS: &str = "request_id, user_id, expert_id, status, summary, chat_session_id, \
     created_at, accepted_at, resolved_at";

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    request_id: Uuid,
    user_id: Uuid,
    expert_id: Option<Uuid>,
    status: String,
    summary: String,
    chat_session_id: String,
    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for AssistanceRequest {
    type Error = Error;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(Self {
            request_id: row.request_id,
            user_id: row.user_id,
            expert_id: row.expert_id,
            status: row.status.parse()?,
            summary: row.summary,
            chat_session_id: row.chat_session_id,
            created_at: row.created_at,
            accepted_at: row.accepted_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    rating_id: Uuid,
    request_id: Uuid,
    user_id: Uuid,
    expert_id: Uuid,
    score: i16,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for ExpertRating {
    fn from(row: RatingRow) -> Self {
        Self {
            rating_id: row.rating_id,
            request_id: row.request_id,
            user_id: row.user_id,
            expert_id: row.expert_id,
            score: row.score,
            created_at: row.created_at,
        }
    }
}

/// Request store on the `assistance_requests` and `expert_ratings` tables.
#[derive(Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert_request(&self, new: NewAssistanceRequest) -> Result<AssistanceRequest> {
        let row: RequestRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO assistance_requests
                (request_id, user_id, status, summary, chat_session_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(RequestStatus::Pending.as_str())
        .bind(&new.summary)
        .bind(&new.chat_session_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_request(&self, request_id: Uuid) -> Result<AssistanceRequest> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {} FROM assistance_requests WHERE request_id = $1",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("request {}", request_id)))?
            .try_into()
    }

    async fn pending_requests(&self) -> Result<Vec<AssistanceRequest>> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM assistance_requests
            WHERE status = 'pending'
            ORDER BY created_at ASC, request_id ASC
            "#,
            REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AssistanceRequest::try_from).collect()
    }

    async fn mark_active(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE assistance_requests
            SET status = 'active', expert_id = $1, accepted_at = $2
            WHERE request_id = $3 AND status = 'pending'
            "#,
        )
        .bind(expert_id)
        .bind(Utc::now())
        .bind(request_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_resolved(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE assistance_requests
            SET status = 'resolved', resolved_at = $1
            WHERE request_id = $2 AND status = 'active' AND expert_id = $3
            "#,
        )
        .bind(Utc::now())
        .bind(request_id)
        .bind(expert_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE assistance_requests
            SET status = 'pending', expert_id = NULL, accepted_at = NULL
            WHERE request_id = $1 AND status = 'active' AND expert_id = $2
            "#,
        )
        .bind(request_id)
        .bind(expert_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_rating(&self, new: NewExpertRating) -> Result<ExpertRating> {
        let row: RatingRow = sqlx::query_as(
            r#"
            INSERT INTO expert_ratings
                (rating_id, request_id, user_id, expert_id, score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING rating_id, request_id, user_id, expert_id, score, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.request_id)
        .bind(new.user_id)
        .bind(new.expert_id)
        .bind(new.score)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Error::Conflict(format!("request {} already rated", new.request_id));
                }
            }
            Error::Database(e)
        })?;

        Ok(row.into())
    }

    async fn rating_for_request(&self, request_id: Uuid) -> Result<Option<ExpertRating>> {
        let row: Option<RatingRow> = sqlx::query_as(
            r#"
            SELECT rating_id, request_id, user_id, expert_id, score, created_at
            FROM expert_ratings
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ExpertRating::from))
    }
}
