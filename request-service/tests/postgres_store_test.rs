//! Store tests against a live database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use request_service::{PgRequestStore, RequestStore};
use shared::{Error, NewAssistanceRequest, NewExpertRating, RequestStatus};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use uuid::Uuid;

async fn store() -> anyhow::Result<PgRequestStore> {
    let url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new().max_connections(8).connect(&url).await?;
    sqlx::raw_sql(include_str!("../sql/schema.sql"))
        .execute(&pool)
        .await?;
    Ok(PgRequestStore::new(pool))
}

fn new_request() -> NewAssistanceRequest {
    NewAssistanceRequest {
        user_id: Uuid::new_v4(),
        summary: "User needs help with billing.".to_string(),
        chat_session_id: format!("CH-{}", Uuid::new_v4()),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_lifecycle_round_trip() -> anyhow::Result<()> {
    let store = store().await?;
    let expert = Uuid::new_v4();
    let req = store.insert_request(new_request()).await?;
    assert_eq!(req.status, RequestStatus::Pending);

    let queue = store.pending_requests().await?;
    assert!(queue.iter().any(|r| r.request_id == req.request_id));
    assert!(queue
        .windows(2)
        .all(|w| (w[0].created_at, w[0].request_id) <= (w[1].created_at, w[1].request_id)));

    assert!(store.mark_active(req.request_id, expert).await?);
    assert!(!store.mark_active(req.request_id, Uuid::new_v4()).await?);
    assert!(!store.mark_resolved(req.request_id, Uuid::new_v4()).await?);
    assert!(store.mark_resolved(req.request_id, expert).await?);

    let stored = store.get_request(req.request_id).await?;
    assert_eq!(stored.status, RequestStatus::Resolved);
    assert_eq!(stored.expert_id, Some(expert));
    assert!(stored.is_consistent());

    let rating = NewExpertRating {
        request_id: req.request_id,
        user_id: req.user_id,
        expert_id: expert,
        score: 4,
    };
    store.insert_rating(rating.clone()).await?;
    assert!(matches!(
        store.insert_rating(rating).await,
        Err(Error::Conflict(_))
    ));
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_release_clears_assignment() -> anyhow::Result<()> {
    let store = store().await?;
    let expert = Uuid::new_v4();
    let req = store.insert_request(new_request()).await?;
    store.mark_active(req.request_id, expert).await?;

    assert!(store.release(req.request_id, expert).await?);
    let stored = store.get_request(req.request_id).await?;
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(stored.expert_id, None);
    assert_eq!(stored.accepted_at, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_conditional_update_admits_one_winner() -> anyhow::Result<()> {
    let store = Arc::new(store().await?);
    let id = store.insert_request(new_request()).await?.request_id;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store.mark_active(id, Uuid::new_v4()).await
        }));
    }
    let mut wins = 0;
    for task in tasks {
        if task.await?? {
            wins += 1;
        }
    }

    assert_eq!(wins, 1);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_missing_request_is_not_found() -> anyhow::Result<()> {
    let store = store().await?;
    assert!(matches!(
        store.get_request(Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}
