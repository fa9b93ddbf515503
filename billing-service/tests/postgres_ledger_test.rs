//! Ledger tests against a live database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use billing_service::{PgTokenLedger, TokenLedger};
use shared::Error;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

async fn pool() -> anyhow::Result<PgPool> {
    let url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new().max_connections(8).connect(&url).await?;
    sqlx::raw_sql(include_str!("../sql/schema.sql"))
        .execute(&pool)
        .await?;
    Ok(pool)
}

async fn open_account(pool: &PgPool, balance: i32) -> anyhow::Result<Uuid> {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (user_id, assistance_token_balance) VALUES ($1, $2)")
        .bind(user_id)
        .bind(balance)
        .execute(pool)
        .await?;
    Ok(user_id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_debits_never_overdraw() -> anyhow::Result<()> {
    let pool = pool().await?;
    let user = open_account(&pool, 3).await?;
    let ledger = Arc::new(PgTokenLedger::new(pool));

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let ledger = Arc::clone(&ledger);
        tasks.push(tokio::spawn(async move { ledger.debit(user).await }));
    }
    let mut successes = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => successes += 1,
            Err(Error::InsufficientFunds) => {}
            Err(e) => return Err(e.into()),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(ledger.credit(user, 2).await?, 2);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_credit_unknown_user() -> anyhow::Result<()> {
    let ledger = PgTokenLedger::new(pool().await?);
    assert!(matches!(
        ledger.credit(Uuid::new_v4(), 1).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_credit_overflow_is_validation() -> anyhow::Result<()> {
    let pool = pool().await?;
    let user = open_account(&pool, i32::MAX - 1).await?;
    let ledger = PgTokenLedger::new(pool);

    assert!(matches!(
        ledger.credit(user, 2).await,
        Err(Error::Validation(_))
    ));
    Ok(())
}
