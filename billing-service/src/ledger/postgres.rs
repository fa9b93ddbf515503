use async_trait::async_trait;
use shared::{Error, Result};
use sqlx::PgPool;
use uuid::Uuid;

use super::TokenLedger;

/// Ledger on the `users.assistance_token_balance` column.
#[derive(Clone)]
pub struct PgTokenLedger {
    pool: PgPool,
}

impl PgTokenLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenLedger for PgTokenLedger {
    async fn debit(&self, user_id: Uuid) -> Result<i32> {
        let balance: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET assistance_token_balance = assistance_token_balance - 1
            WHERE user_id = $1 AND assistance_token_balance > 0
            RETURNING assistance_token_balance
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        balance.ok_or(Error::InsufficientFunds)
    }

    async fn credit(&self, user_id: Uuid, amount: i32) -> Result<i32> {
        let balance: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET assistance_token_balance = assistance_token_balance + $1
            WHERE user_id = $2
            RETURNING assistance_token_balance
            "#,
        )
        .bind(amount)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            // 22003: numeric_value_out_of_range
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some("22003") {
                    return Error::Validation(format!("credit of {} overflows balance", amount));
                }
            }
            Error::Database(e)
        })?;

        balance.ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
    }
}
