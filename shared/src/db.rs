//! Database connection management.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::warn;

use crate::secrets::{get_database_credentials, invalidate, DatabaseCredentials};
use crate::{Config, Error, Result};

/// Build the connection URL, letting the secret override host and database name.
pub fn database_url(config: &Config, creds: &DatabaseCredentials) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        creds.username,
        creds.password,
        creds.host.as_deref().unwrap_or(&config.db_host),
        creds.port.unwrap_or(5432),
        creds.dbname.as_deref().unwrap_or(&config.db_name)
    )
}

/// Create a database connection pool.
pub async fn create_pool(config: &Config, creds: &DatabaseCredentials) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url(config, creds))
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}

/// Fetch credentials from Secrets Manager and connect.
///
/// A rejected login is retried once with freshly fetched credentials, in case the
/// cached secret was rotated.
pub async fn connect(config: &Config, secrets: &aws_sdk_secretsmanager::Client) -> Result<PgPool> {
    let creds = get_database_credentials(secrets, &config.db_secret_arn).await?;
    match create_pool(config, &creds).await {
        Err(Error::Database(e)) if is_auth_failure(&e) => {
            warn!(error = %e, "Database login rejected, refetching credentials");
            invalidate(&config.db_secret_arn).await;
            let creds = get_database_credentials(secrets, &config.db_secret_arn).await?;
            create_pool(config, &creds).await
        }
        result => result,
    }
}

/// Postgres `invalid_password` (28P01) or `invalid_authorization_specification` (28000).
fn is_auth_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("28P01") | Some("28000")),
        _ => false,
    }
}
