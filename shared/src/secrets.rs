//! Database credentials from AWS Secrets Manager.
//!
//! Secrets are cached per container for its lifetime. A rotated secret is picked up by
//! invalidating its entry and fetching again.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Secrets fetched by this container, keyed by ARN.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials from Secrets Manager.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// Get a secret value, from the cache when this container has already fetched it.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    get_cache()
        .write()
        .await
        .insert(secret_arn.to_string(), secret_string.clone());

    Ok(secret_string)
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let secret_string = get_secret(client, secret_arn).await?;
    parse_credentials(&secret_string)
}

/// Drop a cached secret so the next read goes back to Secrets Manager.
pub async fn invalidate(secret_arn: &str) -> bool {
    get_cache().write().await.remove(secret_arn).is_some()
}

fn parse_credentials(raw: &str) -> Result<DatabaseCredentials> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
}
