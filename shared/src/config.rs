//! Configuration management for the assistance services.
//!
//! Everything is read from environment variables once, at cold start.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Identity the LLM bot uses inside chat sessions unless overridden.
pub const DEFAULT_BOT_IDENTITY: &str = "LLM_BOT_IDENTITY";

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// AWS region
    pub aws_region: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_host: required("DATABASE_HOST")?,
            db_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "assistance".to_string()),
            db_secret_arn: required("DATABASE_URL_SECRET_ARN")?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

/// Where the request orchestrator finds its collaborators, and how long it waits for them.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub billing_service_url: String,
    pub llm_service_url: String,
    pub chat_service_url: String,
    pub billing_timeout: Duration,
    pub chat_timeout: Duration,
    /// Summaries run an LLM and get a longer budget than the bookkeeping calls.
    pub summarize_timeout: Duration,
    pub bot_identity: String,
    /// When set, summaries are produced by Bedrock directly instead of the LLM gateway.
    pub bedrock_model_id: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            billing_service_url: required("BILLING_SERVICE_URL")?,
            llm_service_url: env::var("LLM_SERVICE_URL").unwrap_or_default(),
            chat_service_url: required("CHAT_SERVICE_URL")?,
            billing_timeout: timeout_from_env("BILLING_TIMEOUT_SECS", 5)?,
            chat_timeout: timeout_from_env("CHAT_TIMEOUT_SECS", 5)?,
            summarize_timeout: timeout_from_env("SUMMARIZE_TIMEOUT_SECS", 15)?,
            bot_identity: env::var("LLM_BOT_IDENTITY")
                .unwrap_or_else(|_| DEFAULT_BOT_IDENTITY.to_string()),
            bedrock_model_id: env::var("BEDROCK_MODEL_ID").ok().filter(|m| !m.is_empty()),
        })
    }
}

/// Compensating actions the orchestrator may take after a partial failure.
///
/// Both are off by default: a debited token stays debited when a later step fails,
/// and an accepted request stays active when the expert cannot join the chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompensationPolicy {
    /// Credit the token back when summarization or persistence fails after a debit.
    pub refund_on_failure: bool,
    /// Return the request to the queue when the accepting expert cannot join the chat.
    pub release_on_join_failure: bool,
}

impl CompensationPolicy {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            refund_on_failure: flag_from_env("REFUND_ON_FAILURE")?,
            release_on_join_failure: flag_from_env("RELEASE_ON_JOIN_FAILURE")?,
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} not set", name)))
}

fn timeout_from_env(name: &str, default_secs: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_secs(&raw)
            .ok_or_else(|| Error::Config(format!("{} must be a positive number of seconds", name))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

fn flag_from_env(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => {
            parse_flag(&raw).ok_or_else(|| Error::Config(format!("{} must be a boolean", name)))
        }
        Err(_) => Ok(false),
    }
}

pub(crate) fn parse_secs(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
