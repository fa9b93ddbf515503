//! Shared library for the assistance request services.
//!
//! This crate provides the domain models, error taxonomy, configuration and the clients
//! each service uses to reach its collaborators.

pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod secrets;

pub use auth::{extract_caller, Caller, Role};
pub use clients::{
    BedrockSummarizer, BillingClient, ChatClient, HttpBillingClient, HttpChatClient,
    HttpSummarizer, Summarizer,
};
pub use config::{ClientConfig, CompensationPolicy, Config};
pub use error::{Error, Result};
pub use http::{caller_from_request, error_response, json_response, success_response, ApiResponse};
pub use models::{
    AssistanceRequest, ChatMessage, ExpertRating, NewAssistanceRequest, NewExpertRating,
    RequestStatus,
};
pub use secrets::{get_database_credentials, get_secret, DatabaseCredentials};
