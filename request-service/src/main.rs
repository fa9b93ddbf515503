//! Request Service Lambda - assistance request lifecycle.
//!
//! Routes are documented in `request_service::handlers`.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use request_service::handlers::route;
use request_service::{PgRequestStore, RequestService};
use shared::http::{caller_from_request, error_response, success_response};
use shared::{
    BedrockSummarizer, ChatClient, ClientConfig, CompensationPolicy, Config, HttpBillingClient,
    HttpChatClient, HttpSummarizer, Summarizer,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    service: RequestService,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let clients = ClientConfig::from_env()?;
        let policy = CompensationPolicy::from_env()?;

        let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws);
        let pool = shared::db::connect(&config, &secrets_client).await?;

        let billing = Arc::new(HttpBillingClient::new(
            &clients.billing_service_url,
            clients.billing_timeout,
        )?);
        let chat: Arc<dyn ChatClient> = Arc::new(HttpChatClient::new(
            &clients.chat_service_url,
            clients.chat_timeout,
        )?);

        let summarizer: Arc<dyn Summarizer> = match &clients.bedrock_model_id {
            Some(model_id) => {
                info!(model_id = %model_id, "Summarizing with Bedrock");
                Arc::new(BedrockSummarizer::new(
                    aws_sdk_bedrockruntime::Client::new(&aws),
                    model_id,
                    Arc::clone(&chat),
                    &clients.bot_identity,
                    clients.summarize_timeout,
                ))
            }
            None if clients.llm_service_url.is_empty() => {
                return Err("LLM_SERVICE_URL or BEDROCK_MODEL_ID must be set".into());
            }
            None => Arc::new(HttpSummarizer::new(
                &clients.llm_service_url,
                clients.summarize_timeout,
            )?),
        };

        info!(?policy, "Request service configured");

        let service = RequestService::new(
            Arc::new(PgRequestStore::new(pool)),
            billing,
            summarizer,
            chat,
        )
        .with_policy(policy)
        .with_bot_identity(clients.bot_identity);

        Ok(Self { service })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str().to_string();
    let path = event.uri().path().to_string();

    if path == "/health" {
        return success_response(200, "RequestService OK");
    }

    let caller = match caller_from_request(&event) {
        Ok(caller) => caller,
        Err(e) => {
            warn!(error = %e, "Unauthenticated request");
            return error_response(401, "Unauthorized");
        }
    };

    route(&state.service, &caller, &method, &path, event.body()).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
