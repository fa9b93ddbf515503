//! Billing Service Lambda - assistance token ledger.

use billing_service::handlers::route;
use billing_service::PgTokenLedger;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::Config;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    ledger: PgTokenLedger,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws);
        let pool = shared::db::connect(&config, &secrets_client).await?;

        Ok(Self {
            ledger: PgTokenLedger::new(pool),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = event.uri().path();
    route(&state.ledger, method, path, event.body()).await
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
