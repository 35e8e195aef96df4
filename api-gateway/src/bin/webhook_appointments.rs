//! Appointment Webhook Lambda - Handles the inbound scheduling webhook.
//!
//! Receives appointment events from the external automation, reconciles them
//! against the client and service catalog, and stores the appointment.

use aws_config::Region;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::{
    db, get_database_credentials, handle_webhook, Config, DatabaseSource, IngestionService,
    PgStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    ingestion: IngestionService,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        let credentials = match &config.database {
            DatabaseSource::Url(_) => None,
            DatabaseSource::Secret { secret_arn, .. } => {
                let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(Region::new(config.aws_region.clone()))
                    .load()
                    .await;
                let secrets_client = aws_sdk_secretsmanager::Client::new(&aws);
                Some(get_database_credentials(&secrets_client, secret_arn).await?)
            }
        };

        let pool = db::create_pool(&config, credentials.as_ref()).await?;
        info!(max_connections = config.max_connections, "Database pool ready");

        Ok(Self {
            ingestion: IngestionService::new(Arc::new(PgStore::new(pool))),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    info!("Webhook request: {} {}", event.method(), event.uri().path());
    handle_webhook(&state.ingestion, event).await
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
