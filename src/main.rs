use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::SdkConfig;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::settings::{AppConfig, CatalogBackend, QueueBackend};
use crate::infrastructure::catalog::{CatalogStore, DynamoCatalog, PgCatalog};
use crate::infrastructure::queue::rabbitmq::{RabbitMqPublisher, RabbitMqService};
use crate::infrastructure::queue::sqs::{SqsCompletionSource, SqsPublisher};
use crate::infrastructure::queue::{CompletionSource, TranscodePublisher};
use crate::modules::content::service::OnboardingService;
use crate::state::AppState;
use crate::workers::completion::CompletionConsumer;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

const CONSUMER_TAG: &str = "completion_consumer";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("content_onboarding=info,tower_http=info")),
        )
        .init();

    info!("Starting content onboarding service...");

    let config = AppConfig::new().context("Invalid configuration")?;

    let sdk_config = infrastructure::aws::load_sdk_config(&config).await;
    let catalog = build_catalog(&config, &sdk_config).await?;
    let (publisher, source) = build_queues(&config, &sdk_config).await?;

    let shutdown = CancellationToken::new();

    let consumer = CompletionConsumer::new(
        catalog.clone(),
        source,
        config.consumer_workers,
        config.io_timeout,
        Duration::from_secs(u64::try_from(config.receive_wait_secs).unwrap_or_default()),
    );
    let consumer_handle = tokio::spawn(consumer.run(shutdown.clone()));

    let onboarding = OnboardingService::new(catalog, publisher, config.io_timeout);
    let app = app::create_app(AppState::new(onboarding));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("HTTP server failed")?;

    shutdown.cancel();
    consumer_handle.await.context("Completion consumer panicked")?;

    info!("Shutdown complete");
    Ok(())
}

async fn build_catalog(config: &AppConfig, sdk_config: &SdkConfig) -> Result<Arc<dyn CatalogStore>> {
    match config.catalog_backend {
        CatalogBackend::DynamoDb => {
            let client = aws_sdk_dynamodb::Client::new(sdk_config);
            Ok(Arc::new(DynamoCatalog::new(client, &config.catalog_table)))
        }
        CatalogBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres catalog")?;
            let pool = infrastructure::db::pool::connect_to_db(url, config.io_timeout)
                .await
                .context("Failed to connect to PostgreSQL")?;

            let catalog = PgCatalog::new(pool, &config.catalog_table);
            catalog.ensure_schema().await?;
            Ok(Arc::new(catalog))
        }
    }
}

async fn build_queues(
    config: &AppConfig,
    sdk_config: &SdkConfig,
) -> Result<(Arc<dyn TranscodePublisher>, Arc<dyn CompletionSource>)> {
    match config.queue_backend {
        QueueBackend::Sqs => {
            let client = aws_sdk_sqs::Client::new(sdk_config);
            let publisher = SqsPublisher::new(client.clone(), &config.transcode_request_queue);
            let source = SqsCompletionSource::new(
                client,
                &config.completion_event_queue,
                config.receive_wait_secs,
            );
            Ok((Arc::new(publisher), Arc::new(source)))
        }
        QueueBackend::RabbitMq => {
            let url = config
                .rabbitmq_url
                .as_deref()
                .context("RABBITMQ_URL is required for the rabbitmq queue backend")?;
            let service = RabbitMqService::new(url).await?;

            let prefetch = u16::try_from(config.consumer_workers).unwrap_or(u16::MAX);
            let source = service
                .consume(&config.completion_event_queue, CONSUMER_TAG, prefetch)
                .await?;
            let publisher = RabbitMqPublisher::new(service, &config.transcode_request_queue);
            Ok((Arc::new(publisher), Arc::new(source)))
        }
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
