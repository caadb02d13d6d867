use std::str::FromStr;
use std::time::Duration;

use crate::config::env::{self, EnvKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("unknown {kind} backend '{value}'")]
    UnknownBackend { kind: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogBackend {
    DynamoDb,
    Postgres,
}

impl FromStr for CatalogBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(CatalogBackend::DynamoDb),
            "postgres" => Ok(CatalogBackend::Postgres),
            other => Err(ConfigError::UnknownBackend {
                kind: "catalog",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueBackend {
    Sqs,
    RabbitMq,
}

impl FromStr for QueueBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqs" => Ok(QueueBackend::Sqs),
            "rabbitmq" => Ok(QueueBackend::RabbitMq),
            other => Err(ConfigError::UnknownBackend {
                kind: "queue",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub aws_region: String,
    pub aws_access_key: Option<String>,
    pub aws_secret_key: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub catalog_backend: CatalogBackend,
    pub catalog_table: String,
    pub database_url: Option<String>,
    pub queue_backend: QueueBackend,
    pub rabbitmq_url: Option<String>,
    pub transcode_request_queue: String,
    pub completion_event_queue: String,
    pub consumer_workers: usize,
    pub io_timeout: Duration,
    pub receive_wait_secs: i32,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let catalog_backend: CatalogBackend = env::get_or(EnvKey::CatalogBackend, "dynamodb").parse()?;
        let queue_backend: QueueBackend = env::get_or(EnvKey::QueueBackend, "sqs").parse()?;

        let database_url = env::get_opt(EnvKey::DatabaseUrl);
        if catalog_backend == CatalogBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing(EnvKey::DatabaseUrl.as_str()));
        }

        let rabbitmq_url = env::get_opt(EnvKey::RabbitMqUrl);
        if queue_backend == QueueBackend::RabbitMq && rabbitmq_url.is_none() {
            return Err(ConfigError::Missing(EnvKey::RabbitMqUrl.as_str()));
        }

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            aws_region: env::get_or(EnvKey::AwsRegion, "us-east-1"),
            aws_access_key: env::get_opt(EnvKey::AwsAccessKey),
            aws_secret_key: env::get_opt(EnvKey::AwsSecretKey),
            aws_endpoint_url: env::get_opt(EnvKey::AwsEndpointUrl),
            catalog_backend,
            catalog_table: env::get_or(EnvKey::CatalogTable, "ContentOnboarding"),
            database_url,
            queue_backend,
            rabbitmq_url,
            transcode_request_queue: required(EnvKey::TranscodeRequestQueue)?,
            completion_event_queue: required(EnvKey::CompletionEventQueue)?,
            consumer_workers: env::get_parsed(EnvKey::ConsumerWorkers, 4usize).max(1),
            io_timeout: Duration::from_secs(env::get_parsed(EnvKey::IoTimeoutSecs, 10u64)),
            receive_wait_secs: env::get_parsed(EnvKey::ReceiveWaitSecs, 20i32).clamp(0, 20),
        })
    }
}

fn required(key: EnvKey) -> Result<String, ConfigError> {
    let name = key.as_str();
    env::get_opt(key).ok_or(ConfigError::Missing(name))
}
