use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    AwsRegion,
    AwsAccessKey,
    AwsSecretKey,
    AwsEndpointUrl,
    CatalogBackend,
    CatalogTable,
    DatabaseUrl,
    QueueBackend,
    RabbitMqUrl,
    TranscodeRequestQueue,
    CompletionEventQueue,
    ConsumerWorkers,
    IoTimeoutSecs,
    ReceiveWaitSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::AwsRegion => "AWS_REGION",
            EnvKey::AwsAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::AwsSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::AwsEndpointUrl => "AWS_ENDPOINT_URL",
            EnvKey::CatalogBackend => "CATALOG_BACKEND",
            EnvKey::CatalogTable => "CATALOG_TABLE",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::QueueBackend => "QUEUE_BACKEND",
            EnvKey::RabbitMqUrl => "RABBITMQ_URL",
            EnvKey::TranscodeRequestQueue => "TRANSCODE_REQUEST_QUEUE",
            EnvKey::CompletionEventQueue => "COMPLETION_EVENT_QUEUE",
            EnvKey::ConsumerWorkers => "CONSUMER_WORKERS",
            EnvKey::IoTimeoutSecs => "IO_TIMEOUT_SECS",
            EnvKey::ReceiveWaitSecs => "RECEIVE_WAIT_SECS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank variables both read as `None`.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str())
        .ok()
        .filter(|val| !val.trim().is_empty())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
