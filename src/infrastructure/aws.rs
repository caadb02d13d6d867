use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::config::Credentials;
use tracing::info;

use crate::config::settings::AppConfig;

/// Shared SDK configuration for the DynamoDB and SQS clients. Static keys win
/// when both are set; otherwise the default provider chain resolves credentials.
pub async fn load_sdk_config(config: &AppConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()));

    if let (Some(access_key), Some(secret_key)) = (&config.aws_access_key, &config.aws_secret_key) {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");
        loader = loader.credentials_provider(credentials);
    }

    if let Some(endpoint) = &config.aws_endpoint_url {
        info!("Using AWS endpoint override {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    info!("✅ AWS SDK configured for region {}", config.aws_region);
    sdk_config
}
