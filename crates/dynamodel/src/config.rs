use std::env;

use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

/// Region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for DynamoDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Custom endpoint URL (for DynamoDB Local).
    pub endpoint_url: Option<String>,
    /// AWS region.
    pub region: String,
    /// Static credentials. When unset the default credential chain is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_ENDPOINT_URL` - Custom endpoint, e.g. `http://localhost:8000`
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` - Static credentials,
    ///   used only when both are set
    pub fn from_env() -> Self {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok();
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok();
        let (access_key_id, secret_access_key) = match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) => (Some(id), Some(secret)),
            _ => (None, None),
        };

        Self {
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            region: env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            access_key_id,
            secret_access_key,
        }
    }

    /// Settings for a DynamoDB Local instance. It accepts any credentials.
    pub fn local(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            region: "us-west-2".to_string(),
            access_key_id: Some("anything".to_string()),
            secret_access_key: Some("anything".to_string()),
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }

    /// Creates a DynamoDB client with this configuration.
    pub async fn connect(&self) -> Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()));

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(id), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "dynamodel",
            ));
        }

        tracing::debug!(target = %self.target_display(), "Connecting to DynamoDB");

        let sdk_config = loader.load().await;
        Client::new(&sdk_config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
