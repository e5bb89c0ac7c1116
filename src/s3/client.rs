//! AWS S3 client wrapper

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::s3::credentials::Credentials;
use crate::s3::store::ObjectStore;

/// Connection options that do not come from the user
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub endpoint_url: Option<String>,
    /// Use path-style addressing instead of virtual-hosted buckets
    pub force_path_style: bool,
}

/// S3 client bound to one set of session credentials
pub struct S3Client {
    client: Client,
    current_region: String,
}

impl S3Client {
    /// Build a client from static credentials.
    ///
    /// Returns `None` when either key is empty. Keys are otherwise not
    /// checked; an invalid key shows up on the first list or get call.
    pub async fn connect(credentials: &Credentials, options: &ConnectOptions) -> Option<Self> {
        if !credentials.is_complete() {
            return None;
        }

        let provider = aws_sdk_s3::config::Credentials::new(
            credentials.access_key.clone(),
            credentials.secret_key.clone(),
            None,
            None,
            "s3-dashboard",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider);

        if let Some(endpoint) = &options.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(options.force_path_style)
            .build();

        tracing::info!("Created S3 client for region {}", credentials.region);

        Some(Self {
            client: Client::from_conf(s3_config),
            current_region: credentials.region.clone(),
        })
    }

    /// List every key under `prefix`, following continuation tokens
    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))
                .with_context(|| format!("Failed to list s3://{}/{}", bucket, prefix))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .map(|k| k.to_string()),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!("Listed {} keys under s3://{}/{}", keys.len(), bucket, prefix);
        Ok(keys)
    }

    /// Download an object to bytes
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;

        let data = response
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read body of s3://{}/{}", bucket, key))?;

        Ok(data.into_bytes())
    }

    /// Get the region this client is scoped to
    pub fn region(&self) -> &str {
        &self.current_region
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        S3Client::list_keys(self, bucket, prefix).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        S3Client::get_object(self, bucket, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_keys_returns_none() {
        let options = ConnectOptions::default();

        let missing_secret = Credentials::new("AKIA", "", "us-east-1");
        assert!(S3Client::connect(&missing_secret, &options).await.is_none());

        let missing_access = Credentials::new("", "secret", "us-east-1");
        assert!(S3Client::connect(&missing_access, &options).await.is_none());
    }

    #[tokio::test]
    async fn test_connect_scopes_region() {
        let options = ConnectOptions {
            endpoint_url: Some("http://127.0.0.1:9".to_string()),
            force_path_style: true,
        };
        let creds = Credentials::new("AKIA", "secret", "eu-west-1");

        let client = S3Client::connect(&creds, &options).await.unwrap();
        assert_eq!(client.region(), "eu-west-1");
    }
}
