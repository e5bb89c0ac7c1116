//! Object store abstraction
//!
//! The dashboard only ever needs two operations from a store: list the keys
//! under a prefix and fetch one object body. [`ObjectStore`] captures that
//! surface so the session can run against S3 or against an in-memory store in tests.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::s3::client::{ConnectOptions, S3Client};
use crate::s3::credentials::Credentials;
use crate::s3::types::is_directory_marker;

/// Read-only access to a bucket/key blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key under `prefix`, in the order the store returns them.
    /// Directory markers are included; see [`list_files`].
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Fetch the full body of one object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes>;
}

/// Builds a store handle from session credentials
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns `None` when the credentials are incomplete. No storage call
    /// is made in that case.
    async fn connect(&self, credentials: &Credentials) -> Option<Arc<dyn ObjectStore>>;
}

/// List the files under a prefix: store-native order, directory markers
/// removed.
pub async fn list_files(store: &dyn ObjectStore, bucket: &str, prefix: &str) -> Result<Vec<String>> {
    let keys = store.list_keys(bucket, prefix).await?;
    Ok(keys.into_iter().filter(|k| !is_directory_marker(k)).collect())
}

/// Connector producing real S3 clients
#[derive(Debug, Clone, Default)]
pub struct S3Connector {
    options: ConnectOptions,
}

impl S3Connector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Connector for S3Connector {
    async fn connect(&self, credentials: &Credentials) -> Option<Arc<dyn ObjectStore>> {
        let client = S3Client::connect(credentials, &self.options).await?;
        Some(Arc::new(client))
    }
}
