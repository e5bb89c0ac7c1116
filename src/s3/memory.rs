//! In-memory store for tests
//!
//! Keeps objects in insertion order, counts calls so tests can check
//! memoization, and can be switched into a failing mode.

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::s3::credentials::Credentials;
use crate::s3::store::{Connector, ObjectStore};

/// Objects kept in insertion order
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<(String, String, Bytes)>>,
    failing: AtomicBool,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        let body = body.into();
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = objects.iter_mut().find(|(b, k, _)| b == bucket && k == key) {
            existing.2 = body;
        } else {
            objects.push((bucket.to_string(), key.to_string(), body));
        }
    }

    /// Make every following call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("Access Denied");
        }

        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects
            .iter()
            .filter(|(b, k, _)| b == bucket && k.starts_with(prefix))
            .map(|(_, k, _)| k.clone())
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("Access Denied");
        }

        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        match objects.iter().find(|(b, k, _)| b == bucket && k == key) {
            Some((_, _, body)) => Ok(body.clone()),
            None => bail!("NoSuchKey: s3://{}/{}", bucket, key),
        }
    }
}

/// Connector that hands out one shared [`MemoryStore`]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of handles built so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, credentials: &Credentials) -> Option<Arc<dyn ObjectStore>> {
        if !credentials.is_complete() {
            return None;
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let store: Arc<dyn ObjectStore> = self.store.clone();
        Some(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_object() {
        let store = MemoryStore::new();
        store.insert("bucket", "data/alpha.json", "{}");
        let body = store.get_object("bucket", "data/alpha.json").await.unwrap();

        assert_eq!(&body[..], b"{}");
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_missing_object() {
        let store = MemoryStore::new();
        let err = store.get_object("bucket", "data/none.csv").await.unwrap_err();
        assert!(err.to_string().contains("NoSuchKey"));
    }

    #[tokio::test]
    async fn test_memory_store_filters_bucket_and_prefix() {
        let store = MemoryStore::new();
        store.insert("bucket", "data/a.csv", "a");
        store.insert("bucket", "other/b.csv", "b");
        store.insert("elsewhere", "data/c.csv", "c");

        assert_eq!(store.list_keys("bucket", "data/").await.unwrap(), vec!["data/a.csv"]);
    }

    #[tokio::test]
    async fn test_memory_store_failing_mode() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(store.list_keys("bucket", "data/").await.is_err());

        store.set_failing(false);
        assert!(store.list_keys("bucket", "data/").await.is_ok());
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_insert_replaces() {
        let store = MemoryStore::new();
        store.insert("bucket", "a.csv", "old");
        store.insert("bucket", "a.csv", "new");

        assert_eq!(store.list_keys("bucket", "").await.unwrap().len(), 1);
        assert_eq!(&store.get_object("bucket", "a.csv").await.unwrap()[..], b"new");
    }

    #[tokio::test]
    async fn test_memory_connector_requires_both_keys() {
        let connector = MemoryConnector::new(Arc::new(MemoryStore::new()));

        assert!(connector.connect(&Credentials::new("", "s", "us-east-1")).await.is_none());
        assert!(connector.connect(&Credentials::new("a", "", "us-east-1")).await.is_none());
        assert_eq!(connector.connects(), 0);

        assert!(connector.connect(&Credentials::new("a", "s", "us-east-1")).await.is_some());
        assert_eq!(connector.connects(), 1);
    }
}
