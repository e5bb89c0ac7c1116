//! S3 access module
//!
//! This module provides the storage side of the dashboard:
//! - [`client::S3Client`] - Credential-scoped S3 client (list keys, get object)
//! - [`store::ObjectStore`] - The read-only surface the dashboard depends on
//! - [`credentials::Credentials`] - Session credentials, never persisted
//! - [`types`] - Object key helpers

pub mod client;
pub mod credentials;
#[cfg(test)]
pub mod memory;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use client::{ConnectOptions, S3Client};
pub use credentials::{Credentials, DEFAULT_REGIONS};
pub use store::{list_files, Connector, ObjectStore, S3Connector};

#[cfg(test)]
pub use memory::{MemoryConnector, MemoryStore};
