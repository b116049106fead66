//! Object storage abstraction layer
//!
//! This module defines the [`ObjectStore`] trait, the single capability the upload relay needs
//! from object storage: put a blob under a key in a bucket. Backends:
//!
//! - [`s3::S3Store`]: Amazon S3 and S3-compatible services via `aws-sdk-s3`
//! - [`memory::MemoryStore`]: process-local map, for development and tests

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::config::StorageConfig;

pub mod memory;
pub mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

/// Create a storage backend from configuration
///
/// This is the single point where we convert config into backend instances.
pub async fn create_store(config: &StorageConfig) -> Arc<dyn ObjectStore> {
    match config {
        StorageConfig::S3(s3_config) => Arc::new(S3Store::from_config(s3_config).await),
        StorageConfig::Memory(memory_config) => Arc::new(MemoryStore::new(memory_config.bucket.clone())),
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while writing to object storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The storage service answered and refused the request (access denied, no such bucket, ...)
    #[error("storage service rejected the request ({code}): {message}")]
    Service { code: String, message: String },

    /// No service response was obtained: connection, timeout, credentials or request construction
    #[error("storage transport error: {message}")]
    Transport { message: String },
}

/// Abstract object storage interface
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket objects are written to
    fn bucket(&self) -> &str;

    /// Store `content` under `key`, replacing any existing object with that key.
    ///
    /// The object becomes visible only once the whole body has been accepted.
    async fn put(&self, key: &str, content: Bytes, content_type: Option<&str>) -> Result<()>;
}
