//! In-memory object store
//!
//! Keeps every object in a concurrent map for the lifetime of the process. Nothing touches the
//! filesystem. Useful for local development and as the backend in tests.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::storage::{ObjectStore, Result};

/// An object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Bytes,
    pub content_type: Option<String>,
}

/// Object store backed by a [`DashMap`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: DashMap<String, StoredObject>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: DashMap::new(),
        }
    }

    /// Fetch a copy of the object stored under `key`
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Keys of all stored objects, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, content: Bytes, content_type: Option<&str>) -> Result<()> {
        tracing::debug!(bucket = %self.bucket, key = %key, bytes = content.len(), "Storing object in memory");

        // Single insert: readers see either the previous object or the complete new one
        self.objects.insert(
            key.to_string(),
            StoredObject {
                content,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }
}
