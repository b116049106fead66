//! Test utilities for handler and router tests.

use crate::config::{Config, MemoryConfig, StorageConfig};
use crate::storage::{MemoryStore, ObjectStore, StorageError};
use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use std::sync::Arc;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig::Memory(MemoryConfig {
            bucket: "test-bucket".to_string(),
        }),
        ..Default::default()
    }
}

/// Test server backed by a fresh [`MemoryStore`], returned alongside it for inspection
pub fn create_test_app() -> (TestServer, Arc<MemoryStore>) {
    create_test_app_with_config(create_test_config())
}

pub fn create_test_app_with_config(config: Config) -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(config.storage.bucket()));
    let app = crate::Application::with_store(config, store.clone());

    (app.into_test_server(), store)
}

/// Store whose every write fails as if the bucket did not exist
pub struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    fn bucket(&self) -> &str {
        "missing-bucket"
    }

    async fn put(&self, _key: &str, _content: Bytes, _content_type: Option<&str>) -> crate::storage::Result<()> {
        Err(StorageError::Service {
            code: "NoSuchBucket".to_string(),
            message: "The specified bucket does not exist".to_string(),
        })
    }
}

pub fn create_failing_test_app() -> TestServer {
    crate::Application::with_store(create_test_config(), Arc::new(FailingStore)).into_test_server()
}
