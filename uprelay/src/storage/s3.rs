//! S3 object store
//!
//! Writes each upload with a single `PutObject` call, so S3 only exposes the object once the
//! whole body has been received. No retries or multipart uploads are layered on top of what the
//! SDK already does.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::put_object::PutObjectError,
    primitives::ByteStream,
};
use bytes::Bytes;

use crate::config::S3Config;
use crate::storage::{ObjectStore, Result, StorageError};

/// Object store writing to a single S3 bucket
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the AWS default provider chain, applying any overrides from config
    pub async fn from_config(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let (Some(access_key_id), Some(secret_access_key)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(access_key_id, secret_access_key, None, None, "uprelay-config"));
        }

        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        tracing::info!(
            bucket = %config.bucket,
            region = ?sdk_config.region(),
            endpoint_url = ?config.endpoint_url,
            force_path_style = config.force_path_style,
            "S3 storage configured"
        );

        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }
}

impl From<SdkError<PutObjectError>> for StorageError {
    fn from(err: SdkError<PutObjectError>) -> Self {
        match &err {
            SdkError::ServiceError(service_err) => {
                let put_err = service_err.err();
                StorageError::Service {
                    code: put_err.code().unwrap_or("Unknown").to_string(),
                    message: put_err
                        .message()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("HTTP {}", service_err.raw().status().as_u16())),
                }
            }
            _ => StorageError::Transport {
                message: DisplayErrorContext(&err).to_string(),
            },
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, content: Bytes, content_type: Option<&str>) -> Result<()> {
        let size = content.len();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let output = request.send().await?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            bytes = size,
            e_tag = ?output.e_tag(),
            "Object written to S3"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{RequestChecksumCalculation, retry::RetryConfig};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_store(endpoint_url: &str) -> S3Store {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test-key", "test-secret", None, None, "test"))
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .retry_config(RetryConfig::disabled())
            .build();

        S3Store::new(Client::from_conf(config), "test-bucket")
    }

    #[test_log::test(tokio::test)]
    async fn test_put_sends_object_to_bucket_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/test-bucket/photo.png"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"d41d8cd98f00b204e9800998ecf8427e\""))
            .expect(1)
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        store
            .put("photo.png", Bytes::from_static(b"not really a png"), Some("image/png"))
            .await
            .expect("upload should succeed");

        let requests = server.received_requests().await.expect("request recording is enabled");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, b"not really a png");
    }

    #[test_log::test(tokio::test)]
    async fn test_service_error_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/test-bucket/secret.txt"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>4442587FB7D0A2F9</RequestId></Error>"#,
                "application/xml",
            ))
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        let err = store
            .put("secret.txt", Bytes::from_static(b"hidden"), None)
            .await
            .expect_err("403 should surface as an error");

        match err {
            StorageError::Service { code, message } => {
                assert_eq!(code, "AccessDenied");
                assert_eq!(message, "Access Denied");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 1
        let store = test_store("http://127.0.0.1:1");

        let err = store
            .put("a.txt", Bytes::from_static(b"data"), None)
            .await
            .expect_err("connection should fail");

        assert!(matches!(err, StorageError::Transport { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_bucket() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let config = S3Config {
            bucket: "configured-bucket".to_string(),
            region: Some("eu-west-1".to_string()),
            endpoint_url: Some("http://127.0.0.1:9000".to_string()),
            force_path_style: true,
            access_key_id: Some("minioadmin".to_string()),
            secret_access_key: Some("minioadmin".to_string()),
        };

        let store = S3Store::from_config(&config).await;
        assert_eq!(store.bucket(), "configured-bucket");
        assert_eq!(store.client.config().region().map(|r| r.as_ref()), Some("eu-west-1"));
    }
}
