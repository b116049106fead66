//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `UPRELAY_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `UPRELAY_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `UPRELAY_STORAGE__S3__BUCKET=uploads` sets the destination bucket.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! storage:
//!   s3:
//!     bucket: my-app-image-upload-bucket-unique-name
//!     region: eu-west-1
//! limits:
//!   max_upload_size: 52428800
//! ```
//!
//! For an S3-compatible service such as MinIO:
//!
//! ```bash
//! UPRELAY_STORAGE__S3__ENDPOINT_URL=http://localhost:9000
//! UPRELAY_STORAGE__S3__FORCE_PATH_STYLE=true
//! UPRELAY_STORAGE__S3__ACCESS_KEY_ID=minioadmin
//! UPRELAY_STORAGE__S3__SECRET_ACCESS_KEY=minioadmin
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bucket the relay writes into unless configured otherwise.
pub const DEFAULT_BUCKET: &str = "my-app-image-upload-bucket-unique-name";

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "UPRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Where uploaded files are written
    pub storage: StorageConfig,
    /// Request limits for the upload endpoint
    pub limits: LimitsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Storage backend configuration.
///
/// Externally tagged, so exactly one of `s3` or `memory` appears in YAML.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageConfig {
    /// Amazon S3 or any S3-compatible object store
    S3(S3Config),
    /// Process-local store. Contents are lost on restart; intended for development.
    Memory(MemoryConfig),
}

/// S3 backend configuration.
///
/// Anything left unset falls back to the AWS default provider chain
/// (`AWS_REGION`, `AWS_ACCESS_KEY_ID`, profile files, instance metadata, ...).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Config {
    /// Destination bucket. Must already exist.
    pub bucket: String,
    /// Region override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint, e.g. `http://localhost:9000` for MinIO
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Address buckets as `<endpoint>/<bucket>` instead of `<bucket>.<endpoint>`
    pub force_path_style: bool,
    /// Static access key id. Must be paired with `secret_access_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    /// Static secret access key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

/// In-memory backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    /// Bucket name reported in logs
    pub bucket: String,
}

/// Limits applied to incoming uploads.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size of an `/upload` request body in bytes. Unset means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::S3(S3Config::default())
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: None,
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

/// A configuration that parsed but cannot be used.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("storage.s3.bucket cannot be empty")]
    EmptyBucket,

    #[error("storage.s3.access_key_id and storage.s3.secret_access_key must be set together")]
    PartialCredentials,

    #[error("limits.max_upload_size must be greater than zero (omit it for no limit)")]
    ZeroUploadLimit,
}

impl StorageConfig {
    /// Name of the destination bucket, whichever backend is selected
    pub fn bucket(&self) -> &str {
        match self {
            StorageConfig::S3(s3) => &s3.bucket,
            StorageConfig::Memory(memory) => &memory.bucket,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config
            .validate()
            .map_err(|e| figment::Error::from(format!("Config validation: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let StorageConfig::S3(s3) = &self.storage {
            if s3.bucket.trim().is_empty() {
                return Err(ConfigError::EmptyBucket);
            }

            if s3.access_key_id.is_some() != s3.secret_access_key.is_some() {
                return Err(ConfigError::PartialCredentials);
            }
        }

        if self.limits.max_upload_size == Some(0) {
            return Err(ConfigError::ZeroUploadLimit);
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values. UPRELAY_CONFIG names the file itself.
            .merge(Env::prefixed("UPRELAY_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
