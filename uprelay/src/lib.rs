//! # uprelay: HTTP file-upload relay
//!
//! `uprelay` accepts a multipart file upload over HTTP and writes the file's bytes into an
//! object-storage bucket under the client-supplied filename, answering with a plain-text
//! confirmation or error.
//!
//! ## HTTP surface
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/` | 200 `Upload Service Ready!` | |
//! | POST | `/upload` | 200 `File <name> uploaded successfully!` | 400 `No file provided.`, 413, 502 `Failed to upload file.` |
//! | GET | `/healthz` | 200 `OK` | |
//! | GET | `/api-docs/openapi.json` | 200 OpenAPI document | |
//! | GET | `/internal/metrics` | 200 Prometheus metrics (when `enable_metrics`) | |
//!
//! The filename is used as the object key verbatim. It is not sanitized, and uploading a file
//! with an existing name replaces the stored object.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Storage sits behind the
//! [`storage::ObjectStore`] trait, chosen from configuration at startup: S3 (or any
//! S3-compatible service) in production, an in-memory map for development and tests. The
//! configuration and the store are built once and handed to handlers through [`AppState`];
//! nothing is kept between requests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use uprelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = uprelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     uprelay::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use storage::ObjectStore;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .store(Arc::new(MemoryStore::new("uploads")))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
}

/// Build the application router with all routes and middleware
///
/// The `/upload` route carries its own body limit: `limits.max_upload_size` when configured,
/// otherwise no limit at all.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let upload_limit = match state.config.limits.max_upload_size {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    let mut router = Router::new()
        .route("/", get(api::handlers::status::home))
        .route("/healthz", get(api::handlers::status::healthz))
        .route("/upload", post(api::handlers::upload::upload_file).layer(upload_limit))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    // Add Prometheus metrics if enabled
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Add tracing layer
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application, building the storage backend named in the configuration
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting upload relay with configuration: {:#?}", config);

        config.validate()?;
        let store = storage::create_store(&config.storage).await;

        Ok(Self::with_store(config, store))
    }

    /// Create an application around an already-built storage backend
    pub fn with_store(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        let state = AppState::builder().config(config.clone()).store(store).build();
        let router = build_router(state);

        Self { router, config }
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            bucket = %self.config.storage.bucket(),
            "Upload relay listening on http://{}",
            listener.local_addr()?
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{MemoryConfig, S3Config, StorageConfig};
    use crate::storage::MemoryStore;
    use crate::test_utils::create_test_config;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};

    #[tokio::test]
    async fn test_build_router_with_memory_store() {
        let store = Arc::new(MemoryStore::new("router-bucket"));
        let state = AppState::builder().config(create_test_config()).store(store.clone()).build();
        let server = axum_test::TestServer::new(build_router(state)).expect("Failed to create test server");

        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "Upload Service Ready!");

        let form = MultipartForm::new().add_part("file", Part::bytes(b"payload".as_slice()).file_name("report.csv"));
        let response = server.post("/upload").multipart(form).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(store.keys(), vec!["report.csv".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (server, _store) = crate::test_utils::create_test_app();

        server.get("/does-not-exist").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_requires_post() {
        let (server, _store) = crate::test_utils::create_test_app();

        server.get("/upload").await.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_build_router_without_metrics() {
        let (server, _store) = crate::test_utils::create_test_app();

        // Metrics endpoint should not exist
        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    // The Prometheus recorder is process-global, so this is the only test that enables it
    #[tokio::test]
    async fn test_build_router_with_metrics_enabled() {
        let mut config = create_test_config();
        config.enable_metrics = true;
        let (server, store) = crate::test_utils::create_test_app_with_config(config);

        let form = MultipartForm::new().add_part("file", Part::bytes(b"counted".as_slice()).file_name("counted.txt"));
        server.post("/upload").multipart(form).await.assert_status(StatusCode::OK);
        assert!(store.get("counted.txt").is_some());

        // Metrics endpoint should exist and return Prometheus format
        let metrics_response = server.get("/internal/metrics").await;
        metrics_response.assert_status(StatusCode::OK);

        let metrics_content = metrics_response.text();
        assert!(metrics_content.contains("# TYPE"));
        assert!(metrics_content.contains("uprelay_uploads_total"));
        assert!(metrics_content.contains("outcome=\"stored\""));
    }

    #[tokio::test]
    async fn test_application_new_builds_memory_store_from_config() {
        let mut config = create_test_config();
        config.storage = StorageConfig::Memory(MemoryConfig {
            bucket: "from-config".to_string(),
        });

        let app = Application::new(config).await.expect("Failed to create application");
        let server = app.into_test_server();

        let form = MultipartForm::new().add_part("file", Part::bytes(b"x".as_slice()).file_name("x.txt"));
        let response = server.post("/upload").multipart(form).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "File x.txt uploaded successfully!");
    }

    #[tokio::test]
    async fn test_application_new_rejects_invalid_config() {
        let mut config = create_test_config();
        config.storage = StorageConfig::S3(S3Config {
            bucket: String::new(),
            ..Default::default()
        });

        assert!(Application::new(config).await.is_err());
    }

    #[tokio::test]
    async fn test_serve_shuts_down_gracefully() {
        let config = create_test_config();
        let app = Application::with_store(config, Arc::new(MemoryStore::new("test-bucket")));

        // Resolving shutdown immediately should still bind, serve and return cleanly
        app.serve(async {}).await.expect("serve should exit cleanly");
    }
}
