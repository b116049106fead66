use clap::Parser;
use uprelay::{Application, Config, telemetry};

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, finishing in-flight uploads before exit");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, finishing in-flight uploads before exit");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The S3 client and the OTLP exporter both build TLS clients; pick the provider up front
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = uprelay::config::Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!(
        config_file = %args.config,
        bucket = %config.storage.bucket(),
        max_upload_size = ?config.limits.max_upload_size,
        "Configuration loaded"
    );

    let shutdown = shutdown_signal();
    Application::new(config).await?.serve(shutdown).await
}
