//! flowtutor-api - HTTP API server for flowtutor

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowtutor_api::config::{CacheConfig, ClusterConfig, MutationConfig, ServerConfig};
use flowtutor_api::services::ResponseCache;
use flowtutor_api::{app, AppState};
use flowtutor_inference::{ChatBackend, OpenAIBackend, OpenAIConfig};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "flowtutor_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flowtutor_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("flowtutor-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let server_config = ServerConfig::from_env();
    let cache_config = CacheConfig::from_env();
    let mutation_config = MutationConfig::from_env();
    let cluster_config = ClusterConfig::from_env();

    // Providers
    let primary: Arc<dyn ChatBackend> = Arc::new(OpenAIBackend::new(OpenAIConfig::from_env())?);
    let fallback: Arc<dyn ChatBackend> = if std::env::var("FALLBACK_BASE_URL").is_ok() {
        info!("Using secondary provider for lenient mutation stage");
        Arc::new(OpenAIBackend::new(OpenAIConfig::from_env_with_prefix(
            "FALLBACK",
        ))?)
    } else {
        Arc::clone(&primary)
    };

    info!(
        strict_model = %mutation_config.strict_model,
        lenient_model = %mutation_config.lenient_model,
        cluster_model = %cluster_config.model,
        timeout_secs = mutation_config.invocation_timeout.as_secs(),
        "Model configuration"
    );

    // Response cache and its sweeper
    let cache = ResponseCache::new(cache_config.ttl);
    let sweeper = cache.start_sweeper(cache_config.sweep_interval);
    info!(
        ttl_secs = cache_config.ttl.as_secs(),
        sweep_interval_secs = cache_config.sweep_interval.as_secs(),
        "Response cache enabled"
    );

    let state = AppState::new(primary, fallback, &mutation_config, &cluster_config, cache);
    let router = app(state, &server_config);

    // Start server
    let addr: SocketAddr = server_config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await?;
    info!("Server stopped");

    Ok(())
}
