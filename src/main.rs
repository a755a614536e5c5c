use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use unite_gateway::app_state::AppState;
use unite_gateway::build_router;
use unite_gateway::config::Config;
use unite_gateway::upstream::client::UpstreamOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Config::init();

    std::fs::create_dir_all("logs").expect("Failed to create logs directory");
    let file_appender = tracing_appender::rolling::daily("logs", "gateway.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(non_blocking.and(std::io::stdout))
        .init();

    let config = Config::get();
    let upstream_opts = UpstreamOptions {
        base_url: config.upstream_api_url.clone(),
        timeout: config.upstream_timeout,
        verify_poll_attempts: config.verify_poll_attempts,
        verify_poll_interval: config.verify_poll_interval,
    };
    let state = AppState::new(
        upstream_opts,
        config.cache_ttl,
        config.refresh_debounce,
        config.session_ttl,
    );

    tokio::spawn(refresh_listener(state.clone()));

    let app = build_router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(&addr).await?;
    println!("Gateway running at http://{} (upstream {})", addr, config.upstream_api_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    println!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
    println!("Received Ctrl+C, shutting down...");
}

/// Logs refresh traffic so the double-nudge and debounce behavior is visible
/// in operation.
async fn refresh_listener(state: AppState) {
    let mut rx = state.refresh.subscribe();
    loop {
        match rx.recv().await {
            Ok(signal) => tracing::info!(reason = ?signal.reason, "refresh broadcast"),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "refresh listener lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
