use std::sync::Arc;
use tenantgate_server::{build_state, router, Settings};
use tenantgate_vespa::VespaClient;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let settings = Settings::load()?;
    let timeout = settings.timeout()?.duration();
    let backend = Arc::new(VespaClient::new(&settings.vespa_endpoint, timeout)?);
    let state = build_state(&settings, backend)?;

    let sweeper =
        settings.sweep_interval().map(|interval| state.dispatcher.spawn_sweeper(interval));

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(
        addr = %settings.bind_addr,
        vespa = %settings.vespa_endpoint,
        limit = settings.rate_limit.limit,
        window_secs = settings.rate_limit.window_secs,
        "tenantgate listening"
    );

    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }
    tracing::info!("tenantgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
