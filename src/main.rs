use anyhow::Result;
use nodestats::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let host_info: Arc<dyn host::HostInfo> = Arc::new(host::SysinfoHost::new());
    let aggregator = Arc::new(
        aggregator::Aggregator::new(
            host_info.as_ref(),
            Arc::new(counter::SysinfoCounterProvider),
            app_config.aggregator_config(),
        )
        .map_err(|e| anyhow::anyhow!("aggregator: {}", e))?,
    );
    let shutdown = CancellationToken::new();
    let aggregation_handle = aggregator
        .start(shutdown.clone())
        .map_err(|e| anyhow::anyhow!("aggregator start: {}", e))?;

    let docker_repo = Arc::new(docker_repo::DockerRepo::connect(&app_config.runtime)?);
    let stats_client = Arc::new(client::StatsClient::new(
        aggregator.clone(),
        docker_repo,
        host_info,
    ));

    let app = routes::app(stats_client);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    shutdown.cancel();
    let _ = aggregation_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
