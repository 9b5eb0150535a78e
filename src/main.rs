use std::net::SocketAddr;
use std::sync::Arc;

use pingboard::{HostRegistry, IcmpProber, Monitor, MonitorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = MonitorConfig::from_env()?;
    tracing::info!(
        hosts = ?config.hosts,
        interval = ?config.interval,
        "{} start",
        chrono::Local::now()
    );

    let registry = Arc::new(HostRegistry::new(config.hosts.iter().cloned())?);
    let prober = Arc::new(IcmpProber::new(config.ping_count, config.ping_timeout));

    let mut monitor = Monitor::new(Arc::clone(&registry), prober, config.monitor_settings());
    monitor.start();

    let addr = SocketAddr::new(config.bind, config.port);
    let (_, server) = match pingboard::server::bind(addr, registry, shutdown_signal()) {
        Ok(bound) => bound,
        Err(e) => {
            monitor.stop().await;
            return Err(e.into());
        }
    };
    server.await;

    tracing::info!("Shutting down...");
    monitor.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }
}
