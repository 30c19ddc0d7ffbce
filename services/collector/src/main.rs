use deskwatch_collector::{bus, IngestController};
use deskwatch_core::{logging, CollectorConfig};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CollectorConfig::from_env()?;
    logging::init_with(config.log_format);

    let controller = IngestController::from_config(&config)?;
    info!(
        host = %config.mqtt.host,
        port = config.mqtt.port,
        topic = %controller.topic_filter(),
        forward_target = controller.forward_target().unwrap_or("<disabled>"),
        "Starting collector"
    );
    if !config.forwarding_enabled() {
        info!("No ingest URL configured, accepted messages are only logged");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mqtt = config.mqtt.clone();
    let mut bus_task = tokio::spawn(async move {
        bus::run(&mqtt, &controller, shutdown_rx).await;
    });

    tokio::select! {
        result = &mut bus_task => {
            if let Err(e) = result {
                error!(error = %e, "Bus task terminated unexpectedly");
            }
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!(grace_secs = config.shutdown_grace.as_secs(), "Shutdown requested");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(config.shutdown_grace, &mut bus_task).await {
        Ok(Ok(())) => info!("Collector stopped"),
        Ok(Err(e)) => error!(error = %e, "Bus task failed during shutdown"),
        Err(_) => {
            warn!("Shutdown grace period elapsed, aborting in-flight work");
            bus_task.abort();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
                return;
            }
            Err(e) => warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C only"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
