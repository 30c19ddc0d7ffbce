use deskwatch_core::logging;
use deskwatch_mock_ingest::MockIngest;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let port = match std::env::var("PORT") {
        Ok(raw) => raw.trim().parse()?,
        Err(_) => DEFAULT_PORT,
    };

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Mock ingest listening on {}", bind_addr);

    axum::serve(listener, MockIngest::new().router())
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
