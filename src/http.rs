use axum::{Router, routing::get};
use log::info;

pub const HEALTH_CHECK_PATH: &str = "/player-statistics/api/health-check";

pub fn router() -> Router {
    Router::new().route(HEALTH_CHECK_PATH, get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}

pub async fn run(
    address: String,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!("Health check listening on {}", address);
    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP server shut down gracefully");
    Ok(())
}
