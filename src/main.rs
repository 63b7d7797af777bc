use std::sync::Arc;

use log::{error, info};
use player_stats_amqp_lapin::LapinBroker;
use player_stats_app::{
    build_application,
    processes::registration::{ServiceDescriptor, ServiceRegistration},
};
use player_stats_persistence_sea_orm::{connect, statistics::StatisticRepositoryImpl};
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, SERVICE_NAME, SERVICE_VERSION};

mod config;
mod http;
mod logs;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    logs::init_logger().expect("Failed to initialize logger");

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db = connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    let statistic_repository = Arc::new(StatisticRepositoryImpl::new(db));
    let app = build_application(statistic_repository);

    let broker = Arc::new(LapinBroker::new(&config.amqp).expect("Invalid AMQP settings"));

    ServiceRegistration::new(
        broker.clone(),
        config.register.clone(),
        ServiceDescriptor::player_statistics(SERVICE_NAME, SERVICE_VERSION),
    )
    .run()
    .await;

    info!("Starting {} {}", SERVICE_NAME, SERVICE_VERSION);

    let cancel = CancellationToken::new();

    let workers: Vec<_> = app
        .rpc_workers(broker)
        .into_iter()
        .map(|worker| {
            let cancel = cancel.clone();
            tokio::spawn(async move { worker.run(cancel).await })
        })
        .collect();

    let http_app = {
        let address = config.http_address();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = http::run(address, cancel.cancelled_owned()).await {
                error!("HTTP server failed: {}", e);
            }
        })
    };

    shutdown_signal().await;
    cancel.cancel();

    for worker in workers {
        if let Err(e) = worker.await {
            error!("RPC worker task failed: {}", e);
        }
    }

    if let Err(e) = http_app.await {
        error!("HTTP server task failed: {}", e);
    }
}
