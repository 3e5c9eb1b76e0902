use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use order_server::broker::{Broker, topology};
use order_server::consumer::{self, ConsumerConfig};
use order_server::dispatch::{DispatchConfig, DispatchPool};
use order_server::orders::OrderService;
use order_server::pricing::HttpTaskClient;
use order_server::stats::{self, EventStats};
use order_server::store::{EventLedger, OrderStore, PgOrderStore};
use order_server::{AppState, Config, api};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(degraded_mode = config.degraded_mode, "Starting order-server");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let broker = Arc::new(Broker::new(config.queue_capacity));
    topology::declare(&broker);

    let dispatch = Arc::new(DispatchPool::new(
        broker.clone(),
        DispatchConfig {
            core_workers: config.dispatch_core_workers,
            max_workers: config.dispatch_max_workers,
            queue_capacity: config.dispatch_queue_capacity,
        },
    ));

    let store = Arc::new(PgOrderStore::new(pool.clone()));
    let stats = Arc::new(EventStats::new());
    stats::spawn_sampler(stats.clone(), broker.shutdown_token().child_token());

    consumer::spawn_consumers(
        &broker,
        store.clone() as Arc<dyn EventLedger>,
        stats.clone(),
        ConsumerConfig {
            concurrency: config.consumer_concurrency,
            max_concurrency: config.consumer_max_concurrency,
            prefetch: config.consumer_prefetch,
        },
    );

    let pricing = Arc::new(HttpTaskClient::new(config.task_service_url.clone())?);
    let orders = Arc::new(OrderService::new(
        store.clone() as Arc<dyn OrderStore>,
        pricing,
        dispatch.clone(),
        config.degraded_mode,
    ));

    let state = AppState {
        store: store as Arc<dyn OrderStore>,
        orders,
        stats,
    };
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain outstanding publish work, then stop the broker so the
    // consumer groups wind down.
    dispatch
        .shutdown(Duration::from_secs(config.dispatch_shutdown_grace_secs))
        .await;
    broker.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
