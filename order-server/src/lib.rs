//! QuickRun order-server
//!
//! Order-creation service built around a transactional outbox:
//!
//! - **HTTP API** (`api`): create/list/read orders, status update, stats
//! - **Persistence** (`db`, `store`): orders table + append-only event ledger,
//!   written in one transaction on the create path
//! - **Publish path** (`dispatch`): post-commit handoff to a bounded worker
//!   pool that publishes to the broker exchange
//! - **Broker** (`broker`): direct exchange, four durable queues, routing
//!   key equal to the queue name
//! - **Consume path** (`consumer`, `stats`): per-queue worker groups that
//!   ledger every event and track throughput/latency

pub mod api;
pub mod broker;
pub mod config;
pub mod consumer;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod orders;
pub mod pricing;
pub mod state;
pub mod stats;
pub mod store;

pub use config::Config;
pub use state::AppState;
