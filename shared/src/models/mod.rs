//! Data models
//!
//! Shared between order-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All surrogate IDs are `i64` (Postgres BIGSERIAL).

pub mod order;
pub mod task;

// Re-exports
pub use order::*;
pub use task::*;
