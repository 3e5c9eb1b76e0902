//! Storage traits for the order table and the event ledger
//!
//! The create path is the transactional boundary: the order row and its
//! outbox ledger row become visible atomically, and the after-commit hook
//! runs only once the transaction executor has confirmed durability. No
//! component writes either table outside this module, except the consumer's
//! single-row ledger append.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use thiserror::Error;

use shared::models::{Order, PagedResult};

pub use memory::MemoryOrderStore;
pub use pg::PgOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Order row awaiting identity assignment
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub username: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address_line1: String,
    pub delivery_address_line2: Option<String>,
    pub delivery_address_city: String,
    pub delivery_address_state: String,
    pub delivery_address_zip_code: String,
    pub delivery_address_country: String,
    pub status: String,
    pub comments: Option<String>,
    pub total_price: Decimal,
}

/// Ledger row awaiting identity assignment (append-only table)
#[derive(Debug, Clone)]
pub struct NewLedgerRecord {
    pub order_number: String,
    pub event_id: String,
    pub event_type: String,
    pub payload: String,
}

/// Callback registered with the transaction boundary; the executor invokes
/// it only after a successful, durable commit. A rolled-back transaction
/// never runs it.
pub type AfterCommit = Box<dyn FnOnce(Order) -> BoxFuture<'static, ()> + Send>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and exactly one ledger row in one atomic unit
    /// (both-or-neither), then run `after_commit`.
    async fn create_order(
        &self,
        order: NewOrder,
        record: NewLedgerRecord,
        after_commit: AfterCommit,
    ) -> Result<Order, StoreError>;

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError>;

    async fn list_orders(&self, page: i64, size: i64) -> Result<PagedResult<Order>, StoreError>;

    /// The only status mutator; consumed events never call this.
    async fn update_status(&self, id: i64, status: &str) -> Result<Option<Order>, StoreError>;
}

/// Consumer-side write path: a single-row, no-conflict append
#[async_trait]
pub trait EventLedger: Send + Sync {
    async fn append(&self, record: NewLedgerRecord) -> Result<(), StoreError>;
}
