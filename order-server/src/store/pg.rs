use async_trait::async_trait;
use sqlx::PgPool;

use shared::models::{Order, PagedResult};
use shared::util::now_naive;

use crate::db;

use super::{AfterCommit, EventLedger, NewLedgerRecord, NewOrder, OrderStore, StoreError};

/// Postgres-backed store. The create path shares a single transaction
/// across both inserts.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(
        &self,
        order: NewOrder,
        record: NewLedgerRecord,
        after_commit: AfterCommit,
    ) -> Result<Order, StoreError> {
        let now = now_naive();
        let mut tx = self.pool.begin().await?;
        let saved = db::orders::insert(&mut *tx, &order, now).await?;
        db::order_events::insert(&mut *tx, &record, now).await?;
        tx.commit().await?;

        after_commit(saved.clone()).await;
        Ok(saved)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        Ok(db::orders::find_by_id(&self.pool, id).await?)
    }

    async fn list_orders(&self, page: i64, size: i64) -> Result<PagedResult<Order>, StoreError> {
        let size = size.clamp(1, 100);
        let page = page.max(0);
        let total_elements = db::orders::count(&self.pool).await?;
        let content = db::orders::list(&self.pool, size, page * size).await?;
        Ok(PagedResult {
            content,
            page,
            size,
            total_elements,
        })
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<Option<Order>, StoreError> {
        Ok(db::orders::update_status(&self.pool, id, status, now_naive()).await?)
    }
}

#[async_trait]
impl EventLedger for PgOrderStore {
    async fn append(&self, record: NewLedgerRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        db::order_events::insert(&mut *conn, &record, now_naive()).await?;
        Ok(())
    }
}
