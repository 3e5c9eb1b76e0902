use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use shared::models::{LedgerRecord, Order, PagedResult};
use shared::util::now_naive;

use super::{AfterCommit, EventLedger, NewLedgerRecord, NewOrder, OrderStore, StoreError};

/// In-memory store with the same atomicity contract as the Postgres one.
/// Failure injection lets tests exercise the rollback and consumer-failure
/// paths without a database.
#[derive(Default)]
pub struct MemoryOrderStore {
    inner: Mutex<Inner>,
    fail_ledger_writes: AtomicBool,
}

#[derive(Default)]
struct Inner {
    orders: Vec<Order>,
    events: Vec<LedgerRecord>,
    next_order_id: i64,
    next_event_id: i64,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every ledger insert fail until cleared, including the one
    /// inside [`OrderStore::create_order`].
    pub fn set_fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.locked().orders.len()
    }

    pub fn event_count(&self) -> usize {
        self.locked().events.len()
    }

    pub fn events_for(&self, order_number: &str) -> Vec<LedgerRecord> {
        self.locked()
            .events
            .iter()
            .filter(|e| e.order_number == order_number)
            .cloned()
            .collect()
    }

    // A poisoned lock only means a panicking test thread; the row data
    // itself stays valid, so keep serving it.
    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn push_order(&mut self, order: NewOrder) -> Order {
        self.next_order_id += 1;
        let now = now_naive();
        let saved = Order {
            id: self.next_order_id,
            order_number: order.order_number,
            username: order.username,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            delivery_address_line1: order.delivery_address_line1,
            delivery_address_line2: order.delivery_address_line2,
            delivery_address_city: order.delivery_address_city,
            delivery_address_state: order.delivery_address_state,
            delivery_address_zip_code: order.delivery_address_zip_code,
            delivery_address_country: order.delivery_address_country,
            status: order.status,
            comments: order.comments,
            total_price: order.total_price,
            created_at: now,
            updated_at: now,
        };
        self.orders.push(saved.clone());
        saved
    }

    fn push_event(&mut self, record: NewLedgerRecord) -> Result<(), StoreError> {
        if self.events.iter().any(|e| e.event_id == record.event_id) {
            return Err(StoreError::Conflict(format!(
                "duplicate event_id: {}",
                record.event_id
            )));
        }
        self.next_event_id += 1;
        self.events.push(LedgerRecord {
            id: self.next_event_id,
            order_number: record.order_number,
            event_id: record.event_id,
            event_type: record.event_type,
            payload: record.payload,
            created_at: now_naive(),
        });
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create_order(
        &self,
        order: NewOrder,
        record: NewLedgerRecord,
        after_commit: AfterCommit,
    ) -> Result<Order, StoreError> {
        let saved = {
            let mut inner = self.locked();
            if inner
                .orders
                .iter()
                .any(|o| o.order_number == order.order_number)
            {
                return Err(StoreError::Conflict(format!(
                    "duplicate order_number: {}",
                    order.order_number
                )));
            }
            if self.fail_ledger_writes.load(Ordering::SeqCst) {
                // Nothing written yet, so the unit rolls back whole.
                return Err(StoreError::Unavailable("ledger write failed".into()));
            }
            let saved = inner.push_order(order);
            if let Err(err) = inner.push_event(record) {
                inner.orders.pop();
                return Err(err);
            }
            saved
        };
        after_commit(saved.clone()).await;
        Ok(saved)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        Ok(self.locked().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, page: i64, size: i64) -> Result<PagedResult<Order>, StoreError> {
        let size = size.clamp(1, 100);
        let page = page.max(0);
        let inner = self.locked();
        let content = inner
            .orders
            .iter()
            .skip((page * size) as usize)
            .take(size as usize)
            .cloned()
            .collect();
        Ok(PagedResult {
            content,
            page,
            size,
            total_elements: inner.orders.len() as i64,
        })
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<Option<Order>, StoreError> {
        let mut inner = self.locked();
        Ok(inner.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status.to_string();
            o.updated_at = now_naive();
            o.clone()
        }))
    }
}

#[async_trait]
impl EventLedger for MemoryOrderStore {
    async fn append(&self, record: NewLedgerRecord) -> Result<(), StoreError> {
        if self.fail_ledger_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ledger write failed".into()));
        }
        self.locked().push_event(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn new_order(number: &str) -> NewOrder {
        NewOrder {
            order_number: number.to_string(),
            username: "alice".into(),
            customer_name: "Alice A".into(),
            customer_email: "alice@example.com".into(),
            customer_phone: "5550001111".into(),
            delivery_address_line1: "1 Main St".into(),
            delivery_address_line2: None,
            delivery_address_city: "Springfield".into(),
            delivery_address_state: "SP".into(),
            delivery_address_zip_code: "10001".into(),
            delivery_address_country: "US".into(),
            status: "CREATED".into(),
            comments: None,
            total_price: Decimal::new(2000, 2),
        }
    }

    fn new_record(number: &str, event_id: &str) -> NewLedgerRecord {
        NewLedgerRecord {
            order_number: number.to_string(),
            event_id: event_id.to_string(),
            event_type: "ORDER_CREATED".into(),
            payload: "{}".into(),
        }
    }

    fn noop() -> AfterCommit {
        Box::new(|_| Box::pin(async {}))
    }

    #[tokio::test]
    async fn create_rejects_duplicate_order_number() {
        let store = MemoryOrderStore::new();
        store
            .create_order(new_order("QR-aaaaaaaa"), new_record("QR-aaaaaaaa", "e1"), noop())
            .await
            .unwrap();
        let err = store
            .create_order(new_order("QR-aaaaaaaa"), new_record("QR-aaaaaaaa", "e2"), noop())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_event_id_rolls_back_the_order_row() {
        let store = MemoryOrderStore::new();
        store
            .create_order(new_order("QR-aaaaaaaa"), new_record("QR-aaaaaaaa", "e1"), noop())
            .await
            .unwrap();
        let err = store
            .create_order(new_order("QR-bbbbbbbb"), new_record("QR-bbbbbbbb", "e1"), noop())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn after_commit_runs_only_on_success() {
        use std::sync::atomic::{AtomicBool, Ordering};
        let store = MemoryOrderStore::new();
        store.set_fail_ledger_writes(true);

        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let hook: AfterCommit = Box::new(move |_| {
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            })
        });
        store
            .create_order(new_order("QR-aaaaaaaa"), new_record("QR-aaaaaaaa", "e1"), hook)
            .await
            .unwrap_err();
        assert!(!fired.load(Ordering::SeqCst));

        store.set_fail_ledger_writes(false);
        let flag = fired.clone();
        let hook: AfterCommit = Box::new(move |saved| {
            Box::pin(async move {
                assert_eq!(saved.order_number, "QR-aaaaaaaa");
                flag.store(true, Ordering::SeqCst);
            })
        });
        store
            .create_order(new_order("QR-aaaaaaaa"), new_record("QR-aaaaaaaa", "e1"), hook)
            .await
            .unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn list_and_update_status() {
        let store = MemoryOrderStore::new();
        for i in 0..5 {
            let number = format!("QR-{:08x}", i);
            store
                .create_order(new_order(&number), new_record(&number, &format!("e{i}")), noop())
                .await
                .unwrap();
        }

        let page = store.list_orders(1, 2).await.unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_elements, 5);

        let updated = store.update_status(1, "DELIVERED").await.unwrap().unwrap();
        assert_eq!(updated.status, "DELIVERED");
        assert!(store.update_status(999, "DELIVERED").await.unwrap().is_none());
    }
}
