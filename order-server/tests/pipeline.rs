//! End-to-end flow: broker topology, dispatch pool, consumer groups,
//! and the in-memory ledger wired together the way main() wires them.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use shared::events::{OrderDeliveredEvent, OrderErrorEvent, OrderEvent};
use shared::util::now_naive;

use order_server::broker::{Broker, topology};
use order_server::consumer::{self, ConsumerConfig};
use order_server::dispatch::{DispatchConfig, DispatchPool};
use order_server::stats::EventStats;
use order_server::store::MemoryOrderStore;

struct Pipeline {
    broker: Arc<Broker>,
    dispatch: Arc<DispatchPool>,
    store: Arc<MemoryOrderStore>,
    stats: Arc<EventStats>,
}

fn pipeline() -> Pipeline {
    let broker = Arc::new(Broker::new(64));
    topology::declare(&broker);
    let dispatch = Arc::new(DispatchPool::new(
        broker.clone(),
        DispatchConfig {
            core_workers: 4,
            max_workers: 8,
            queue_capacity: 32,
        },
    ));
    let store = Arc::new(MemoryOrderStore::new());
    let stats = Arc::new(EventStats::new());
    consumer::spawn_consumers(
        &broker,
        store.clone(),
        stats.clone(),
        ConsumerConfig {
            concurrency: 2,
            max_concurrency: 4,
            prefetch: 10,
        },
    );
    Pipeline {
        broker,
        dispatch,
        store,
        stats,
    }
}

fn delivered_event(order_number: &str) -> OrderEvent {
    OrderEvent::Delivered(OrderDeliveredEvent {
        order_number: order_number.to_string(),
        delivery_person: "Dana".to_string(),
        delivered_at: now_naive(),
    })
}

async fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn delivered_events_are_consumed_ledgered_and_counted() {
    let p = pipeline();

    for i in 0..3 {
        let number = format!("QR-{:08x}", i);
        p.dispatch.submit(delivered_event(&number)).await.unwrap();
    }

    assert!(
        wait_until(|| p.store.event_count() == 3).await,
        "all three events should reach the ledger"
    );
    let snapshot = p.stats.snapshot();
    assert_eq!(snapshot.delivered.processed, 3);
    assert_eq!(snapshot.created.processed, 0);

    // Ledger rows carry the original payload under fresh event ids.
    let rows = p.store.events_for("QR-00000000");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "ORDER_DELIVERED");
    assert!(rows[0].payload.contains("deliveryPerson"));
    Uuid::parse_str(&rows[0].event_id).unwrap();

    p.dispatch.shutdown(Duration::from_secs(1)).await;
    p.broker.shutdown();
}

#[tokio::test]
async fn event_for_unknown_order_is_still_ledgered() {
    let p = pipeline();

    // No order row exists for this number; the ledger accepts it anyway.
    p.dispatch
        .submit(delivered_event("QR-deadbeef"))
        .await
        .unwrap();

    assert!(wait_until(|| p.store.event_count() == 1).await);
    assert_eq!(p.store.order_count(), 0);
    assert_eq!(p.store.events_for("QR-deadbeef").len(), 1);

    p.broker.shutdown();
}

#[tokio::test]
async fn ledger_failure_still_acks_and_counts() {
    let p = pipeline();
    p.store.set_fail_ledger_writes(true);

    p.dispatch
        .submit(OrderEvent::Error(OrderErrorEvent {
            order_number: "QR-0badc0de".to_string(),
            error_message: "address unreachable".to_string(),
            occurred_at: now_naive(),
        }))
        .await
        .unwrap();

    // Counted and acknowledged despite the failed ledger write.
    assert!(wait_until(|| p.stats.snapshot().errors.processed == 1).await);
    assert_eq!(p.store.event_count(), 0);
    assert!(
        wait_until(|| p.broker.queue_depth(topology::ERROR_ORDERS_QUEUE) == Some(0)).await,
        "delivery must be acked even when the ledger write fails"
    );

    p.broker.shutdown();
}

#[tokio::test]
async fn undecodable_payload_is_acked_but_not_counted() {
    let p = pipeline();

    p.broker
        .publish(
            topology::ORDER_EXCHANGE,
            topology::DELIVERED_ORDERS_QUEUE,
            "not json at all".to_string(),
        )
        .await
        .unwrap();
    // A well-formed event after the poison message proves the worker
    // kept going.
    p.dispatch.submit(delivered_event("QR-33333333")).await.unwrap();

    assert!(wait_until(|| p.stats.snapshot().delivered.processed == 1).await);
    assert_eq!(p.store.event_count(), 1);
    assert!(
        wait_until(|| p.broker.queue_depth(topology::DELIVERED_ORDERS_QUEUE) == Some(0)).await,
        "poison message must still be acked"
    );
    // The discarded delivery never reached the processed counter.
    assert_eq!(p.stats.snapshot().delivered.processed, 1);

    p.broker.shutdown();
}

#[tokio::test]
async fn each_event_type_routes_to_its_own_group() {
    let p = pipeline();

    p.dispatch.submit(delivered_event("QR-11111111")).await.unwrap();
    p.dispatch
        .submit(OrderEvent::Cancelled(shared::events::OrderCancelledEvent {
            order_number: "QR-22222222".to_string(),
            reason: "customer request".to_string(),
            cancelled_at: now_naive(),
        }))
        .await
        .unwrap();

    assert!(wait_until(|| p.store.event_count() == 2).await);
    let snapshot = p.stats.snapshot();
    assert_eq!(snapshot.delivered.processed, 1);
    assert_eq!(snapshot.cancelled.processed, 1);
    assert_eq!(snapshot.errors.processed, 0);

    p.broker.shutdown();
}
