//! Queue consumers.
//!
//! One group per order queue. Each delivery is decoded, appended to the
//! event ledger under a fresh event id, counted, and acknowledged. A
//! ledger write failure is logged but neither blocks the ack nor the
//! counter: the message flow must not stall on a persistence hiccup.
//! Consumers never touch the orders table.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use uuid::Uuid;

use shared::events::{
    OrderCancelledEvent, OrderCreatedEvent, OrderDeliveredEvent, OrderErrorEvent, OrderEventType,
};

use crate::broker::{Broker, Delivery, QueueConsumer, topology};
use crate::stats::EventStats;
use crate::store::{EventLedger, NewLedgerRecord};

#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    /// Workers started per queue
    pub concurrency: usize,
    /// Upper bound when backlog grows
    pub max_concurrency: usize,
    /// Unacked deliveries held per queue
    pub prefetch: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_concurrency: 10,
            prefetch: 10,
        }
    }
}

/// Start a consumer group for every order queue. A queue that was never
/// declared is logged and skipped; it does not prevent startup.
pub fn spawn_consumers(
    broker: &Arc<Broker>,
    ledger: Arc<dyn EventLedger>,
    stats: Arc<EventStats>,
    config: ConsumerConfig,
) {
    for event_type in OrderEventType::all() {
        spawn_group(broker, event_type, ledger.clone(), stats.clone(), config);
    }
}

fn spawn_group(
    broker: &Arc<Broker>,
    event_type: OrderEventType,
    ledger: Arc<dyn EventLedger>,
    stats: Arc<EventStats>,
    config: ConsumerConfig,
) {
    let queue = topology::queue_for(event_type);
    let Some(consumer) = broker.consumer(queue, config.prefetch) else {
        tracing::warn!(queue, "Queue not declared, consumer group not started");
        return;
    };

    let workers = Arc::new(AtomicUsize::new(0));
    for _ in 0..config.concurrency.max(1) {
        spawn_worker(consumer.clone(), event_type, ledger.clone(), stats.clone());
        workers.fetch_add(1, Ordering::Relaxed);
    }
    tracing::info!(
        queue,
        workers = config.concurrency.max(1),
        "Consumer group started"
    );

    // Backlog-driven scale-up toward max_concurrency. Workers are not
    // reaped; the group stays at its high-water mark.
    let broker = broker.clone();
    let shutdown = broker.shutdown_token().clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tick.tick() => {}
            }
            let Some(depth) = broker.queue_depth(queue) else {
                break;
            };
            let current = workers.load(Ordering::Relaxed);
            if depth > config.prefetch && current < config.max_concurrency {
                spawn_worker(consumer.clone(), event_type, ledger.clone(), stats.clone());
                workers.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(queue, depth, workers = current + 1, "Scaled consumer group up");
            }
        }
    });
}

fn spawn_worker(
    consumer: QueueConsumer,
    event_type: OrderEventType,
    ledger: Arc<dyn EventLedger>,
    stats: Arc<EventStats>,
) {
    tokio::spawn(async move {
        while let Some(delivery) = consumer.next().await {
            let started = Instant::now();
            // Discarded (undecodable) deliveries are acked but never counted
            // as processed; poison messages must not inflate throughput.
            if process(&delivery, event_type, ledger.as_ref()).await {
                stats.record(event_type, started.elapsed());
            }
            delivery.ack();
        }
    });
}

/// Returns whether the delivery counts as processed
async fn process(delivery: &Delivery, event_type: OrderEventType, ledger: &dyn EventLedger) -> bool {
    let order_number = match extract_order_number(event_type, &delivery.body) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(
                event_type = %event_type,
                error = %e,
                "Undecodable event payload, discarding"
            );
            return false;
        }
    };

    tracing::info!(event_type = %event_type, order_number = %order_number, "Event received");

    let record = NewLedgerRecord {
        order_number: order_number.clone(),
        event_id: Uuid::new_v4().to_string(),
        event_type: event_type.as_tag().to_string(),
        payload: delivery.body.clone(),
    };
    if let Err(e) = ledger.append(record).await {
        tracing::error!(
            event_type = %event_type,
            order_number = %order_number,
            error = %e,
            "Ledger append failed, event acknowledged anyway"
        );
    }
    true
}

fn extract_order_number(
    event_type: OrderEventType,
    body: &str,
) -> Result<String, serde_json::Error> {
    Ok(match event_type {
        OrderEventType::OrderCreated => {
            serde_json::from_str::<OrderCreatedEvent>(body)?.order_number
        }
        OrderEventType::OrderDelivered => {
            serde_json::from_str::<OrderDeliveredEvent>(body)?.order_number
        }
        OrderEventType::OrderCancelled => {
            serde_json::from_str::<OrderCancelledEvent>(body)?.order_number
        }
        OrderEventType::OrderError => serde_json::from_str::<OrderErrorEvent>(body)?.order_number,
    })
}
