//! In-process message broker
//!
//! # Architecture
//!
//! ```text
//! publisher ──▶ Exchange (direct) ──▶ bindings (routing key, exact match)
//!                                        │
//!                              ┌─────────┼─────────┐
//!                              ▼         ▼         ▼
//!                        bounded mpsc queues (one per declared queue)
//!                              │
//!                        QueueConsumer (shared receiver, prefetch semaphore)
//! ```
//!
//! Queues are bounded tokio channels: a full queue back-pressures the
//! publisher instead of dropping. A consumer's prefetch semaphore bounds
//! in-flight unacknowledged deliveries; acknowledging (or dropping) a
//! [`Delivery`] releases the slot. The in-process transport does not
//! redeliver unacked messages.

pub mod topology;

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

/// Errors surfaced to publishers
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("exchange not found: {0}")]
    ExchangeNotFound(String),
    #[error("broker is shut down")]
    Shutdown,
}

/// Publisher confirm: did the broker route the message to at least one queue?
///
/// Confirm failures are observed by the caller (logged/counted), never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Routed,
    Unrouted,
}

struct QueuedMessage {
    routing_key: String,
    body: String,
}

struct Queue {
    name: String,
    tx: mpsc::Sender<QueuedMessage>,
    rx: Arc<Mutex<mpsc::Receiver<QueuedMessage>>>,
    capacity: usize,
}

struct Exchange {
    /// routing key -> bound queue names (exact match, no patterns)
    bindings: DashMap<String, Vec<String>>,
}

/// Message broker - named exchanges, bounded queues, exact-match bindings
pub struct Broker {
    exchanges: DashMap<String, Arc<Exchange>>,
    queues: DashMap<String, Arc<Queue>>,
    queue_capacity: usize,
    shutdown: CancellationToken,
}

impl Broker {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            exchanges: DashMap::new(),
            queues: DashMap::new(),
            queue_capacity,
            shutdown: CancellationToken::new(),
        }
    }

    /// Declare an exchange (idempotent). The durable flag is part of the
    /// topology contract; the in-process transport keeps nothing across
    /// restarts.
    pub fn declare_exchange(&self, name: &str, durable: bool) {
        self.exchanges.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(exchange = name, durable, "Declared exchange (direct)");
            Arc::new(Exchange {
                bindings: DashMap::new(),
            })
        });
    }

    /// Declare a queue (idempotent)
    pub fn declare_queue(&self, name: &str, durable: bool) {
        self.queues.entry(name.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::channel(self.queue_capacity);
            tracing::info!(queue = name, durable, "Declared queue");
            Arc::new(Queue {
                name: name.to_string(),
                tx,
                rx: Arc::new(Mutex::new(rx)),
                capacity: self.queue_capacity,
            })
        });
    }

    /// Bind a queue to an exchange under a routing key
    pub fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        let ex = self
            .exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(exchange.to_string()))?;
        let mut bound = ex.bindings.entry(routing_key.to_string()).or_default();
        if !bound.iter().any(|q| q == queue) {
            bound.push(queue.to_string());
            tracing::info!(
                queue,
                exchange,
                routing_key,
                "Bound queue to exchange"
            );
        }
        Ok(())
    }

    /// Publish a message to an exchange under a routing key.
    ///
    /// Blocks (back-pressure) while every bound queue is full. A routing key
    /// with no binding yields [`Confirm::Unrouted`], not an error.
    pub async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: String,
    ) -> Result<Confirm, BrokerError> {
        if self.shutdown.is_cancelled() {
            return Err(BrokerError::Shutdown);
        }
        let ex = self
            .exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(exchange.to_string()))?
            .clone();

        let Some(bound) = ex.bindings.get(routing_key).map(|b| b.clone()) else {
            tracing::warn!(exchange, routing_key, "No binding for routing key");
            return Ok(Confirm::Unrouted);
        };

        let mut delivered = 0usize;
        for queue_name in &bound {
            // Bound queue may not be declared yet; tolerated, not fatal.
            let Some(queue) = self.queues.get(queue_name).map(|q| q.clone()) else {
                tracing::warn!(queue = %queue_name, "Bound queue missing, skipping");
                continue;
            };
            let msg = QueuedMessage {
                routing_key: routing_key.to_string(),
                body: body.clone(),
            };
            match queue.tx.send(msg).await {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::warn!(queue = %queue.name, "Queue closed, message not enqueued");
                }
            }
        }

        Ok(if delivered > 0 {
            Confirm::Routed
        } else {
            Confirm::Unrouted
        })
    }

    /// Create a consumer for a queue with a prefetch limit.
    ///
    /// Returns `None` when the queue has not been declared - callers treat
    /// this as a warning so the consumer side can come up independently of
    /// topology provisioning order.
    pub fn consumer(&self, queue: &str, prefetch: usize) -> Option<QueueConsumer> {
        let q = self.queues.get(queue)?;
        Some(QueueConsumer {
            queue: q.name.clone(),
            rx: q.rx.clone(),
            prefetch: Arc::new(Semaphore::new(prefetch)),
            shutdown: self.shutdown.child_token(),
        })
    }

    /// Number of messages currently sitting in a queue
    pub fn queue_depth(&self, queue: &str) -> Option<usize> {
        self.queues
            .get(queue)
            .map(|q| q.capacity - q.tx.capacity())
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Stop publishers and wake consumers blocked on empty queues
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// One consumer handle per worker; clones share the queue receiver and the
/// prefetch budget
#[derive(Clone)]
pub struct QueueConsumer {
    queue: String,
    rx: Arc<Mutex<mpsc::Receiver<QueuedMessage>>>,
    prefetch: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl QueueConsumer {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Receive the next delivery, waiting for a prefetch slot first.
    ///
    /// Returns `None` on broker shutdown.
    pub async fn next(&self) -> Option<Delivery> {
        let permit = tokio::select! {
            _ = self.shutdown.cancelled() => return None,
            permit = self.prefetch.clone().acquire_owned() => permit.ok()?,
        };

        let mut rx = self.rx.lock().await;
        tokio::select! {
            _ = self.shutdown.cancelled() => None,
            msg = rx.recv() => msg.map(|m| Delivery {
                routing_key: m.routing_key,
                body: m.body,
                _permit: permit,
            }),
        }
    }
}

/// A received message holding one prefetch slot until acknowledged
pub struct Delivery {
    pub routing_key: String,
    pub body: String,
    _permit: OwnedSemaphorePermit,
}

impl Delivery {
    /// Acknowledge the delivery, releasing its prefetch slot
    pub fn ack(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn broker_with_queue(queue: &str, key: &str) -> Broker {
        let broker = Broker::new(16);
        broker.declare_exchange("x", true);
        broker.declare_queue(queue, true);
        broker.bind_queue(queue, "x", key).unwrap();
        broker
    }

    #[tokio::test]
    async fn publish_routes_on_exact_key_match() {
        let broker = broker_with_queue("q1", "q1");

        let confirm = broker.publish("x", "q1", "hello".into()).await.unwrap();
        assert_eq!(confirm, Confirm::Routed);

        let consumer = broker.consumer("q1", 10).unwrap();
        let delivery = consumer.next().await.unwrap();
        assert_eq!(delivery.routing_key, "q1");
        assert_eq!(delivery.body, "hello");
        delivery.ack();
    }

    #[tokio::test]
    async fn unbound_routing_key_is_unrouted_not_an_error() {
        let broker = broker_with_queue("q1", "q1");
        let confirm = broker.publish("x", "other", "lost".into()).await.unwrap();
        assert_eq!(confirm, Confirm::Unrouted);
    }

    #[tokio::test]
    async fn missing_exchange_is_an_error() {
        let broker = Broker::new(16);
        let err = broker.publish("nope", "k", "m".into()).await.unwrap_err();
        assert!(matches!(err, BrokerError::ExchangeNotFound(_)));
    }

    #[tokio::test]
    async fn consumer_on_undeclared_queue_is_none() {
        let broker = Broker::new(16);
        assert!(broker.consumer("ghost", 10).is_none());
    }

    #[tokio::test]
    async fn prefetch_bounds_unacked_deliveries() {
        let broker = broker_with_queue("q1", "q1");
        broker.publish("x", "q1", "m1".into()).await.unwrap();
        broker.publish("x", "q1", "m2".into()).await.unwrap();

        let consumer = broker.consumer("q1", 1).unwrap();
        let first = consumer.next().await.unwrap();

        // One unacked delivery exhausts the prefetch budget.
        let blocked = timeout(Duration::from_millis(50), consumer.next()).await;
        assert!(blocked.is_err());

        first.ack();
        let second = timeout(Duration::from_millis(200), consumer.next())
            .await
            .expect("slot freed after ack")
            .unwrap();
        assert_eq!(second.body, "m2");
    }

    #[tokio::test]
    async fn shutdown_wakes_idle_consumers() {
        let broker = broker_with_queue("q1", "q1");
        let consumer = broker.consumer("q1", 10).unwrap();
        broker.shutdown();
        assert!(consumer.next().await.is_none());
    }

    #[tokio::test]
    async fn queue_depth_tracks_backlog() {
        let broker = broker_with_queue("q1", "q1");
        assert_eq!(broker.queue_depth("q1"), Some(0));
        broker.publish("x", "q1", "m".into()).await.unwrap();
        broker.publish("x", "q1", "m".into()).await.unwrap();
        assert_eq!(broker.queue_depth("q1"), Some(2));
    }
}
