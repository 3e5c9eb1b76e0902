//! Outbound dispatch pool
//!
//! Bounded worker pool that decouples the committing request thread from
//! broker publish latency. Core workers drain a bounded work queue; when the
//! queue is full, overflow workers are spawned up to a maximum; at the
//! maximum, the publish runs synchronously on the submitting task
//! (caller-runs back-pressure: trades latency for a guaranteed attempt,
//! never silently drops).
//!
//! Publisher confirms are observed and logged only - a failed or unrouted
//! publish is not retried. The event remains durable in the outbox ledger.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared::events::OrderEvent;

use crate::broker::{Broker, Confirm, topology};

/// Dispatch pool sizing
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub core_workers: usize,
    pub max_workers: usize,
    pub queue_capacity: usize,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("dispatch pool is shut down")]
    Shutdown,
}

struct PoolInner {
    broker: Arc<Broker>,
    queue_rx: Mutex<mpsc::Receiver<OrderEvent>>,
    worker_count: AtomicUsize,
    max_workers: usize,
    shutdown: CancellationToken,
}

impl PoolInner {
    /// One unit of work: serialize and publish, observe the confirm
    async fn publish(&self, event: OrderEvent) {
        let order_number = event.order_number().to_string();
        let event_type = event.event_type();
        let routing_key = topology::queue_for(event_type);

        let body = match event.payload_json() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(%order_number, %event_type, error = %e, "Failed to serialize event");
                return;
            }
        };

        match self
            .broker
            .publish(topology::ORDER_EXCHANGE, routing_key, body)
            .await
        {
            Ok(Confirm::Routed) => {
                tracing::debug!(%order_number, %event_type, routing_key, "Event published");
            }
            Ok(Confirm::Unrouted) => {
                tracing::error!(%order_number, %event_type, routing_key, "Message rejected by broker: unrouted");
            }
            Err(e) => {
                tracing::error!(%order_number, %event_type, error = %e, "Failed to publish event");
            }
        }
    }

    /// Pop one queued event. After shutdown, keeps draining until the queue
    /// is empty so outstanding work is flushed within the grace period.
    async fn next_event(&self) -> Option<OrderEvent> {
        let mut rx = self.queue_rx.lock().await;
        if self.shutdown.is_cancelled() {
            return rx.try_recv().ok();
        }
        tokio::select! {
            _ = self.shutdown.cancelled() => rx.try_recv().ok(),
            event = rx.recv() => event,
        }
    }
}

/// Bounded worker pool for outbound event publishes
pub struct DispatchPool {
    tx: mpsc::Sender<OrderEvent>,
    inner: Arc<PoolInner>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl DispatchPool {
    pub fn new(broker: Arc<Broker>, config: DispatchConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let inner = Arc::new(PoolInner {
            broker,
            queue_rx: Mutex::new(rx),
            worker_count: AtomicUsize::new(config.core_workers),
            max_workers: config.max_workers.max(config.core_workers),
            shutdown: CancellationToken::new(),
        });

        let mut handles = Vec::with_capacity(config.core_workers);
        for _ in 0..config.core_workers {
            let inner = inner.clone();
            handles.push(tokio::spawn(async move {
                while let Some(event) = inner.next_event().await {
                    inner.publish(event).await;
                }
            }));
        }

        tracing::info!(
            core = config.core_workers,
            max = config.max_workers,
            queue = config.queue_capacity,
            "Dispatch pool started"
        );

        Self {
            tx,
            inner,
            handles: std::sync::Mutex::new(handles),
        }
    }

    /// Hand an event to the pool.
    ///
    /// Never blocks on a full queue: overflow spawns an extra worker up to
    /// the maximum, beyond which the publish executes on the calling task.
    pub async fn submit(&self, event: OrderEvent) -> Result<(), SubmitError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(SubmitError::Shutdown);
        }

        let event = match self.tx.try_send(event) {
            Ok(()) => return Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => return Err(SubmitError::Shutdown),
            Err(mpsc::error::TrySendError::Full(event)) => event,
        };

        // Queue full: reserve an overflow worker slot if below the maximum.
        let reserved = self
            .inner
            .worker_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.inner.max_workers).then_some(n + 1)
            })
            .is_ok();

        if reserved {
            let inner = self.inner.clone();
            let handle = tokio::spawn(async move {
                inner.publish(event).await;
                // Keep helping until the backlog is gone.
                loop {
                    let next = inner.queue_rx.lock().await.try_recv().ok();
                    match next {
                        Some(event) => inner.publish(event).await,
                        None => break,
                    }
                }
                inner.worker_count.fetch_sub(1, Ordering::SeqCst);
            });
            self.handles
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(handle);
            return Ok(());
        }

        // At maximum size with a full queue: caller-runs policy.
        tracing::warn!(
            order_number = event.order_number(),
            "Dispatch pool saturated, publishing on caller"
        );
        self.inner.publish(event).await;
        Ok(())
    }

    /// Stop accepting work and drain the queue for up to `grace`; whatever
    /// remains after the deadline is abandoned.
    pub async fn shutdown(&self, grace: Duration) {
        self.inner.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self
                .handles
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        );
        let drain = futures::future::join_all(handles);
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!(grace_secs = grace.as_secs(), "Dispatch drain exceeded grace period");
        } else {
            tracing::info!("Dispatch pool drained");
        }
    }
}
