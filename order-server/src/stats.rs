//! Consumer throughput/latency statistics
//!
//! Lock-free atomic counters on the hot path; reads are point-in-time
//! snapshots with no cross-field consistency guarantee (observability only,
//! never correctness decisions).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use shared::events::OrderEventType;

#[derive(Debug, Default)]
struct TypeCounters {
    /// Cumulative processed count
    processed: AtomicU64,
    /// Events seen in the current sampling second (reset each tick)
    current_rate: AtomicU64,
    /// Rate captured at the last tick
    last_rate: AtomicU64,
    /// Cumulative processing latency in milliseconds
    total_latency_ms: AtomicU64,
    /// Events whose processing exceeded the slow threshold
    slow: AtomicU64,
}

impl TypeCounters {
    fn snapshot(&self) -> TypeStats {
        let processed = self.processed.load(Ordering::Relaxed);
        let total_latency_ms = self.total_latency_ms.load(Ordering::Relaxed);
        TypeStats {
            processed,
            rate_per_sec: self.last_rate.load(Ordering::Relaxed),
            total_latency_ms,
            avg_latency_ms: if processed > 0 {
                total_latency_ms / processed
            } else {
                0
            },
            slow_count: self.slow.load(Ordering::Relaxed),
        }
    }
}

/// Per-event-type statistics aggregator
#[derive(Debug, Default)]
pub struct EventStats {
    created: TypeCounters,
    delivered: TypeCounters,
    cancelled: TypeCounters,
    errors: TypeCounters,
}

impl EventStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, event_type: OrderEventType) -> &TypeCounters {
        match event_type {
            OrderEventType::OrderCreated => &self.created,
            OrderEventType::OrderDelivered => &self.delivered,
            OrderEventType::OrderCancelled => &self.cancelled,
            OrderEventType::OrderError => &self.errors,
        }
    }

    /// Record one processed event and its latency
    pub fn record(&self, event_type: OrderEventType, latency: Duration) {
        let c = self.counters(event_type);
        let latency_ms = latency.as_millis() as u64;

        c.processed.fetch_add(1, Ordering::Relaxed);
        c.current_rate.fetch_add(1, Ordering::Relaxed);
        c.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if latency_ms > event_type.slow_threshold_ms() {
            c.slow.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                event_type = %event_type,
                latency_ms,
                "Slow event processing"
            );
        }
    }

    /// Point-in-time snapshot for the stats endpoint
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            created: self.created.snapshot(),
            delivered: self.delivered.snapshot(),
            cancelled: self.cancelled.snapshot(),
            errors: self.errors.snapshot(),
        }
    }

    /// Capture and reset the per-second rates; called by the sampler tick
    fn sample_rates(&self) -> [u64; 4] {
        [
            &self.created,
            &self.delivered,
            &self.cancelled,
            &self.errors,
        ]
        .map(|c| {
            let rate = c.current_rate.swap(0, Ordering::Relaxed);
            c.last_rate.store(rate, Ordering::Relaxed);
            rate
        })
    }
}

/// Per-type snapshot fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    pub processed: u64,
    pub rate_per_sec: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: u64,
    pub slow_count: u64,
}

/// Snapshot returned by the stats endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub created: TypeStats,
    pub delivered: TypeStats,
    pub cancelled: TypeStats,
    pub errors: TypeStats,
}

/// Spawn the 1s sampling loop: swaps the current-second rates and logs a
/// throughput line whenever anything moved
pub fn spawn_sampler(stats: Arc<EventStats>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }
            let [created, delivered, cancelled, errors] = stats.sample_rates();
            if created + delivered + cancelled + errors > 0 {
                let snap = stats.snapshot();
                tracing::info!(
                    created_per_sec = created,
                    delivered_per_sec = delivered,
                    cancelled_per_sec = cancelled,
                    errors_per_sec = errors,
                    created_total = snap.created.processed,
                    created_avg_ms = snap.created.avg_latency_ms,
                    slow = snap.created.slow_count,
                    "Order event throughput"
                );
            }
        }
    });
}
