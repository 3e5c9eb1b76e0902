//! Order domain events - immutable facts announced over the broker
//!
//! The JSON field names and shapes below are the broker wire contract and
//! must stay stable for interoperability with existing consumers:
//!
//! - created:   `{orderNumber, username, totalPrice, createdAt}`
//! - delivered: `{orderNumber, deliveryPerson, deliveredAt}`
//! - cancelled: `{orderNumber, reason, cancelledAt}`
//! - error:     `{orderNumber, errorMessage, occurredAt}`

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type enumeration, one per broker queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderCreated,
    OrderDelivered,
    OrderCancelled,
    OrderError,
}

impl OrderEventType {
    /// Ledger type tag, as stored in the `order_events.event_type` column
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::OrderCreated => "ORDER_CREATED",
            Self::OrderDelivered => "ORDER_DELIVERED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::OrderError => "ORDER_ERROR",
        }
    }

    /// Processing time above this threshold counts as slow (observability only)
    pub fn slow_threshold_ms(&self) -> u64 {
        match self {
            Self::OrderCreated => 100,
            _ => 50,
        }
    }

    pub fn all() -> [OrderEventType; 4] {
        [
            Self::OrderCreated,
            Self::OrderDelivered,
            Self::OrderCancelled,
            Self::OrderError,
        ]
    }
}

impl fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Published when an order row and its outbox ledger row commit together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    pub order_number: String,
    pub username: String,
    pub total_price: Decimal,
    pub created_at: NaiveDateTime,
}

/// Announced by upstream delivery systems; consumed into the ledger only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeliveredEvent {
    pub order_number: String,
    pub delivery_person: String,
    pub delivered_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelledEvent {
    pub order_number: String,
    pub reason: String,
    pub cancelled_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderErrorEvent {
    pub order_number: String,
    pub error_message: String,
    pub occurred_at: NaiveDateTime,
}

/// Unified event value for the publish path
///
/// Each variant serializes to its own wire shape (no outer tag); consumers
/// know the concrete type from the queue the message arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Created(OrderCreatedEvent),
    Delivered(OrderDeliveredEvent),
    Cancelled(OrderCancelledEvent),
    Error(OrderErrorEvent),
}

impl OrderEvent {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            Self::Created(_) => OrderEventType::OrderCreated,
            Self::Delivered(_) => OrderEventType::OrderDelivered,
            Self::Cancelled(_) => OrderEventType::OrderCancelled,
            Self::Error(_) => OrderEventType::OrderError,
        }
    }

    pub fn order_number(&self) -> &str {
        match self {
            Self::Created(e) => &e.order_number,
            Self::Delivered(e) => &e.order_number,
            Self::Cancelled(e) => &e.order_number,
            Self::Error(e) => &e.order_number,
        }
    }

    /// Serialize the variant payload to its wire JSON
    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Created(e) => serde_json::to_string(e),
            Self::Delivered(e) => serde_json::to_string(e),
            Self::Cancelled(e) => serde_json::to_string(e),
            Self::Error(e) => serde_json::to_string(e),
        }
    }
}
