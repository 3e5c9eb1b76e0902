//! Broker topology for order events
//!
//! One durable direct exchange and four durable queues, each bound with a
//! routing key identical to its own name. These names are part of the wire
//! contract with external producers/consumers.

use shared::events::OrderEventType;

use super::Broker;

pub const ORDER_EXCHANGE: &str = "quickrun.order.exchange";
pub const NEW_ORDERS_QUEUE: &str = "quickrun.order.new";
pub const DELIVERED_ORDERS_QUEUE: &str = "quickrun.order.delivered";
pub const CANCELLED_ORDERS_QUEUE: &str = "quickrun.order.cancelled";
pub const ERROR_ORDERS_QUEUE: &str = "quickrun.order.error";

/// Destination queue (and routing key) for an event type
pub fn queue_for(event_type: OrderEventType) -> &'static str {
    match event_type {
        OrderEventType::OrderCreated => NEW_ORDERS_QUEUE,
        OrderEventType::OrderDelivered => DELIVERED_ORDERS_QUEUE,
        OrderEventType::OrderCancelled => CANCELLED_ORDERS_QUEUE,
        OrderEventType::OrderError => ERROR_ORDERS_QUEUE,
    }
}

/// Declare the exchange, the four queues, and their bindings (idempotent)
pub fn declare(broker: &Broker) {
    broker.declare_exchange(ORDER_EXCHANGE, true);
    for event_type in OrderEventType::all() {
        let queue = queue_for(event_type);
        broker.declare_queue(queue, true);
        // Binding can only fail if the exchange is missing; it was just declared.
        if let Err(e) = broker.bind_queue(queue, ORDER_EXCHANGE, queue) {
            tracing::warn!(queue, error = %e, "Failed to bind queue");
        }
    }
}
