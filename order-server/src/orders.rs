//! Order creation workflow.
//!
//! The write path: resolve pricing, compute the total, assign the order
//! number, then persist the order row together with its ORDER_CREATED
//! ledger row in one transaction. Only after that transaction commits is
//! the event handed to the dispatch pool; a rollback publishes nothing.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use shared::error::{AppError, ErrorCode};
use shared::events::{OrderCreatedEvent, OrderEvent, OrderEventType};
use shared::models::order::status;
use shared::models::{CreateOrderRequest, CreateOrderResponse, TaskInfo};
use shared::util;

use crate::dispatch::DispatchPool;
use crate::pricing::{self, PricingLookup};
use crate::store::{AfterCommit, NewLedgerRecord, NewOrder, OrderStore};

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    pricing: Arc<dyn PricingLookup>,
    publisher: Arc<DispatchPool>,
    degraded_mode: bool,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        pricing: Arc<dyn PricingLookup>,
        publisher: Arc<DispatchPool>,
        degraded_mode: bool,
    ) -> Self {
        Self {
            store,
            pricing,
            publisher,
            degraded_mode,
        }
    }

    pub async fn create_order(
        &self,
        req: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, AppError> {
        let task = self.resolve_task(req.task_id).await?;
        let distance = Decimal::from_f64(req.distance_km)
            .ok_or_else(|| AppError::validation("distanceKm is not a finite number"))?;
        let total_price = pricing::calculate_total(&task, distance);

        // Business key exists before the first durable write.
        let order_number = util::order_number();
        let created_at = util::now_naive();

        let event = OrderCreatedEvent {
            order_number: order_number.clone(),
            username: req.username.clone(),
            total_price,
            created_at,
        };
        let payload = serde_json::to_string(&event)
            .map_err(|e| AppError::internal(format!("event serialization failed: {e}")))?;

        let order = NewOrder {
            order_number: order_number.clone(),
            username: req.username.clone(),
            customer_name: req.customer_name.clone(),
            customer_email: req.customer_email.clone(),
            customer_phone: req.customer_phone.clone(),
            delivery_address_line1: req.delivery_address_line1.clone(),
            delivery_address_line2: req.delivery_address_line2.clone(),
            delivery_address_city: req.delivery_address_city.clone(),
            delivery_address_state: req.delivery_address_state.clone(),
            delivery_address_zip_code: req.delivery_address_zip_code.clone(),
            delivery_address_country: req.delivery_address_country.clone(),
            status: status::CREATED.to_string(),
            comments: Some(format!("taskId={}", req.task_id)),
            total_price,
        };
        let record = NewLedgerRecord {
            order_number: order_number.clone(),
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: OrderEventType::OrderCreated.as_tag().to_string(),
            payload,
        };

        let publisher = self.publisher.clone();
        let after_commit: AfterCommit = Box::new(move |saved| {
            Box::pin(async move {
                tracing::info!(
                    order_number = %saved.order_number,
                    "Order committed, handing created event to dispatch pool"
                );
                let event = OrderEvent::Created(OrderCreatedEvent {
                    order_number: saved.order_number.clone(),
                    username: saved.username,
                    total_price: saved.total_price,
                    created_at: saved.created_at,
                });
                if let Err(e) = publisher.submit(event).await {
                    // Ledger row stays behind as the durable trace.
                    tracing::error!(
                        order_number = %saved.order_number,
                        error = %e,
                        "Dispatch submission failed, event not published"
                    );
                }
            })
        });

        let saved = self
            .store
            .create_order(order, record, after_commit)
            .await
            .map_err(|e| {
                tracing::error!(order_number = %order_number, error = %e, "Order create failed");
                AppError::database(e.to_string())
            })?;

        Ok(CreateOrderResponse {
            order_number: saved.order_number,
            total_price: saved.total_price,
            status: saved.status,
        })
    }

    async fn resolve_task(&self, task_id: i64) -> Result<TaskInfo, AppError> {
        match self.pricing.task_info(task_id).await {
            Ok(Some(task)) => Ok(task),
            Ok(None) => {
                if self.degraded_mode {
                    tracing::warn!(task_id, "Task not found, using default pricing");
                    Ok(pricing::default_task())
                } else {
                    Err(
                        AppError::with_message(ErrorCode::TaskNotFound, "Task not found")
                            .with_detail("taskId", task_id),
                    )
                }
            }
            Err(e) => {
                if self.degraded_mode {
                    tracing::warn!(task_id, error = %e, "Task service unreachable, using default pricing");
                    Ok(pricing::default_task())
                } else {
                    Err(AppError::pricing_unavailable(e.to_string()))
                }
            }
        }
    }
}
