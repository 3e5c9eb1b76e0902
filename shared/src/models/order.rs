//! Order models and API payloads

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Well-known order status values
///
/// The set is open: status is a plain string column mutated only through
/// the explicit status-update endpoint, never by consumed events.
pub mod status {
    pub const CREATED: &str = "CREATED";
    pub const DELIVERED: &str = "DELIVERED";
    pub const CANCELLED: &str = "CANCELLED";
    pub const ERROR: &str = "ERROR";
    /// Soft-delete marker; order rows are never physically deleted
    pub const DELETED: &str = "DELETED";
}

/// Order row (`orders` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Business key: globally unique, assigned once before the first
    /// durable write, immutable afterwards
    pub order_number: String,
    pub username: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address_line1: String,
    pub delivery_address_line2: Option<String>,
    pub delivery_address_city: String,
    pub delivery_address_state: String,
    pub delivery_address_zip_code: String,
    pub delivery_address_country: String,
    pub status: String,
    pub comments: Option<String>,
    pub total_price: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Ledger row (`order_events` table) - append-only, never updated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LedgerRecord {
    pub id: i64,
    /// Back-reference to the order by business key only; no FK, no cascade
    pub order_number: String,
    /// Unique per insertion - a redelivered event gets a fresh id
    pub event_id: String,
    pub event_type: String,
    pub payload: String,
    pub created_at: NaiveDateTime,
}

/// Create order request payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1))]
    pub customer_phone: String,
    #[validate(length(min = 1))]
    pub delivery_address_line1: String,
    pub delivery_address_line2: Option<String>,
    #[validate(length(min = 1))]
    pub delivery_address_city: String,
    #[validate(length(min = 1))]
    pub delivery_address_state: String,
    #[validate(length(min = 1))]
    pub delivery_address_zip_code: String,
    #[validate(length(min = 1))]
    pub delivery_address_country: String,
    pub task_id: i64,
    #[validate(range(min = 0.0))]
    pub distance_km: f64,
}

/// Create order response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_number: String,
    pub total_price: Decimal,
    pub status: String,
}

/// Order list/detail projection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub status: String,
    pub customer_name: String,
    pub total_price: Decimal,
    pub created_at: NaiveDateTime,
}

impl From<&Order> for OrderResponse {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number.clone(),
            status: o.status.clone(),
            customer_name: o.customer_name.clone(),
            total_price: o.total_price,
            created_at: o.created_at,
        }
    }
}

/// Status update payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

/// Page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateOrderRequest {
        CreateOrderRequest {
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
            task_id: 1,
            distance_km: 5.0,
        }
    }

    #[test]
    fn create_request_validates() {
        assert!(valid_request().validate().is_ok());

        let mut bad = valid_request();
        bad.distance_km = -1.0;
        assert!(bad.validate().is_err());

        let mut bad = valid_request();
        bad.customer_email = "not-an-email".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn create_request_uses_camel_case_wire_names() {
        let json = serde_json::to_value(valid_request()).unwrap();
        assert!(json.get("customerName").is_some());
        assert!(json.get("taskId").is_some());
        assert!(json.get("distanceKm").is_some());
    }
}
