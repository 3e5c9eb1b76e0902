//! HTTP-surface tests against the full router over the in-memory store:
//! rejected requests must leave both tables untouched.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use shared::models::TaskInfo;

use order_server::broker::{Broker, topology};
use order_server::dispatch::{DispatchConfig, DispatchPool};
use order_server::orders::OrderService;
use order_server::pricing::{PricingError, PricingLookup};
use order_server::state::AppState;
use order_server::stats::EventStats;
use order_server::store::MemoryOrderStore;
use order_server::api;

struct StubPricing;

#[async_trait]
impl PricingLookup for StubPricing {
    async fn task_info(&self, _task_id: i64) -> Result<Option<TaskInfo>, PricingError> {
        Ok(Some(TaskInfo {
            id: 1,
            name: "City Delivery".into(),
            description: None,
            base_fee: dec!(10.00),
            per_km_rate: dec!(2.00),
            active: true,
        }))
    }
}

fn test_app() -> (Router, Arc<MemoryOrderStore>) {
    let broker = Arc::new(Broker::new(64));
    topology::declare(&broker);
    let dispatch = Arc::new(DispatchPool::new(
        broker,
        DispatchConfig {
            core_workers: 1,
            max_workers: 2,
            queue_capacity: 16,
        },
    ));
    let store = Arc::new(MemoryOrderStore::new());
    let orders = Arc::new(OrderService::new(
        store.clone(),
        Arc::new(StubPricing),
        dispatch,
        false,
    ));
    let state = AppState {
        store: store.clone(),
        orders,
        stats: Arc::new(EventStats::new()),
    };
    (api::create_router(state), store)
}

fn order_body() -> Value {
    json!({
        "username": "alice",
        "customerName": "Alice A",
        "customerEmail": "alice@example.com",
        "customerPhone": "5550001111",
        "deliveryAddressLine1": "1 Main St",
        "deliveryAddressCity": "Springfield",
        "deliveryAddressState": "SP",
        "deliveryAddressZipCode": "10001",
        "deliveryAddressCountry": "US",
        "taskId": 1,
        "distanceKm": 5.0
    })
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn create_order_returns_201_with_location() {
    let (app, store) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&order_body()).unwrap()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(location, format!("/api/orders/{}", json["orderNumber"].as_str().unwrap()));
    assert_eq!(json["totalPrice"], 20.0);
    assert_eq!(json["status"], "CREATED");
    assert_eq!(store.order_count(), 1);
    assert_eq!(store.event_count(), 1);
}

#[tokio::test]
async fn invalid_email_is_rejected_before_any_write() {
    let (app, store) = test_app();

    let mut body = order_body();
    body["customerEmail"] = json!("not-an-email");
    let (status, json) = post_json(app, "/api/orders", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("customer_email"));
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn negative_distance_is_rejected_before_any_write() {
    let (app, store) = test_app();

    let mut body = order_body();
    body["distanceKm"] = json!(-1.0);
    let (status, _) = post_json(app, "/api/orders", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn unknown_order_id_returns_404() {
    let (app, _) = test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/api/orders/999")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
