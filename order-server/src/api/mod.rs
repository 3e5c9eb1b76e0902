//! HTTP surface

mod health;
mod orders;
mod stats;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/orders", post(orders::create_order).get(orders::list_orders))
        .route(
            "/api/orders/{id}",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/api/orders/{id}/status", put(orders::update_status))
        .route("/api/orders/events/stats", get(stats::event_stats))
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
