use std::sync::Arc;

use crate::orders::OrderService;
use crate::stats::EventStats;
use crate::store::OrderStore;

/// Shared handles for API handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub orders: Arc<OrderService>,
    pub stats: Arc<EventStats>,
}
