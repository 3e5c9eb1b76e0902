//! Shared types for the QuickRun order platform
//!
//! Common types used by the order-server and its clients: the unified
//! error system, domain event wire types, order/task models, and small
//! utilities.

pub mod error;
pub mod events;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use events::{OrderEvent, OrderEventType};
