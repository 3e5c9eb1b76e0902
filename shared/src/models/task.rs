//! Pricing task model (consumed from the task-service)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Task info as returned by `GET {task-service}/api/tasks/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Fixed price component
    pub base_fee: Decimal,
    /// Price per kilometre of delivery distance
    pub per_km_rate: Decimal,
    #[serde(default)]
    pub active: bool,
}
