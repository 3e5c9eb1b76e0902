//! Pricing coefficients and total calculation.
//!
//! Coefficients come from the task service over HTTP. When the service is
//! unreachable and degraded mode is enabled, the caller substitutes
//! [`default_task`] instead of failing the create.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use shared::models::TaskInfo;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("task service request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("task service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PricingLookup: Send + Sync {
    /// `Ok(None)` means the task does not exist; `Err` means the
    /// collaborator could not answer at all.
    async fn task_info(&self, task_id: i64) -> Result<Option<TaskInfo>, PricingError>;
}

pub struct HttpTaskClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskClient {
    pub fn new(base_url: String) -> Result<Self, PricingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl PricingLookup for HttpTaskClient {
    async fn task_info(&self, task_id: i64) -> Result<Option<TaskInfo>, PricingError> {
        let url = format!("{}/api/tasks/{}", self.base_url, task_id);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let task = resp.error_for_status()?.json::<TaskInfo>().await?;
        Ok(Some(task))
    }
}

/// Fixed coefficient pair used when the task service cannot be consulted
pub fn default_task() -> TaskInfo {
    TaskInfo {
        id: 1,
        name: "Default Delivery Task".to_string(),
        description: None,
        base_fee: Decimal::new(1000, 2),
        per_km_rate: Decimal::new(200, 2),
        active: true,
    }
}

/// baseFee + perKmRate * distanceKm, rounded half-up to two decimal places
pub fn calculate_total(task: &TaskInfo, distance_km: Decimal) -> Decimal {
    (task.base_fee + task.per_km_rate * distance_km)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
