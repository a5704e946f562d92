// Repository trait for sensor reading access
use crate::domain::reading::{Quantity, Reading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Most recent reading for a quantity, `None` if the sensor has no data
    async fn fetch_latest(&self, quantity: Quantity) -> anyhow::Result<Option<Reading>>;

    /// Readings between `start` and `end`, oldest first
    async fn fetch_range(
        &self,
        quantity: Quantity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Reading>>;
}
