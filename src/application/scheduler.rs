// Background timers: reading poll and expired-alert sweep
use crate::application::monitor_service::MonitorHandle;
use crate::application::reading_source::ReadingSource;
use crate::domain::error::MonitorError;
use crate::domain::reading::Quantity;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fetch the latest reading of every quantity and hand it to each plant on that device.
///
/// Returns the number of alerts created.
pub async fn poll_once(
    handle: &MonitorHandle,
    source: &dyn ReadingSource,
) -> Result<usize, MonitorError> {
    let mut created = 0;

    for quantity in Quantity::ALL {
        let reading = match source.fetch_latest(quantity).await {
            Ok(Some(reading)) => reading,
            Ok(None) => {
                tracing::debug!("No {} reading available", quantity);
                continue;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch latest {} reading: {:#}", quantity, e);
                continue;
            }
        };

        let plant_ids: Vec<String> = handle
            .plants_for_device(&reading.device_id)
            .map(|p| p.id.clone())
            .collect();
        if plant_ids.is_empty() {
            tracing::debug!("No plant watches device {}", reading.device_id);
        }

        for plant_id in plant_ids {
            match handle.ingest_reading(&plant_id, quantity, reading.clone()).await {
                Ok(Some(_)) => created += 1,
                Ok(None) => {}
                Err(MonitorError::Unavailable) => return Err(MonitorError::Unavailable),
                Err(e) => tracing::error!("Failed to ingest reading for {}: {}", plant_id, e),
            }
        }
    }

    Ok(created)
}

/// Poll on a fixed interval until the monitor stops or the task is aborted
pub fn spawn_poller(
    handle: MonitorHandle,
    source: Arc<dyn ReadingSource>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = poll_once(&handle, source.as_ref()).await {
                tracing::info!("Reading poller stopping: {}", e);
                break;
            }
        }
    })
}

/// Sweep expired alerts on a fixed interval until the monitor stops or the task is aborted
pub fn spawn_sweeper(handle: MonitorHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match handle.sweep(Utc::now()).await {
                Ok(removed) => tracing::debug!("Sweep removed {} alerts", removed),
                Err(e) => {
                    tracing::info!("Alert sweeper stopping: {}", e);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::alert_factory::AlertFactory;
    use crate::application::monitor_service::PlantMonitor;
    use crate::domain::plant::{Plant, PlantThresholds};
    use crate::domain::reading::Reading;
    use crate::infrastructure::memory_store::MemoryStore;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::HashMap;

    /// Serves a fixed latest value per quantity
    struct FixedSource {
        latest: HashMap<Quantity, f64>,
    }

    #[async_trait]
    impl ReadingSource for FixedSource {
        async fn fetch_latest(&self, quantity: Quantity) -> anyhow::Result<Option<Reading>> {
            match quantity {
                Quantity::Ph => anyhow::bail!("pH probe offline"),
                Quantity::Temperature => Ok(self.latest.get(&quantity).map(|value| {
                    Reading::new(Utc::now(), *value, "sensor_001".to_string(), String::new())
                })),
            }
        }

        async fn fetch_range(
            &self,
            _quantity: Quantity,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> anyhow::Result<Vec<Reading>> {
            Ok(Vec::new())
        }
    }

    fn plant(id: &str, device_id: &str) -> Plant {
        Plant {
            id: id.to_string(),
            name: id.to_string(),
            species: String::new(),
            location: String::new(),
            device_id: device_id.to_string(),
            thresholds: PlantThresholds::default(),
        }
    }

    fn start() -> MonitorHandle {
        let (monitor, handle) = PlantMonitor::new(
            vec![
                plant("basil", "sensor_001"),
                plant("mint", "sensor_001"),
                plant("fern", "sensor_002"),
            ],
            Arc::new(MemoryStore::new()),
            AlertFactory::default(),
            chrono::Duration::hours(24),
        );
        monitor.spawn();
        handle
    }

    #[tokio::test]
    async fn test_poll_once_dispatches_by_device() {
        let handle = start();
        let source = FixedSource {
            latest: HashMap::from([(Quantity::Temperature, 35.0)]),
        };

        // pH fetch fails and is skipped; both plants on sensor_001 get an alert
        assert_eq!(poll_once(&handle, &source).await, Ok(2));
        assert_eq!(poll_once(&handle, &source).await, Ok(0));

        assert_eq!(handle.alerts("basil").await.unwrap().len(), 1);
        assert_eq!(handle.alerts("mint").await.unwrap().len(), 1);
        assert!(handle.alerts("fern").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poller_and_sweeper_are_independent() {
        let handle = start();
        let source: Arc<dyn ReadingSource> = Arc::new(FixedSource {
            latest: HashMap::from([(Quantity::Temperature, 10.0)]),
        });

        let sweeper = spawn_sweeper(handle.clone(), Duration::from_millis(10));
        let poller = spawn_poller(handle.clone(), source, Duration::from_millis(10));

        sweeper.abort();
        assert!(sweeper.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!poller.is_finished());
        assert_eq!(handle.alerts("basil").await.unwrap().len(), 1);

        poller.abort();
    }
}
