// Plant monitor - Single task owning every alert store
use crate::application::alert_factory::AlertFactory;
use crate::application::alert_store::AlertStore;
use crate::application::key_value_store::KeyValueStore;
use crate::domain::alert::Alert;
use crate::domain::error::MonitorError;
use crate::domain::plant::Plant;
use crate::domain::reading::{Quantity, Reading, latest_reading};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const COMMAND_QUEUE_SIZE: usize = 100;

type Reply<T> = oneshot::Sender<Result<T, MonitorError>>;

enum Command {
    Ingest {
        plant_id: String,
        quantity: Quantity,
        reading: Reading,
        reply: Reply<Option<Alert>>,
    },
    Acknowledge {
        plant_id: String,
        alert_id: String,
        reply: Reply<bool>,
    },
    Dismiss {
        plant_id: String,
        alert_id: String,
        reply: Reply<bool>,
    },
    DismissAll {
        plant_id: String,
        reply: Reply<usize>,
    },
    Sweep {
        now: DateTime<Utc>,
        reply: Reply<usize>,
    },
    Snapshot {
        plant_id: String,
        reply: Reply<Vec<Alert>>,
    },
}

struct MonitoredPlant {
    plant: Plant,
    store: AlertStore,
}

/// Owns one [`AlertStore`] per plant and applies commands one at a time.
///
/// All mutations arrive through a single mpsc queue, so the stores are never
/// touched concurrently even when many [`MonitorHandle`]s exist.
pub struct PlantMonitor {
    plants: HashMap<String, MonitoredPlant>,
    factory: AlertFactory,
    retention: chrono::Duration,
    rx: mpsc::Receiver<Command>,
}

impl PlantMonitor {
    /// Rehydrate a store for every plant and return the monitor with its handle
    pub fn new(
        plants: Vec<Plant>,
        storage: Arc<dyn KeyValueStore>,
        factory: AlertFactory,
        retention: chrono::Duration,
    ) -> (Self, MonitorHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let handle = MonitorHandle {
            tx,
            plants: Arc::new(plants.clone()),
        };

        let plants = plants
            .into_iter()
            .map(|plant| {
                let store = AlertStore::open(plant.id.clone(), storage.clone());
                (plant.id.clone(), MonitoredPlant { plant, store })
            })
            .collect();

        let monitor = Self {
            plants,
            factory,
            retention,
            rx,
        };
        (monitor, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until every handle has been dropped
    pub async fn run(mut self) {
        tracing::info!("Alert monitor started for {} plants", self.plants.len());
        // Store mutations write to persistence synchronously
        let blocking_allowed = Handle::current().runtime_flavor() == RuntimeFlavor::MultiThread;
        while let Some(command) = self.rx.recv().await {
            if blocking_allowed {
                tokio::task::block_in_place(|| self.handle(command));
            } else {
                self.handle(command);
            }
        }
        tracing::info!("Alert monitor stopped");
    }

    fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller went away
        match command {
            Command::Ingest {
                plant_id,
                quantity,
                reading,
                reply,
            } => {
                let _ = reply.send(self.ingest(&plant_id, quantity, &reading));
            }
            Command::Acknowledge {
                plant_id,
                alert_id,
                reply,
            } => {
                let result = self.store_mut(&plant_id).map(|s| s.acknowledge(&alert_id));
                let _ = reply.send(result);
            }
            Command::Dismiss {
                plant_id,
                alert_id,
                reply,
            } => {
                let result = self.store_mut(&plant_id).map(|s| s.resolve(&alert_id));
                let _ = reply.send(result);
            }
            Command::DismissAll { plant_id, reply } => {
                let result = self.store_mut(&plant_id).map(|s| s.resolve_all(&plant_id));
                let _ = reply.send(result);
            }
            Command::Sweep { now, reply } => {
                let retention = self.retention;
                let removed = self
                    .plants
                    .values_mut()
                    .map(|p| p.store.sweep_expired(retention, now))
                    .sum();
                let _ = reply.send(Ok(removed));
            }
            Command::Snapshot { plant_id, reply } => {
                let result = self
                    .plants
                    .get(&plant_id)
                    .map(|p| p.store.alerts().to_vec())
                    .ok_or(MonitorError::UnknownPlant(plant_id));
                let _ = reply.send(result);
            }
        }
    }

    fn store_mut(&mut self, plant_id: &str) -> Result<&mut AlertStore, MonitorError> {
        self.plants
            .get_mut(plant_id)
            .map(|p| &mut p.store)
            .ok_or_else(|| MonitorError::UnknownPlant(plant_id.to_string()))
    }

    fn ingest(
        &mut self,
        plant_id: &str,
        quantity: Quantity,
        reading: &Reading,
    ) -> Result<Option<Alert>, MonitorError> {
        let monitored = self
            .plants
            .get_mut(plant_id)
            .ok_or_else(|| MonitorError::UnknownPlant(plant_id.to_string()))?;

        let band = monitored.plant.thresholds.band(quantity);
        let existing = monitored.store.unresolved_kinds();
        let Some(alert) = self
            .factory
            .try_create(plant_id, reading, band, quantity, &existing)
        else {
            tracing::debug!(
                "{} reading {} for {} raised no alert",
                quantity,
                reading.value,
                plant_id
            );
            return Ok(None);
        };

        if monitored.store.insert_if_absent(alert.clone())? {
            Ok(Some(alert))
        } else {
            Ok(None)
        }
    }
}

/// Cloneable entry point to a running [`PlantMonitor`]
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<Command>,
    plants: Arc<Vec<Plant>>,
}

impl MonitorHandle {
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn plant(&self, plant_id: &str) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == plant_id)
    }

    pub fn plants_for_device<'a>(
        &'a self,
        device_id: &'a str,
    ) -> impl Iterator<Item = &'a Plant> {
        self.plants.iter().filter(move |p| p.device_id == device_id)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, MonitorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| MonitorError::Unavailable)?;
        rx.await.map_err(|_| MonitorError::Unavailable)?
    }

    /// Evaluate a reading; returns the alert if one was created
    pub async fn ingest_reading(
        &self,
        plant_id: &str,
        quantity: Quantity,
        reading: Reading,
    ) -> Result<Option<Alert>, MonitorError> {
        self.request(|reply| Command::Ingest {
            plant_id: plant_id.to_string(),
            quantity,
            reading,
            reply,
        })
        .await
    }

    /// Evaluate only the newest reading of a series
    pub async fn ingest_latest(
        &self,
        plant_id: &str,
        quantity: Quantity,
        readings: &[Reading],
    ) -> Result<Option<Alert>, MonitorError> {
        match latest_reading(readings) {
            Some(reading) => self.ingest_reading(plant_id, quantity, reading.clone()).await,
            None => Ok(None),
        }
    }

    pub async fn acknowledge(&self, plant_id: &str, alert_id: &str) -> Result<bool, MonitorError> {
        self.request(|reply| Command::Acknowledge {
            plant_id: plant_id.to_string(),
            alert_id: alert_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn dismiss(&self, plant_id: &str, alert_id: &str) -> Result<bool, MonitorError> {
        self.request(|reply| Command::Dismiss {
            plant_id: plant_id.to_string(),
            alert_id: alert_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn dismiss_all(&self, plant_id: &str) -> Result<usize, MonitorError> {
        self.request(|reply| Command::DismissAll {
            plant_id: plant_id.to_string(),
            reply,
        })
        .await
    }

    /// Remove expired resolved alerts across all plants
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, MonitorError> {
        self.request(|reply| Command::Sweep { now, reply }).await
    }

    /// Insertion-ordered copy of a plant's alerts
    pub async fn alerts(&self, plant_id: &str) -> Result<Vec<Alert>, MonitorError> {
        self.request(|reply| Command::Snapshot {
            plant_id: plant_id.to_string(),
            reply,
        })
        .await
    }
}
