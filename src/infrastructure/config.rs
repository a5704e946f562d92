use crate::application::alert_factory::{AlertText, CriticalDeltas, MessageTable};
use crate::domain::alert::AlertKind;
use crate::domain::error::ConfigError;
use crate::domain::plant::{Plant, PlantThresholds};
use crate::domain::reading::Quantity;
use crate::domain::threshold::ThresholdBand;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub severity: SeveritySettings,
    /// Alert type label (e.g. `pH_low`) to message overrides
    #[serde(default)]
    pub messages: HashMap<String, MessageConfig>,
    #[serde(default = "default_plants")]
    pub plants: Vec<PlantConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_directory")]
    pub directory: PathBuf,
}

fn default_storage_directory() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            directory: default_storage_directory(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleSettings {
    pub poll_interval_secs: u64,
    pub sweep_interval_secs: u64,
    pub retention_hours: i64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            sweep_interval_secs: 60 * 60,
            retention_hours: 24,
        }
    }
}

impl ScheduleSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.retention_hours).unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SeveritySettings {
    pub temperature_critical_delta: f64,
    pub ph_critical_delta: f64,
}

impl Default for SeveritySettings {
    fn default() -> Self {
        let deltas = CriticalDeltas::default();
        Self {
            temperature_critical_delta: deltas.temperature,
            ph_critical_delta: deltas.ph,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessageConfig {
    pub message: String,
    pub recommended_action: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BandConfig {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsConfig {
    pub temperature: BandConfig,
    pub ph: BandConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlantConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub location: String,
    pub device_id: String,
    pub thresholds: ThresholdsConfig,
}

fn default_plants() -> Vec<PlantConfig> {
    vec![PlantConfig {
        id: "plant-001".to_string(),
        name: "Basil".to_string(),
        species: "Ocimum basilicum".to_string(),
        location: "Greenhouse A".to_string(),
        device_id: "sensor_001".to_string(),
        thresholds: ThresholdsConfig {
            temperature: BandConfig { min: 18.0, max: 28.0 },
            ph: BandConfig { min: 6.0, max: 7.5 },
        },
    }]
}

impl PlantConfig {
    pub fn to_domain(&self) -> Plant {
        let band = |b: &BandConfig| ThresholdBand::new(b.min, b.max);
        Plant {
            id: self.id.clone(),
            name: self.name.clone(),
            species: self.species.clone(),
            location: self.location.clone(),
            device_id: self.device_id.clone(),
            thresholds: PlantThresholds {
                temperature: band(&self.thresholds.temperature),
                ph: band(&self.thresholds.ph),
            },
        }
    }
}

impl MonitorConfig {
    /// Reject configuration that would make classification meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plants.is_empty() {
            return Err(ConfigError::NoPlants);
        }

        let mut seen = HashSet::new();
        for plant in &self.plants {
            if !seen.insert(plant.id.as_str()) {
                return Err(ConfigError::DuplicatePlant(plant.id.clone()));
            }

            let thresholds = plant.to_domain().thresholds;
            for quantity in Quantity::ALL {
                let band = thresholds.band(quantity);
                if !band.is_valid() {
                    return Err(ConfigError::InvalidBand {
                        plant_id: plant.id.clone(),
                        quantity: quantity.to_string(),
                        min: band.min,
                        max: band.max,
                    });
                }
            }
        }

        if self.schedule.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("schedule.poll_interval_secs"));
        }
        if self.schedule.sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("schedule.sweep_interval_secs"));
        }
        if self.schedule.retention_hours <= 0 {
            return Err(ConfigError::ZeroInterval("schedule.retention_hours"));
        }

        let valid_delta = |d: f64| d.is_finite() && d >= 0.0;
        if !valid_delta(self.severity.temperature_critical_delta) {
            return Err(ConfigError::InvalidCriticalDelta("temperature"));
        }
        if !valid_delta(self.severity.ph_critical_delta) {
            return Err(ConfigError::InvalidCriticalDelta("pH"));
        }

        self.message_table().map(|_| ())
    }

    pub fn plants(&self) -> Vec<Plant> {
        self.plants.iter().map(PlantConfig::to_domain).collect()
    }

    pub fn critical_deltas(&self) -> CriticalDeltas {
        CriticalDeltas {
            temperature: self.severity.temperature_critical_delta,
            ph: self.severity.ph_critical_delta,
        }
    }

    pub fn message_table(&self) -> Result<MessageTable, ConfigError> {
        let mut table = MessageTable::default();
        for (label, text) in &self.messages {
            let kind: AlertKind = label
                .parse()
                .map_err(|_| ConfigError::UnknownAlertType(label.clone()))?;
            table = table.with_override(
                kind,
                AlertText::new(text.message.clone(), text.recommended_action.clone()),
            );
        }
        Ok(table)
    }
}

fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
    config::Config::builder()
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(
            config::Environment::with_prefix("PLANT_MONITOR")
                .prefix_separator("__")
                .separator("__"),
        )
}

pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = builder().build()?;
    let config: MonitorConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::Direction;

    fn parse(toml: &str) -> MonitorConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.schedule.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.schedule.retention(), chrono::Duration::hours(24));
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.critical_deltas(), CriticalDeltas::default());

        let plants = config.plants();
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].device_id, "sensor_001");
        assert_eq!(plants[0].thresholds.ph, ThresholdBand::new(6.0, 7.5));
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
            [api]
            base_url = "http://sensors.local:9000"

            [storage]
            backend = "memory"

            [schedule]
            poll_interval_secs = 30

            [severity]
            ph_critical_delta = 1.0

            [messages.pH_low]
            message = "Soil is acidic"
            recommended_action = "Add lime"

            [[plants]]
            id = "tomato"
            name = "Tomato"
            device_id = "sensor_002"
            thresholds = { temperature = { min = 15, max = 30 }, ph = { min = 5.5, max = 6.8 } }
            "#,
        );

        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.schedule.poll_interval_secs, 30);
        assert_eq!(config.schedule.sweep_interval_secs, 3600);
        assert_eq!(config.critical_deltas().ph, 1.0);
        assert_eq!(config.critical_deltas().temperature, 2.0);
        assert_eq!(config.plants()[0].thresholds.temperature, ThresholdBand::new(15.0, 30.0));

        let table = config.message_table().unwrap();
        let text = table.get(AlertKind::new(Quantity::Ph, Direction::Low));
        assert_eq!(text.recommended_action, "Add lime");
    }

    #[test]
    fn test_invalid_band_is_rejected() {
        let config = parse(
            r#"
            [[plants]]
            id = "fern"
            name = "Fern"
            device_id = "sensor_003"
            thresholds = { temperature = { min = 28, max = 18 }, ph = { min = 6.0, max = 7.0 } }
            "#,
        );

        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBand {
                plant_id: "fern".to_string(),
                quantity: "temperature".to_string(),
                min: 28.0,
                max: 18.0,
            })
        );
    }

    #[test]
    fn test_structural_errors() {
        let mut config = parse("");
        config.plants.push(config.plants[0].clone());
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePlant("plant-001".to_string()))
        );

        config.plants.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoPlants));

        let mut config = parse("");
        config.schedule.poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval(_))));

        let mut config = parse("");
        config.messages.insert(
            "humidity_low".to_string(),
            MessageConfig {
                message: "dry".to_string(),
                recommended_action: "water".to_string(),
            },
        );
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownAlertType("humidity_low".to_string()))
        );
    }
}
