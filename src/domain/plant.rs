// Plant domain model
use super::reading::Quantity;
use super::threshold::ThresholdBand;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlantThresholds {
    pub temperature: ThresholdBand,
    pub ph: ThresholdBand,
}

impl PlantThresholds {
    pub fn band(&self, quantity: Quantity) -> &ThresholdBand {
        match quantity {
            Quantity::Temperature => &self.temperature,
            Quantity::Ph => &self.ph,
        }
    }
}

impl Default for PlantThresholds {
    fn default() -> Self {
        Self {
            temperature: ThresholdBand::new(18.0, 28.0),
            ph: ThresholdBand::new(6.0, 7.5),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub species: String,
    pub location: String,
    pub device_id: String,
    pub thresholds: PlantThresholds,
}

/// Storage slot holding a plant's alerts
pub fn alerts_storage_key(plant_id: &str) -> String {
    format!("plant-monitor-alerts:{}", plant_id)
}
