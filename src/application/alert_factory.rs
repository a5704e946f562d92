// Alert factory - Turns threshold violations into alert records
use crate::domain::alert::{Alert, AlertKind, Direction, Severity};
use crate::domain::reading::{Quantity, Reading};
use crate::domain::threshold::{Classification, ThresholdBand, classify};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Overshoot beyond the band edge above which an alert is `High` severity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalDeltas {
    pub temperature: f64,
    pub ph: f64,
}

impl CriticalDeltas {
    pub fn for_quantity(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Ph => self.ph,
        }
    }
}

impl Default for CriticalDeltas {
    fn default() -> Self {
        Self {
            temperature: 2.0,
            ph: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertText {
    pub message: String,
    pub recommended_action: String,
}

impl AlertText {
    pub fn new(message: impl Into<String>, recommended_action: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recommended_action: recommended_action.into(),
        }
    }
}

fn default_text(kind: AlertKind) -> AlertText {
    match (kind.quantity, kind.direction) {
        (Quantity::Temperature, Direction::High) => AlertText::new(
            "Temperature is above the configured maximum",
            "Ventilate the area or move the plant into shade",
        ),
        (Quantity::Temperature, Direction::Low) => AlertText::new(
            "Temperature is below the configured minimum",
            "Turn on heating or move the plant somewhere warmer",
        ),
        (Quantity::Ph, Direction::High) => AlertText::new(
            "pH is above the configured maximum",
            "Use a pH adjuster to make the soil more acidic",
        ),
        (Quantity::Ph, Direction::Low) => AlertText::new(
            "pH is below the configured minimum",
            "Use a pH adjuster to make the soil more alkaline",
        ),
    }
}

/// Message and recommended action per alert type, with built-in defaults
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    overrides: HashMap<AlertKind, AlertText>,
}

impl MessageTable {
    pub fn with_override(mut self, kind: AlertKind, text: AlertText) -> Self {
        self.overrides.insert(kind, text);
        self
    }

    pub fn get(&self, kind: AlertKind) -> AlertText {
        self.overrides
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| default_text(kind))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertFactory {
    critical_deltas: CriticalDeltas,
    messages: MessageTable,
}

impl AlertFactory {
    pub fn new(critical_deltas: CriticalDeltas, messages: MessageTable) -> Self {
        Self {
            critical_deltas,
            messages,
        }
    }

    pub fn severity_for(&self, quantity: Quantity, overshoot: f64) -> Severity {
        if overshoot > self.critical_deltas.for_quantity(quantity) {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    /// Build an alert for a violating reading.
    ///
    /// Returns `None` when the reading is inside the band or an unresolved alert
    /// of the same kind already exists.
    pub fn try_create(
        &self,
        plant_id: &str,
        reading: &Reading,
        band: &ThresholdBand,
        quantity: Quantity,
        existing_unresolved: &HashSet<AlertKind>,
    ) -> Option<Alert> {
        let direction = match classify(reading.value, band) {
            Classification::InRange => return None,
            Classification::AboveMax => Direction::High,
            Classification::BelowMin => Direction::Low,
        };

        let kind = AlertKind::new(quantity, direction);
        if existing_unresolved.contains(&kind) {
            tracing::debug!("Suppressing {} for {}: unresolved alert exists", kind, plant_id);
            return None;
        }

        let severity = self.severity_for(quantity, band.overshoot(reading.value));
        let text = self.messages.get(kind);

        Some(Alert {
            id: new_alert_id(),
            plant_id: plant_id.to_string(),
            quantity,
            direction,
            severity,
            message: text.message,
            recommended_action: text.recommended_action,
            created_at: reading.timestamp,
            acknowledged: false,
            resolved: false,
        })
    }
}

/// `alert-<unix millis>-<9 random hex chars>`
pub fn new_alert_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("alert-{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(value: f64) -> Reading {
        Reading::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            value,
            "sensor_001".to_string(),
            "Greenhouse A".to_string(),
        )
    }

    fn temperature_band() -> ThresholdBand {
        ThresholdBand::new(18.0, 28.0)
    }

    fn temperature_alert(factory: &AlertFactory, value: f64) -> Option<Alert> {
        factory.try_create(
            "plant-001",
            &reading(value),
            &temperature_band(),
            Quantity::Temperature,
            &HashSet::new(),
        )
    }

    #[test]
    fn test_in_range_creates_nothing() {
        let factory = AlertFactory::default();
        let alert = factory.try_create(
            "plant-001",
            &reading(28.0),
            &temperature_band(),
            Quantity::Temperature,
            &HashSet::new(),
        );
        assert!(alert.is_none());
    }

    #[test]
    fn test_severity_mapping() {
        let factory = AlertFactory::default();

        let critical = temperature_alert(&factory, 30.5).unwrap();
        assert_eq!(critical.severity, Severity::High);
        assert_eq!(critical.direction, Direction::High);

        let mild = temperature_alert(&factory, 29.0).unwrap();
        assert_eq!(mild.severity, Severity::Medium);

        // Exactly at the critical delta is not beyond it
        let edge = temperature_alert(&factory, 16.0).unwrap();
        assert_eq!(edge.direction, Direction::Low);
        assert_eq!(edge.severity, Severity::Medium);
    }

    #[test]
    fn test_ph_uses_its_own_delta() {
        let factory = AlertFactory::default();
        let band = ThresholdBand::new(6.0, 7.5);
        let alert = factory
            .try_create("plant-001", &reading(5.4), &band, Quantity::Ph, &HashSet::new())
            .unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.kind().to_string(), "pH_low");
    }

    #[test]
    fn test_existing_unresolved_suppresses() {
        let factory = AlertFactory::default();
        let existing: HashSet<AlertKind> =
            [AlertKind::new(Quantity::Temperature, Direction::High)].into_iter().collect();

        let suppressed = factory.try_create(
            "plant-001",
            &reading(31.0),
            &temperature_band(),
            Quantity::Temperature,
            &existing,
        );
        assert!(suppressed.is_none());

        // The opposite direction is a different kind
        let low = factory.try_create(
            "plant-001",
            &reading(10.0),
            &temperature_band(),
            Quantity::Temperature,
            &existing,
        );
        assert!(low.is_some());
    }

    #[test]
    fn test_alert_fields() {
        let factory = AlertFactory::default();
        let alert = temperature_alert(&factory, 29.0).unwrap();

        assert!(alert.id.starts_with("alert-"));
        assert_eq!(alert.plant_id, "plant-001");
        assert_eq!(alert.created_at, reading(29.0).timestamp);
        assert!(!alert.acknowledged && !alert.resolved);
        assert_eq!(alert.message, "Temperature is above the configured maximum");
    }

    #[test]
    fn test_message_override() {
        let kind = AlertKind::new(Quantity::Ph, Direction::High);
        let messages =
            MessageTable::default().with_override(kind, AlertText::new("too basic", "add peat"));
        let factory = AlertFactory::new(CriticalDeltas::default(), messages);

        let band = ThresholdBand::new(6.0, 7.5);
        let alert = factory
            .try_create("plant-001", &reading(7.6), &band, Quantity::Ph, &HashSet::new())
            .unwrap();
        assert_eq!(alert.message, "too basic");
        assert_eq!(alert.recommended_action, "add peat");
    }

    #[test]
    fn test_alert_ids_are_distinct() {
        let a = new_alert_id();
        let b = new_alert_id();
        assert_ne!(a, b);
        assert_eq!(a.rsplit('-').next().unwrap().len(), 9);
    }
}
