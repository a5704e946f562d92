// Alert store - Owns the alert lifecycle for one plant
use crate::application::key_value_store::KeyValueStore;
use crate::domain::alert::{Alert, AlertKind};
use crate::domain::error::AlertError;
use crate::domain::plant::alerts_storage_key;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Insertion-ordered alerts of a single plant.
///
/// Every mutation that changes state is mirrored to the plant's key-value slot.
/// A failed write is logged and otherwise ignored: the in-memory collection
/// stays authoritative for the rest of the session.
pub struct AlertStore {
    plant_id: String,
    storage_key: String,
    alerts: Vec<Alert>,
    storage: Arc<dyn KeyValueStore>,
}

impl AlertStore {
    pub fn new(plant_id: impl Into<String>, storage: Arc<dyn KeyValueStore>) -> Self {
        let plant_id = plant_id.into();
        Self {
            storage_key: alerts_storage_key(&plant_id),
            plant_id,
            alerts: Vec::new(),
            storage,
        }
    }

    /// Create a store and rehydrate it from persistence
    pub fn open(plant_id: impl Into<String>, storage: Arc<dyn KeyValueStore>) -> Self {
        let mut store = Self::new(plant_id, storage);
        store.load_from_persistence();
        store
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn unresolved_kinds(&self) -> HashSet<AlertKind> {
        self.alerts
            .iter()
            .filter(|a| a.is_active())
            .map(Alert::kind)
            .collect()
    }

    /// Append `alert` unless an unresolved alert of the same kind exists.
    ///
    /// Returns `Ok(false)` when deduplicated.
    pub fn insert_if_absent(&mut self, alert: Alert) -> Result<bool, AlertError> {
        if alert.plant_id != self.plant_id {
            return Err(AlertError::PlantMismatch {
                expected: self.plant_id.clone(),
                actual: alert.plant_id,
            });
        }
        if self.alerts.iter().any(|a| a.id == alert.id) {
            return Err(AlertError::DuplicateId(alert.id));
        }

        let kind = alert.kind();
        if self.alerts.iter().any(|a| a.is_active() && a.kind() == kind) {
            tracing::debug!("Dropping {} for {}: unresolved alert exists", kind, self.plant_id);
            return Ok(false);
        }

        tracing::info!(
            "New {:?} alert {} ({}) for plant {}",
            alert.severity,
            alert.id,
            kind,
            self.plant_id
        );
        self.alerts.push(alert);
        self.persist();
        Ok(true)
    }

    /// Returns `true` if the alert existed and was not yet acknowledged
    pub fn acknowledge(&mut self, id: &str) -> bool {
        let changed = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .map(Alert::acknowledge)
            .unwrap_or(false);

        if changed {
            self.persist();
        }
        changed
    }

    /// Resolve (dismiss) an alert; resolving also acknowledges it
    pub fn resolve(&mut self, id: &str) -> bool {
        let changed = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .map(Alert::resolve)
            .unwrap_or(false);

        if changed {
            self.persist();
        }
        changed
    }

    /// Resolve every unresolved alert of `plant_id`, persisting once
    pub fn resolve_all(&mut self, plant_id: &str) -> usize {
        let resolved = self
            .alerts
            .iter_mut()
            .filter(|a| a.plant_id == plant_id && a.is_active())
            .map(|a| a.resolve())
            .filter(|changed| *changed)
            .count();

        if resolved > 0 {
            tracing::info!("Resolved {} alerts for plant {}", resolved, plant_id);
            self.persist();
        }
        resolved
    }

    /// Remove resolved alerts created more than `retention` before `now`
    pub fn sweep_expired(&mut self, retention: Duration, now: DateTime<Utc>) -> usize {
        let before = self.alerts.len();
        self.alerts
            .retain(|a| !(a.resolved && now.signed_duration_since(a.created_at) > retention));
        let removed = before - self.alerts.len();

        if removed > 0 {
            tracing::info!("Swept {} expired alerts for plant {}", removed, self.plant_id);
            self.persist();
        }
        removed
    }

    /// Replace in-memory state with the persisted collection.
    ///
    /// Missing, unreadable or corrupt payloads leave the store empty.
    pub fn load_from_persistence(&mut self) {
        let bytes = match self.storage.get(&self.storage_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("No persisted alerts for plant {}", self.plant_id);
                self.alerts.clear();
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to read alerts for plant {}: {}", self.plant_id, e);
                self.alerts.clear();
                return;
            }
        };

        match serde_json::from_slice::<Vec<Alert>>(&bytes) {
            Ok(alerts) => {
                let (alerts, repaired) = self.repair(alerts);
                self.alerts = alerts;
                tracing::info!(
                    "Loaded {} alerts for plant {}",
                    self.alerts.len(),
                    self.plant_id
                );
                if repaired {
                    self.persist();
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Discarding corrupt alert payload for plant {}: {}",
                    self.plant_id,
                    e
                );
                self.alerts.clear();
            }
        }
    }

    /// Restore store invariants on data read back from persistence.
    ///
    /// The flag is `true` when anything was dropped or rewritten.
    fn repair(&self, alerts: Vec<Alert>) -> (Vec<Alert>, bool) {
        let mut seen_ids = HashSet::new();
        let mut unresolved = HashSet::new();
        let mut kept = Vec::with_capacity(alerts.len());
        let mut repaired = false;

        for mut alert in alerts {
            if alert.plant_id != self.plant_id || !seen_ids.insert(alert.id.clone()) {
                tracing::warn!(
                    "Dropping persisted alert {} for plant {}",
                    alert.id,
                    self.plant_id
                );
                repaired = true;
                continue;
            }
            if alert.resolved {
                repaired |= !alert.acknowledged;
                alert.acknowledged = true;
            } else if !unresolved.insert(alert.kind()) {
                repaired |= alert.resolve();
            }
            kept.push(alert);
        }

        (kept, repaired)
    }

    fn persist(&self) {
        let payload = match serde_json::to_vec(&self.alerts) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to encode alerts for plant {}: {}", self.plant_id, e);
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.storage_key, &payload) {
            tracing::warn!("Failed to persist alerts for plant {}: {}", self.plant_id, e);
        }
    }
}
