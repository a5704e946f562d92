// Alert query service - Read-only views derived from a store snapshot
use crate::domain::alert::{Alert, AlertKind, Severity, sort_for_display};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub active: usize,
    pub acknowledged: usize,
    pub resolved: usize,
    pub unread: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<String, usize>,
}

/// Views over a store snapshot, recomputed on every call; nothing is cached.
///
/// Every returned list is ordered by severity (highest first), then newest first.
pub struct AlertQueryService<'a> {
    alerts: &'a [Alert],
}

impl<'a> AlertQueryService<'a> {
    pub fn from_alerts(alerts: &'a [Alert]) -> Self {
        Self { alerts }
    }

    fn for_plant(&self, plant_id: &str) -> impl Iterator<Item = &'a Alert> {
        self.alerts.iter().filter(move |a| a.plant_id == plant_id)
    }

    fn sorted(alerts: impl Iterator<Item = &'a Alert>) -> Vec<Alert> {
        let mut list: Vec<Alert> = alerts.cloned().collect();
        sort_for_display(&mut list);
        list
    }

    pub fn all_alerts(&self, plant_id: &str) -> Vec<Alert> {
        Self::sorted(self.for_plant(plant_id))
    }

    pub fn active_alerts(&self, plant_id: &str) -> Vec<Alert> {
        Self::sorted(self.for_plant(plant_id).filter(|a| a.is_active()))
    }

    /// Acknowledged alerts, resolved or not
    pub fn acknowledged_alerts(&self, plant_id: &str) -> Vec<Alert> {
        Self::sorted(self.for_plant(plant_id).filter(|a| a.acknowledged))
    }

    pub fn unread_count(&self, plant_id: &str) -> usize {
        self.for_plant(plant_id).filter(|a| a.is_unread()).count()
    }

    /// Histogram of active alerts per alert type
    pub fn stats_by_type(&self, plant_id: &str) -> BTreeMap<AlertKind, usize> {
        let mut stats = BTreeMap::new();
        for alert in self.for_plant(plant_id).filter(|a| a.is_active()) {
            *stats.entry(alert.kind()).or_insert(0) += 1;
        }
        stats
    }

    /// Histogram of active alerts per severity, every level present
    pub fn stats_by_severity(&self, plant_id: &str) -> BTreeMap<Severity, usize> {
        let mut stats: BTreeMap<Severity, usize> = Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for alert in self.for_plant(plant_id).filter(|a| a.is_active()) {
            *stats.entry(alert.severity).or_insert(0) += 1;
        }
        stats
    }

    pub fn summary(&self, plant_id: &str) -> AlertSummary {
        let mut summary = AlertSummary {
            total: 0,
            active: 0,
            acknowledged: 0,
            resolved: 0,
            unread: self.unread_count(plant_id),
            by_severity: self.stats_by_severity(plant_id),
            by_type: self
                .stats_by_type(plant_id)
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect(),
        };

        for alert in self.for_plant(plant_id) {
            summary.total += 1;
            if alert.is_active() {
                summary.active += 1;
            }
            if alert.acknowledged {
                summary.acknowledged += 1;
            }
            if alert.resolved {
                summary.resolved += 1;
            }
        }

        summary
    }
}
