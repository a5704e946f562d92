// Alert domain model
use super::reading::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Side of the band a reading fell out of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::High => "high",
            Direction::Low => "low",
        }
    }
}

/// Ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];
}

/// The `(quantity, direction)` pair an alert is deduplicated on.
///
/// Renders as the alert type label used by the dashboard, e.g. `pH_low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKind {
    pub quantity: Quantity,
    pub direction: Direction,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::new(Quantity::Temperature, Direction::High),
        AlertKind::new(Quantity::Temperature, Direction::Low),
        AlertKind::new(Quantity::Ph, Direction::High),
        AlertKind::new(Quantity::Ph, Direction::Low),
    ];

    pub const fn new(quantity: Quantity, direction: Direction) -> Self {
        Self { quantity, direction }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.quantity.label(), self.direction.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown alert type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub plant_id: String,
    pub quantity: Quantity,
    pub direction: Direction,
    pub severity: Severity,
    pub message: String,
    pub recommended_action: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved: bool,
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        AlertKind::new(self.quantity, self.direction)
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }

    pub fn is_unread(&self) -> bool {
        !self.resolved && !self.acknowledged
    }

    /// Returns `true` if the flag changed
    pub fn acknowledge(&mut self) -> bool {
        if self.acknowledged {
            return false;
        }
        self.acknowledged = true;
        true
    }

    /// Resolving always acknowledges. Returns `true` if anything changed.
    pub fn resolve(&mut self) -> bool {
        if self.resolved && self.acknowledged {
            return false;
        }
        self.resolved = true;
        self.acknowledged = true;
        true
    }
}

/// Presentation order: severity descending, then newest first
pub fn display_order(a: &Alert, b: &Alert) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn sort_for_display(alerts: &mut [Alert]) {
    alerts.sort_by(display_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert(id: &str, severity: Severity, minute: u32) -> Alert {
        Alert {
            id: id.to_string(),
            plant_id: "plant-001".to_string(),
            quantity: Quantity::Temperature,
            direction: Direction::High,
            severity,
            message: String::new(),
            recommended_action: String::new(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
            acknowledged: false,
            resolved: false,
        }
    }

    #[test]
    fn test_kind_labels() {
        let labels: Vec<String> = AlertKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, vec!["temperature_high", "temperature_low", "pH_high", "pH_low"]);
        assert_eq!(
            "ph_LOW".parse::<AlertKind>().unwrap(),
            AlertKind::new(Quantity::Ph, Direction::Low)
        );
        assert!("humidity_low".parse::<AlertKind>().is_err());
    }

    #[test]
    fn test_resolve_implies_acknowledged() {
        let mut a = alert("a", Severity::Medium, 0);
        assert!(a.resolve());
        assert!(a.acknowledged && a.resolved);
        assert!(!a.resolve());
        assert!(!a.acknowledge());
    }

    #[test]
    fn test_sort_for_display() {
        let mut alerts = vec![
            alert("low", Severity::Low, 50),
            alert("medium-old", Severity::Medium, 10),
            alert("high", Severity::High, 0),
            alert("medium-new", Severity::Medium, 40),
        ];
        sort_for_display(&mut alerts);
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "medium-new", "medium-old", "low"]);
    }
}
