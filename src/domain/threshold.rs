// Threshold bands and reading classification
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range considered healthy for a quantity.
///
/// `min < max` is checked when configuration is loaded, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    InRange,
    AboveMax,
    BelowMin,
}

impl ThresholdBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    /// Distance between `value` and the edge it crossed, `0.0` inside the band
    pub fn overshoot(&self, value: f64) -> f64 {
        match classify(value, self) {
            Classification::AboveMax => value - self.max,
            Classification::BelowMin => self.min - value,
            Classification::InRange => 0.0,
        }
    }
}

pub fn classify(value: f64, band: &ThresholdBand) -> Classification {
    if value > band.max {
        Classification::AboveMax
    } else if value < band.min {
        Classification::BelowMin
    } else {
        Classification::InRange
    }
}
