use serde::{Deserialize, Serialize};

use super::MatchingError;

const SUM_TOLERANCE: f64 = 1e-6;

/// Default weighting: area knowledge dominates, schedule overlap second.
pub const DEFAULT_WEIGHTS: Weights = Weights {
    area: 0.40,
    schedule: 0.25,
    language: 0.15,
    modality: 0.10,
    region: 0.10,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub area: f64,
    pub schedule: f64,
    pub language: f64,
    pub modality: f64,
    pub region: f64,
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.area + self.schedule + self.language + self.modality + self.region
    }

    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("area", self.area),
            ("schedule", self.schedule),
            ("language", self.language),
            ("modality", self.modality),
            ("region", self.region),
        ]
    }

    /// Every weight must be finite and non-negative, and together they must sum to 1.0
    /// so the aggregate stays within [0, 100].
    pub fn validate(&self) -> Result<(), MatchingError> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchingError::Validation(format!(
                    "weight `{name}` must be a finite non-negative number, got {value}"
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(MatchingError::Validation(format!(
                "weights must sum to 1.0, got {sum:.6}"
            )));
        }

        Ok(())
    }

    /// Overrides individual weights, keeping the current value where `None`.
    pub fn with_overrides(
        self,
        area: Option<f64>,
        schedule: Option<f64>,
        language: Option<f64>,
        modality: Option<f64>,
        region: Option<f64>,
    ) -> Self {
        Self {
            area: area.unwrap_or(self.area),
            schedule: schedule.unwrap_or(self.schedule),
            language: language.unwrap_or(self.language),
            modality: modality.unwrap_or(self.modality),
            region: region.unwrap_or(self.region),
        }
    }
}
