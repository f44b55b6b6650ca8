pub mod factors;
pub mod ranking;
pub mod scoring;
pub mod validation;
pub mod weights;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ranking::{rank, RankedMentor};
pub use scoring::{score, MatchScore};
pub use weights::{Weights, DEFAULT_WEIGHTS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error("validation error: {0}")]
    Validation(String),
}

/// Per-dimension compatibility, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFactors {
    pub area: f64,
    pub schedule: f64,
    pub language: f64,
    pub modality: f64,
    pub region: f64,
}

impl MatchFactors {
    pub fn weighted_total(&self, weights: &Weights) -> f64 {
        self.area * weights.area
            + self.schedule * weights.schedule
            + self.language * weights.language
            + self.modality * weights.modality
            + self.region * weights.region
    }
}
