use serde::{Deserialize, Serialize};

use super::error::AnalysisError;

/// Number of values in a material descriptor.
pub const FEATURE_VECTOR_LEN: usize = 14;

/// Descriptor layout. Normalization tables are indexed by this order.
pub const FEATURE_NAMES: [&str; FEATURE_VECTOR_LEN] = [
    "max",
    "min",
    "mean",
    "variance",
    "skewness",
    "kurtosis",
    "directionality",
    "low_frequency_energy",
    "mid_frequency_energy",
    "high_frequency_energy",
    "mean_chroma_intensity",
    "pattern_strength",
    "pattern_count",
    "color_region_count",
];

/// Fixed-order 14-value statistical fingerprint of one photo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_VECTOR_LEN]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_VECTOR_LEN]) -> Self {
        Self(values)
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, AnalysisError> {
        let array: [f64; FEATURE_VECTOR_LEN] =
            values
                .try_into()
                .map_err(|_| AnalysisError::DimensionMismatch {
                    expected: FEATURE_VECTOR_LEN,
                    actual: values.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_VECTOR_LEN] {
        self.0
    }

    /// Look up a value by its layout name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|idx| self.0[idx])
    }

    /// `(name, value)` pairs in layout order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}
