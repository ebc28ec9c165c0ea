use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::color::ColorSettings;
use crate::analysis::geometry::{
    CANONICAL_RESOLUTION, DEFAULT_RING_COUNT, DEFAULT_SECTOR_COUNT, GeometryCache,
};
use crate::analysis::spectral::SpectralSettings;
use crate::analysis::{AnalysisError, FeatureExtractor, PairNormalizer};
use crate::similarity::DEFAULT_ALPHA;

use super::errors::ConfigError;

/// Everything that shapes descriptor extraction and ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub geometry: GeometrySettings,
    pub spectral: SpectralSettings,
    pub color: ColorSettings,
    pub similarity: SimilaritySettings,
    pub normalization: NormalizationSettings,
}

/// Parameters of the precomputed sector/ring masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySettings {
    /// Side of the square spectral analysis crop.
    pub resolution: usize,
    /// Full-circle angular sector count; half of them are materialized.
    pub sector_count: usize,
    pub ring_count: usize,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            resolution: CANONICAL_RESOLUTION,
            sector_count: DEFAULT_SECTOR_COUNT,
            ring_count: DEFAULT_RING_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilaritySettings {
    /// Weight of correlation versus L1 closeness.
    pub alpha: f64,
}

impl Default for SimilaritySettings {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationSettings {
    /// Optional 28-row `mean std` table (non-specular rows first).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_path: Option<PathBuf>,
}

impl AnalysisSettings {
    /// Reject settings the analyzers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let geometry = &self.geometry;
        if geometry.resolution < 2 {
            return invalid(format!(
                "geometry.resolution must be at least 2, got {}",
                geometry.resolution
            ));
        }
        if geometry.sector_count == 0 {
            return invalid("geometry.sector_count must be positive".into());
        }
        if geometry.ring_count == 0 || geometry.ring_count > geometry.resolution / 2 {
            return invalid(format!(
                "geometry.ring_count must be within 1..={}, got {}",
                geometry.resolution / 2,
                geometry.ring_count
            ));
        }
        self.spectral
            .validate()
            .and_then(|()| self.color.validate())
            .map_err(|err| match err {
                AnalysisError::Configuration(message) => ConfigError::Invalid(message),
                other => ConfigError::Invalid(other.to_string()),
            })?;
        if !(0.0..=1.0).contains(&self.similarity.alpha) {
            return invalid(format!(
                "similarity.alpha must be within [0, 1], got {}",
                self.similarity.alpha
            ));
        }
        Ok(())
    }

    /// Build the geometry cache and an extractor bound to it.
    pub fn extractor(&self) -> Result<FeatureExtractor, AnalysisError> {
        let geometry = GeometryCache::build(
            self.geometry.resolution,
            self.geometry.sector_count,
            self.geometry.ring_count,
        )?;
        FeatureExtractor::new(
            Arc::new(geometry),
            self.spectral.clone(),
            self.color.clone(),
        )
    }

    /// Load the configured normalization table, if any.
    pub fn normalizer(&self) -> Result<Option<PairNormalizer>, AnalysisError> {
        self.normalization
            .stats_path
            .as_deref()
            .map(PairNormalizer::load)
            .transpose()
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message))
}
