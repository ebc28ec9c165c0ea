//! Z-score normalization of descriptors against population statistics.
//!
//! Tables are plain text, one `mean std` pair per line in descriptor order.
//! Blank lines and `#` comments are ignored.

use std::path::Path;

use super::error::AnalysisError;
use super::vector::{FEATURE_VECTOR_LEN, FeatureVector};

/// Per-feature mean and standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNormalizer {
    means: [f64; FEATURE_VECTOR_LEN],
    stds: [f64; FEATURE_VECTOR_LEN],
}

impl FeatureNormalizer {
    pub fn new(
        means: [f64; FEATURE_VECTOR_LEN],
        stds: [f64; FEATURE_VECTOR_LEN],
    ) -> Result<Self, AnalysisError> {
        for (idx, (&mean, &std)) in means.iter().zip(stds.iter()).enumerate() {
            if !mean.is_finite() {
                return Err(AnalysisError::Configuration(format!(
                    "mean for feature {idx} is not finite"
                )));
            }
            if !(std.is_finite() && std > 0.0) {
                return Err(AnalysisError::Configuration(format!(
                    "std for feature {idx} must be positive, got {std}"
                )));
            }
        }
        Ok(Self { means, stds })
    }

    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            means: [0.0; FEATURE_VECTOR_LEN],
            stds: [1.0; FEATURE_VECTOR_LEN],
        }
    }

    pub fn parse(text: &str) -> Result<Self, AnalysisError> {
        let rows = parse_rows(text)?;
        Self::from_rows(&rows)
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        Self::parse(&read_table(path)?)
    }

    pub fn means(&self) -> &[f64; FEATURE_VECTOR_LEN] {
        &self.means
    }

    pub fn stds(&self) -> &[f64; FEATURE_VECTOR_LEN] {
        &self.stds
    }

    pub fn normalize(&self, vector: &FeatureVector) -> FeatureVector {
        let values = vector.values();
        FeatureVector::new(std::array::from_fn(|idx| {
            (values[idx] - self.means[idx]) / self.stds[idx]
        }))
    }

    /// Map z-scores back to raw descriptor units, e.g. to display stored
    /// normalized descriptors.
    pub fn denormalize(&self, vector: &FeatureVector) -> FeatureVector {
        let values = vector.values();
        FeatureVector::new(std::array::from_fn(|idx| {
            values[idx] * self.stds[idx] + self.means[idx]
        }))
    }

    fn from_rows(rows: &[(f64, f64)]) -> Result<Self, AnalysisError> {
        if rows.len() != FEATURE_VECTOR_LEN {
            return Err(AnalysisError::DimensionMismatch {
                expected: FEATURE_VECTOR_LEN,
                actual: rows.len(),
            });
        }
        Self::new(
            std::array::from_fn(|idx| rows[idx].0),
            std::array::from_fn(|idx| rows[idx].1),
        )
    }
}

/// Separate statistics for the non-specular and specular photo of a material.
#[derive(Debug, Clone, PartialEq)]
pub struct PairNormalizer {
    non_specular: FeatureNormalizer,
    specular: FeatureNormalizer,
}

impl PairNormalizer {
    pub fn new(non_specular: FeatureNormalizer, specular: FeatureNormalizer) -> Self {
        Self {
            non_specular,
            specular,
        }
    }

    pub fn identity() -> Self {
        Self::new(FeatureNormalizer::identity(), FeatureNormalizer::identity())
    }

    /// Parse a 28-row table: non-specular rows first, then specular.
    pub fn parse(text: &str) -> Result<Self, AnalysisError> {
        let rows = parse_rows(text)?;
        if rows.len() != 2 * FEATURE_VECTOR_LEN {
            return Err(AnalysisError::DimensionMismatch {
                expected: 2 * FEATURE_VECTOR_LEN,
                actual: rows.len(),
            });
        }
        let (first, second) = rows.split_at(FEATURE_VECTOR_LEN);
        Ok(Self::new(
            FeatureNormalizer::from_rows(first)?,
            FeatureNormalizer::from_rows(second)?,
        ))
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let normalizer = Self::parse(&read_table(path)?)?;
        tracing::info!("Loaded normalization table from {}", path.display());
        Ok(normalizer)
    }

    pub fn non_specular(&self) -> &FeatureNormalizer {
        &self.non_specular
    }

    pub fn specular(&self) -> &FeatureNormalizer {
        &self.specular
    }
}

fn read_table(path: &Path) -> Result<String, AnalysisError> {
    std::fs::read_to_string(path).map_err(|err| {
        AnalysisError::Configuration(format!(
            "failed to read normalization table {}: {err}",
            path.display()
        ))
    })
}

fn parse_rows(text: &str) -> Result<Vec<(f64, f64)>, AnalysisError> {
    let mut rows = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|field| !field.is_empty())
            .collect();
        let [mean, std] = fields.as_slice() else {
            return Err(AnalysisError::Configuration(format!(
                "line {}: expected `mean std`, found {} fields",
                line_no + 1,
                fields.len()
            )));
        };
        rows.push((parse_number(mean, line_no)?, parse_number(std, line_no)?));
    }
    Ok(rows)
}

fn parse_number(field: &str, line_no: usize) -> Result<f64, AnalysisError> {
    field.parse::<f64>().map_err(|err| {
        AnalysisError::Configuration(format!("line {}: invalid number `{field}`: {err}", line_no + 1))
    })
}
