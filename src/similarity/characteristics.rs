//! Human-interpretable material ratings produced by the rating oracle.

use serde::{Deserialize, Serialize};

use super::error::SimilarityError;

pub const CHARACTERISTIC_LEN: usize = 16;

/// Field names in the fixed storage order.
pub const CHARACTERISTIC_NAMES: [&str; CHARACTERISTIC_LEN] = [
    "brightness",
    "color_vibrancy",
    "hardness",
    "checkered_pattern",
    "movement_effect",
    "multicolored",
    "naturalness",
    "pattern_complexity",
    "scale_of_pattern",
    "shininess",
    "sparkle",
    "striped_pattern",
    "surface_roughness",
    "thickness",
    "value",
    "warmth",
];

/// For each storage slot, the index of the same rating in the model output.
///
/// The rating model emits: color vibrancy, surface roughness, pattern
/// complexity, striped, checkered, brightness, shininess, sparkle, hardness,
/// movement, scale, naturalness, thickness, multicolored, value, warmth.
const MODEL_OUTPUT_INDEX: [usize; CHARACTERISTIC_LEN] =
    [5, 0, 8, 4, 9, 13, 11, 2, 10, 6, 7, 3, 1, 12, 14, 15];

/// Sixteen ratings, each roughly within `[-2.75, 2.75]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CharacteristicVector {
    pub brightness: f64,
    pub color_vibrancy: f64,
    pub hardness: f64,
    pub checkered_pattern: f64,
    pub movement_effect: f64,
    pub multicolored: f64,
    pub naturalness: f64,
    pub pattern_complexity: f64,
    pub scale_of_pattern: f64,
    pub shininess: f64,
    pub sparkle: f64,
    pub striped_pattern: f64,
    pub surface_roughness: f64,
    pub thickness: f64,
    pub value: f64,
    pub warmth: f64,
}

impl CharacteristicVector {
    pub fn from_array(values: [f64; CHARACTERISTIC_LEN]) -> Self {
        let [
            brightness,
            color_vibrancy,
            hardness,
            checkered_pattern,
            movement_effect,
            multicolored,
            naturalness,
            pattern_complexity,
            scale_of_pattern,
            shininess,
            sparkle,
            striped_pattern,
            surface_roughness,
            thickness,
            value,
            warmth,
        ] = values;
        Self {
            brightness,
            color_vibrancy,
            hardness,
            checkered_pattern,
            movement_effect,
            multicolored,
            naturalness,
            pattern_complexity,
            scale_of_pattern,
            shininess,
            sparkle,
            striped_pattern,
            surface_roughness,
            thickness,
            value,
            warmth,
        }
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, SimilarityError> {
        let array: [f64; CHARACTERISTIC_LEN] =
            values
                .try_into()
                .map_err(|_| SimilarityError::DimensionMismatch {
                    left: CHARACTERISTIC_LEN,
                    right: values.len(),
                })?;
        Ok(Self::from_array(array))
    }

    /// Reorder raw rating-model output into storage order.
    pub fn from_model_ratings(ratings: [f64; CHARACTERISTIC_LEN]) -> Self {
        Self::from_array(MODEL_OUTPUT_INDEX.map(|idx| ratings[idx]))
    }

    pub fn to_array(&self) -> [f64; CHARACTERISTIC_LEN] {
        [
            self.brightness,
            self.color_vibrancy,
            self.hardness,
            self.checkered_pattern,
            self.movement_effect,
            self.multicolored,
            self.naturalness,
            self.pattern_complexity,
            self.scale_of_pattern,
            self.shininess,
            self.sparkle,
            self.striped_pattern,
            self.surface_roughness,
            self.thickness,
            self.value,
            self.warmth,
        ]
    }
}
