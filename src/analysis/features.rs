//! Descriptor extraction: runs the three analyzers and assembles the vector.

use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::color::{ColorFeatures, ColorSettings, analyze_color};
use super::error::AnalysisError;
use super::geometry::GeometryCache;
use super::image::PerceptualImage;
use super::luminance::{LuminanceStats, compute_luminance_stats};
use super::normalize::PairNormalizer;
use super::spectral::{SpectralAnalyzer, SpectralFeatures, SpectralSettings};
use super::vector::FeatureVector;
use super::version::analysis_version;

/// Everything measured on one photo, grouped by analyzer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MaterialFeatures {
    pub luminance: LuminanceStats,
    pub spectral: SpectralFeatures,
    pub color: ColorFeatures,
}

impl MaterialFeatures {
    /// Flatten into the fixed descriptor layout.
    pub fn to_vector(&self) -> FeatureVector {
        let l = &self.luminance;
        let s = &self.spectral;
        let c = &self.color;
        FeatureVector::new([
            l.p99,
            l.p1,
            l.mean,
            l.variance,
            l.skewness,
            l.kurtosis,
            s.directionality,
            s.low_frequency_energy,
            s.mid_frequency_energy,
            s.high_frequency_energy,
            c.mean_chroma_intensity,
            s.pattern_strength,
            f64::from(s.pattern_count),
            f64::from(c.color_region_count),
        ])
    }
}

/// Raw and z-scored descriptors for one photo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImageStatistics {
    pub raw: FeatureVector,
    pub normalized: FeatureVector,
}

/// Extracts descriptors using a geometry cache built once and shared.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    geometry: Arc<GeometryCache>,
    spectral: SpectralSettings,
    color: ColorSettings,
}

impl FeatureExtractor {
    /// Fails with [`AnalysisError::Configuration`] when either settings block
    /// is unusable.
    pub fn new(
        geometry: Arc<GeometryCache>,
        spectral: SpectralSettings,
        color: ColorSettings,
    ) -> Result<Self, AnalysisError> {
        spectral.validate()?;
        color.validate()?;
        Ok(Self {
            geometry,
            spectral,
            color,
        })
    }

    /// Extractor with the reference settings on a freshly built canonical cache.
    pub fn canonical() -> Result<Self, AnalysisError> {
        Self::new(
            Arc::new(GeometryCache::canonical()?),
            SpectralSettings::default(),
            ColorSettings::default(),
        )
    }

    pub fn geometry(&self) -> &Arc<GeometryCache> {
        &self.geometry
    }

    pub fn version(&self) -> String {
        analysis_version(&self.geometry, &self.spectral, &self.color)
    }

    pub fn extract_rgb(&self, image: &RgbImage) -> Result<MaterialFeatures, AnalysisError> {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "Converting image to perceptual space"
        );
        let perceptual = PerceptualImage::from_rgb(image)?;
        self.extract(&perceptual)
    }

    /// Run all analyzers on one photo.
    ///
    /// Statistics and color use the full image; the spectral analyzer works on
    /// the center crop at the cache resolution.
    pub fn extract(&self, image: &PerceptualImage) -> Result<MaterialFeatures, AnalysisError> {
        let crop = image.center_crop_lightness(self.geometry.resolution())?;
        let analyzer = SpectralAnalyzer::new(&self.geometry, &self.spectral)?;
        let (spectral, color, luminance) = std::thread::scope(|scope| {
            let spectral = scope.spawn(|| analyzer.analyze(crop));
            let color = scope.spawn(|| analyze_color(image, &self.color));
            let luminance = compute_luminance_stats(image.lightness());
            (join(spectral), join(color), luminance)
        });
        let features = MaterialFeatures {
            luminance,
            spectral: spectral?,
            color,
        };
        tracing::debug!("Assembled material descriptor");
        Ok(features)
    }

    pub fn extract_vector(&self, image: &RgbImage) -> Result<FeatureVector, AnalysisError> {
        Ok(self.extract_rgb(image)?.to_vector())
    }

    /// Descriptors for the non-specular and specular photos of one material.
    pub fn pair_statistics(
        &self,
        non_specular: &RgbImage,
        specular: &RgbImage,
        normalizer: &PairNormalizer,
    ) -> Result<(ImageStatistics, ImageStatistics), AnalysisError> {
        tracing::debug!("Computing non-specular image statistics");
        let non_specular_raw = self.extract_vector(non_specular)?;
        tracing::debug!("Computing specular image statistics");
        let specular_raw = self.extract_vector(specular)?;
        Ok((
            ImageStatistics {
                raw: non_specular_raw,
                normalized: normalizer.non_specular().normalize(&non_specular_raw),
            },
            ImageStatistics {
                raw: specular_raw,
                normalized: normalizer.specular().normalize(&specular_raw),
            },
        ))
    }
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::vector::FEATURE_VECTOR_LEN;
    use image::Rgb;

    fn small_extractor() -> FeatureExtractor {
        FeatureExtractor::new(
            Arc::new(GeometryCache::build(32, 8, 4).unwrap()),
            SpectralSettings::default(),
            ColorSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn solid_color_descriptor() {
        let extractor = small_extractor();
        let image = RgbImage::from_pixel(32, 32, Rgb([180, 90, 40]));
        let vector = extractor.extract_vector(&image).unwrap();
        let values = vector.values();
        assert_eq!(values.len(), FEATURE_VECTOR_LEN);
        assert_eq!(values[3], 0.0);
        assert_eq!(values[4], 0.0);
        assert_eq!(values[5], 0.0);
        assert_eq!(values[6], 0.0);
        for band in &values[7..10] {
            assert!(band.abs() < 1e-6, "{band}");
        }
        assert!(values[10] > 0.0);
        assert_eq!(values[11], 1.0);
        assert_eq!(values[12], 1.0);
        assert_eq!(values[13], 0.0);
    }

    #[test]
    fn larger_images_are_cropped_for_the_spectrum() {
        let extractor = small_extractor();
        let image = RgbImage::from_fn(48, 40, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([230, 230, 230])
            } else {
                Rgb([20, 20, 20])
            }
        });
        let features = extractor.extract_rgb(&image).unwrap();
        assert!(features.luminance.variance > 0.0);
        assert!(features.spectral.mid_frequency_energy > 0.0);
    }

    #[test]
    fn small_images_are_rejected() {
        let extractor = small_extractor();
        let image = RgbImage::from_pixel(31, 64, Rgb([10, 10, 10]));
        assert_eq!(
            extractor.extract_rgb(&image).unwrap_err(),
            AnalysisError::InvalidImageSize {
                width: 31,
                height: 64,
                required: 32
            }
        );
    }

    #[test]
    fn unordered_band_edges_fail_at_construction() {
        let geometry = Arc::new(GeometryCache::build(32, 8, 4).unwrap());
        let spectral = SpectralSettings {
            band_edges: [0, 50, 5, 128],
            ..SpectralSettings::default()
        };
        let err = FeatureExtractor::new(geometry.clone(), spectral, ColorSettings::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));

        let color = ColorSettings {
            histogram_bins: 0,
            ..ColorSettings::default()
        };
        assert!(FeatureExtractor::new(geometry, SpectralSettings::default(), color).is_err());
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = small_extractor();
        let image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 7) as u8, (y * 5) as u8, 128]));
        let a = extractor.extract_vector(&image).unwrap();
        let b = extractor.extract_vector(&image).unwrap();
        assert_eq!(a, b);
    }
}
