//! Chroma intensity and distinct-color-region features.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::error::AnalysisError;
use super::image::PerceptualImage;
use super::peaks;

pub const DEFAULT_HISTOGRAM_BINS: usize = 128;
/// Half-width of the opponent-channel histogram range (`-range..range`).
pub const DEFAULT_HISTOGRAM_RANGE: f64 = 128.0;
/// Minimum persistence of a color peak on the 0..255 scaled histogram.
pub const DEFAULT_COLOR_PEAK_THRESHOLD: f64 = 30.0;
const HISTOGRAM_SCALE: f64 = 255.0;

/// Tunables for the color analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub histogram_bins: usize,
    pub histogram_range: f64,
    pub peak_threshold: f64,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            histogram_range: DEFAULT_HISTOGRAM_RANGE,
            peak_threshold: DEFAULT_COLOR_PEAK_THRESHOLD,
        }
    }
}

impl ColorSettings {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.histogram_bins == 0 {
            return Err(AnalysisError::Configuration(
                "color.histogram_bins must be positive".into(),
            ));
        }
        if !(self.histogram_range.is_finite() && self.histogram_range > 0.0) {
            return Err(AnalysisError::Configuration(
                "color.histogram_range must be positive".into(),
            ));
        }
        if !(self.peak_threshold.is_finite() && self.peak_threshold >= 0.0) {
            return Err(AnalysisError::Configuration(
                "color.peak_threshold must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorFeatures {
    /// Mean of lightness × chroma over all pixels.
    pub mean_chroma_intensity: f64,
    /// Peaks in the a/b histogram beyond the dominant one.
    ///
    /// The `- 1` matches the descriptors the normalization tables were built
    /// from; it is a convention rather than a count of visually distinct colors.
    pub color_region_count: u32,
}

pub fn analyze_color(image: &PerceptualImage, settings: &ColorSettings) -> ColorFeatures {
    let lightness = image.lightness();
    let weighted: f64 = lightness
        .iter()
        .zip(image.chroma().iter())
        .map(|(l, c)| l * c)
        .sum();
    let pixels = lightness.len().max(1) as f64;
    let mean_chroma_intensity = weighted / pixels;

    let mut histogram = opponent_histogram(image, settings);
    scale_to_range(&mut histogram, HISTOGRAM_SCALE);
    let raw_peaks = peaks::count_peaks_2d(&histogram, settings.peak_threshold);
    let color_region_count = raw_peaks.saturating_sub(1) as u32;
    tracing::debug!(mean_chroma_intensity, raw_peaks, "Color features computed");
    ColorFeatures {
        mean_chroma_intensity,
        color_region_count,
    }
}

/// Lightness-weighted 2D histogram of the a (rows) and b (columns) channels.
///
/// Bins are half-open except the last one, which also takes values equal to
/// the upper bound; values outside the range are dropped.
pub fn opponent_histogram(image: &PerceptualImage, settings: &ColorSettings) -> Array2<f64> {
    let bins = settings.histogram_bins.max(1);
    let range = settings.histogram_range;
    let width = 2.0 * range / bins as f64;
    let mut histogram = Array2::<f64>::zeros((bins, bins));
    let bin_of = |value: f64| -> Option<usize> {
        if !(value >= -range && value <= range) {
            return None;
        }
        Some((((value + range) / width) as usize).min(bins - 1))
    };
    let (a, b, l) = (image.a(), image.b(), image.lightness());
    for ((&av, &bv), &lv) in a.iter().zip(b.iter()).zip(l.iter()) {
        if let (Some(row), Some(col)) = (bin_of(av), bin_of(bv)) {
            histogram[(row, col)] += lv;
        }
    }
    histogram
}

fn scale_to_range(field: &mut Array2<f64>, top: f64) {
    let min = field.iter().copied().fold(f64::INFINITY, f64::min);
    let max = field.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span > 0.0) {
        return;
    }
    field.mapv_inplace(|v| (v - min) / span * top);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_from(l: f64, a: f64, b: f64) -> PerceptualImage {
        PerceptualImage::from_lab_planes(
            Array2::from_elem((8, 8), l),
            Array2::from_elem((8, 8), a),
            Array2::from_elem((8, 8), b),
        )
        .unwrap()
    }

    #[test]
    fn single_color_has_no_extra_regions() {
        let features = analyze_color(&image_from(60.0, 20.0, -10.0), &ColorSettings::default());
        assert_eq!(features.color_region_count, 0);
        let expected = 60.0 * (20.0_f64.hypot(-10.0));
        assert!((features.mean_chroma_intensity - expected).abs() < 1e-9);
    }

    #[test]
    fn black_image_is_flat() {
        let features = analyze_color(&image_from(0.0, 0.0, 0.0), &ColorSettings::default());
        assert_eq!(features.color_region_count, 0);
        assert_eq!(features.mean_chroma_intensity, 0.0);
    }

    #[test]
    fn region_count_is_raw_peaks_minus_one() {
        // Two well separated colors give two histogram peaks. The stored count
        // drops the dominant one, a convention carried by the normalization
        // tables rather than a count of visible colors.
        let l = Array2::from_elem((8, 8), 50.0);
        let a = Array2::from_shape_fn((8, 8), |(r, _)| if r < 4 { 40.0 } else { -40.0 });
        let b = Array2::from_shape_fn((8, 8), |(r, _)| if r < 4 { 30.0 } else { -30.0 });
        let image = PerceptualImage::from_lab_planes(l, a, b).unwrap();
        let settings = ColorSettings::default();
        let mut histogram = opponent_histogram(&image, &settings);
        scale_to_range(&mut histogram, HISTOGRAM_SCALE);
        assert_eq!(peaks::count_peaks_2d(&histogram, settings.peak_threshold), 2);
        let features = analyze_color(&image, &settings);
        assert_eq!(features.color_region_count, 1);
    }

    #[test]
    fn unusable_settings_are_rejected() {
        assert!(ColorSettings::default().validate().is_ok());
        for settings in [
            ColorSettings { histogram_bins: 0, ..ColorSettings::default() },
            ColorSettings { histogram_range: 0.0, ..ColorSettings::default() },
            ColorSettings { peak_threshold: f64::NAN, ..ColorSettings::default() },
        ] {
            assert!(matches!(settings.validate(), Err(AnalysisError::Configuration(_))));
        }
    }

    #[test]
    fn histogram_edges_and_weights() {
        let settings = ColorSettings {
            histogram_bins: 4,
            histogram_range: 128.0,
            peak_threshold: 30.0,
        };
        let l = Array2::from_shape_vec((1, 3), vec![10.0, 20.0, 30.0]).unwrap();
        let a = Array2::from_shape_vec((1, 3), vec![-128.0, 128.0, 200.0]).unwrap();
        let b = Array2::from_shape_vec((1, 3), vec![0.0, 127.9, 0.0]).unwrap();
        let image = PerceptualImage::from_lab_planes(l, a, b).unwrap();
        let histogram = opponent_histogram(&image, &settings);
        assert_eq!(histogram[(0, 2)], 10.0);
        assert_eq!(histogram[(3, 3)], 20.0);
        assert_eq!(histogram.sum(), 30.0);
    }
}
