//! Power-spectrum features: band energies, directionality and pattern metrics.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::error::AnalysisError;
use super::fft::{FftPlan2d, fft_shift};
use super::geometry::GeometryCache;
use super::peaks;

/// Bin count the reference band borders are expressed in.
pub const REFERENCE_BIN_COUNT: usize = 128;
/// Low / mid / high borders at the reference bin count.
pub const DEFAULT_BAND_EDGES: [usize; 4] = [0, 5, 50, 128];
/// Minimum persistence (on the 0..1 scaled sector profile) of a pattern peak.
pub const DEFAULT_PATTERN_PEAK_THRESHOLD: f64 = 0.5;
/// Sector energy below this fraction of the total power counts as numerically flat.
const FLAT_SPECTRUM_TOLERANCE: f64 = 1e-12;

/// Tunables for the spectral analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralSettings {
    pub band_edges: [usize; 4],
    pub pattern_peak_threshold: f64,
}

impl Default for SpectralSettings {
    fn default() -> Self {
        Self {
            band_edges: DEFAULT_BAND_EDGES,
            pattern_peak_threshold: DEFAULT_PATTERN_PEAK_THRESHOLD,
        }
    }
}

impl SpectralSettings {
    /// Band borders must be non-decreasing within the reference bin count.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let edges = &self.band_edges;
        if edges.windows(2).any(|pair| pair[0] > pair[1]) || edges[3] > REFERENCE_BIN_COUNT {
            return Err(AnalysisError::Configuration(format!(
                "spectral.band_edges must be non-decreasing within 0..={REFERENCE_BIN_COUNT}, got {edges:?}"
            )));
        }
        if !(self.pattern_peak_threshold.is_finite() && self.pattern_peak_threshold >= 0.0) {
            return Err(AnalysisError::Configuration(
                "spectral.pattern_peak_threshold must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// Features derived from the lightness power spectrum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpectralFeatures {
    /// 0 for isotropic texture, towards 1 when one direction dominates.
    pub directionality: f64,
    pub low_frequency_energy: f64,
    pub mid_frequency_energy: f64,
    pub high_frequency_energy: f64,
    /// Mean ratio of the strongest sector energy to the other sectors.
    pub pattern_strength: f64,
    /// Number of distinct dominant orientations.
    pub pattern_count: u32,
}

/// Spectral analysis bound to a shared geometry cache.
pub struct SpectralAnalyzer<'a> {
    geometry: &'a GeometryCache,
    settings: &'a SpectralSettings,
    plan: FftPlan2d,
}

impl<'a> SpectralAnalyzer<'a> {
    pub fn new(
        geometry: &'a GeometryCache,
        settings: &'a SpectralSettings,
    ) -> Result<Self, AnalysisError> {
        settings.validate()?;
        Ok(Self {
            geometry,
            settings,
            plan: FftPlan2d::new(geometry.resolution()),
        })
    }

    /// Analyze a lightness channel of exactly the canonical resolution.
    pub fn analyze(&self, lightness: ArrayView2<f64>) -> Result<SpectralFeatures, AnalysisError> {
        let resolution = self.geometry.resolution();
        let (height, width) = lightness.dim();
        if height != resolution || width != resolution {
            return Err(AnalysisError::InvalidImageSize {
                width,
                height,
                required: resolution,
            });
        }
        let power = self.plan.power_spectrum(lightness)?;
        let [low, mid, high] = self.band_energies(&power);
        let sectors = self.sector_energies(&power);
        let pattern = sector_pattern(&sectors, power.sum(), self.settings.pattern_peak_threshold);
        tracing::debug!(
            low,
            mid,
            high,
            directionality = pattern.directionality,
            pattern_count = pattern.count,
            "Spectral features computed"
        );
        Ok(SpectralFeatures {
            directionality: pattern.directionality,
            low_frequency_energy: low,
            mid_frequency_energy: mid,
            high_frequency_energy: high,
            pattern_strength: pattern.strength,
            pattern_count: pattern.count,
        })
    }

    /// Area-normalized radial power profile, one value per frequency bin.
    pub fn radial_profile(&self, power: &Array2<f64>) -> Vec<f64> {
        let frequency = self.geometry.frequency();
        let bins = frequency.bin_count();
        let mut sums = vec![0.0_f64; bins];
        let mut counts = vec![0usize; bins];
        for (value, bin) in power.iter().zip(frequency.pixel_bins()) {
            if let Some(bin) = *bin {
                sums[bin] += value;
                counts[bin] += 1;
            }
        }
        sums.iter()
            .zip(&counts)
            .zip(frequency.area_normalization())
            .map(|((&sum, &count), &area)| {
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64 * area
                }
            })
            .collect()
    }

    fn band_energies(&self, power: &Array2<f64>) -> [f64; 3] {
        let profile = self.radial_profile(power);
        let edges = scaled_band_edges(&self.settings.band_edges, profile.len());
        let mut out = [0.0_f64; 3];
        for (band, slot) in out.iter_mut().enumerate() {
            let range = &profile[edges[band]..edges[band + 1]];
            if !range.is_empty() {
                *slot = range.iter().sum::<f64>() / range.len() as f64;
            }
        }
        out
    }

    /// Energy per half-sector, summed over all rings of the centered spectrum.
    pub fn sector_energies(&self, power: &Array2<f64>) -> Vec<f64> {
        let centered = fft_shift(power);
        let geometry = self.geometry;
        (0..geometry.half_sector_count())
            .map(|sector| {
                (0..geometry.ring_count())
                    .filter_map(|ring| geometry.mask(sector, ring))
                    .map(|mask| {
                        centered
                            .iter()
                            .zip(mask.occupancy().iter())
                            .filter(|(_, inside)| **inside)
                            .map(|(value, _)| *value)
                            .sum::<f64>()
                    })
                    .sum()
            })
            .collect()
    }
}

struct SectorPattern {
    directionality: f64,
    strength: f64,
    count: u32,
}

fn sector_pattern(sectors: &[f64], total_power: f64, peak_threshold: f64) -> SectorPattern {
    let max = sectors.iter().copied().fold(0.0_f64, f64::max);
    if sectors.is_empty() || max <= 0.0 || max <= total_power * FLAT_SPECTRUM_TOLERANCE {
        tracing::warn!("Flat sector spectrum; using neutral pattern features");
        return SectorPattern {
            directionality: 0.0,
            strength: 1.0,
            count: 1,
        };
    }
    SectorPattern {
        directionality: directionality(sectors, max),
        strength: pattern_strength(sectors),
        count: pattern_count(sectors, peak_threshold),
    }
}

fn directionality(sectors: &[f64], max: f64) -> f64 {
    let spread: f64 = sectors.iter().map(|&v| max - v).sum();
    spread / (sectors.len() as f64 * max)
}

/// Mean of `max / value` over the non-maximal sectors.
///
/// Zero-energy sectors would make the ratio infinite; they are left out. If
/// nothing remains the neutral value 1 is returned.
fn pattern_strength(sectors: &[f64]) -> f64 {
    let Some((max_idx, &max)) = sectors
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
    else {
        return 1.0;
    };
    let mut skipped = 0usize;
    let ratios: Vec<f64> = sectors
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != max_idx)
        .filter_map(|(_, &value)| {
            if value > 0.0 {
                Some(max / value)
            } else {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        tracing::warn!(skipped, "Zero-energy sectors excluded from pattern strength");
    }
    if ratios.is_empty() {
        return 1.0;
    }
    ratios.iter().sum::<f64>() / ratios.len() as f64
}

/// Count dominant orientations on the circular sector profile.
fn pattern_count(sectors: &[f64], threshold: f64) -> u32 {
    let min = sectors.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sectors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 {
        return 1;
    }
    let scaled: Vec<f64> = sectors.iter().map(|&v| (v - min) / range).collect();
    let indices: Vec<usize> = peaks::significant(peaks::persistent_peaks_1d(&scaled), threshold)
        .map(|peak| peak.index)
        .collect();
    let last = scaled.len() - 1;
    let wraps = last > 0 && indices.contains(&0) && indices.contains(&last);
    (indices.len() - usize::from(wraps)) as u32
}

/// Rescale band borders from the reference bin count to `bin_count` bins.
fn scaled_band_edges(edges: &[usize; 4], bin_count: usize) -> [usize; 4] {
    edges.map(|edge| {
        let scaled = (edge as f64 * bin_count as f64 / REFERENCE_BIN_COUNT as f64).round() as usize;
        scaled.min(bin_count)
    })
}
