//! Precomputed sector masks and radial frequency bins for the canonical resolution.
//!
//! Rasterizing the masks is the expensive part of spectral analysis, so the
//! cache is built once at startup and shared read-only (usually behind an
//! `Arc`) by every extraction.

use std::f64::consts::PI;
use std::time::Instant;

use ndarray::Array2;

use super::error::AnalysisError;

/// Canonical square resolution used for spectral and pattern analysis.
pub const CANONICAL_RESOLUTION: usize = 256;
/// Number of angular sectors covering the full circle.
pub const DEFAULT_SECTOR_COUNT: usize = 24;
/// Number of concentric rings each sector is split into.
pub const DEFAULT_RING_COUNT: usize = 32;
/// Angle (degrees, measured with `atan2(row, col)`) where sector 0 starts.
const REFERENCE_ANGLE_DEGREES: f64 = 270.0;

/// Boolean occupancy grid for one (half-sector, ring) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMask {
    occupancy: Array2<bool>,
    pixel_count: usize,
}

impl SectorMask {
    /// Occupancy grid over the canonical resolution.
    pub fn occupancy(&self) -> &Array2<bool> {
        &self.occupancy
    }

    /// Number of occupied pixels.
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Whether the pixel at `(row, col)` belongs to the mask.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.occupancy.get((row, col)).copied().unwrap_or(false)
    }
}

/// Radial frequency layout of an unshifted 2D FFT.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyBinGeometry {
    magnitudes: Array2<f64>,
    edges: Vec<f64>,
    area_normalization: Vec<f64>,
    pixel_bins: Vec<Option<usize>>,
}

impl FrequencyBinGeometry {
    fn new(resolution: usize) -> Self {
        let freqs: Vec<f64> = (0..resolution).map(|i| fft_frequency(i, resolution)).collect();
        let magnitudes = Array2::from_shape_fn((resolution, resolution), |(row, col)| {
            (freqs[row] * freqs[row] + freqs[col] * freqs[col]).sqrt()
        });
        let half = resolution / 2;
        let edges: Vec<f64> = (0..=half).map(|k| 0.5 + k as f64).collect();
        let area_normalization = edges
            .windows(2)
            .map(|pair| PI * (pair[1] * pair[1] - pair[0] * pair[0]))
            .collect();
        let pixel_bins = magnitudes.iter().map(|&m| bin_for(&edges, m)).collect();
        Self {
            magnitudes,
            edges,
            area_normalization,
            pixel_bins,
        }
    }

    /// Per-pixel distance from the zero frequency, in cycles per image.
    pub fn magnitudes(&self) -> &Array2<f64> {
        &self.magnitudes
    }

    /// Monotonic bin edges from 0.5 to `resolution / 2 + 0.5`.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// `π·(outer² − inner²)` for every bin.
    pub fn area_normalization(&self) -> &[f64] {
        &self.area_normalization
    }

    /// Number of radial bins.
    pub fn bin_count(&self) -> usize {
        self.area_normalization.len()
    }

    /// Bin index for each pixel in row-major order; `None` outside the edges.
    pub fn pixel_bins(&self) -> &[Option<usize>] {
        &self.pixel_bins
    }
}

/// Immutable geometry bundle shared by every spectral analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryCache {
    resolution: usize,
    sector_count: usize,
    ring_count: usize,
    masks: Vec<SectorMask>,
    frequency: FrequencyBinGeometry,
}

impl GeometryCache {
    /// Build masks and frequency bins for a square `resolution`.
    ///
    /// Only the upper half-circle of sectors is materialized because the power
    /// spectrum of a real image is point-symmetric.
    pub fn build(
        resolution: usize,
        sector_count: usize,
        ring_count: usize,
    ) -> Result<Self, AnalysisError> {
        if resolution < 2 {
            return Err(AnalysisError::Configuration(format!(
                "resolution must be at least 2, got {resolution}"
            )));
        }
        if sector_count == 0 {
            return Err(AnalysisError::Configuration(
                "sector count must be positive".to_string(),
            ));
        }
        if ring_count == 0 || ring_count > resolution / 2 {
            return Err(AnalysisError::Configuration(format!(
                "ring count must be in 1..={}, got {ring_count}",
                resolution / 2
            )));
        }

        let started = Instant::now();
        let half_sectors = sector_count.div_ceil(2);
        let middle = resolution / 2;
        let ring_step = middle / ring_count;
        let sector_width = 2.0 * PI / sector_count as f64;

        let mut radius_sq = Array2::<usize>::zeros((resolution, resolution));
        let mut angles = Array2::<f64>::zeros((resolution, resolution));
        for ((row, col), r2) in radius_sq.indexed_iter_mut() {
            let dr = row as isize - middle as isize;
            let dc = col as isize - middle as isize;
            *r2 = (dr * dr + dc * dc) as usize;
            angles[(row, col)] = (dr as f64).atan2(dc as f64);
        }

        let mut masks = Vec::with_capacity(half_sectors * ring_count);
        for sector in 0..half_sectors {
            let start = REFERENCE_ANGLE_DEGREES.to_radians() + sector as f64 * sector_width;
            for ring in 0..ring_count {
                let outer = if ring + 1 == ring_count {
                    middle
                } else {
                    ring_step * (ring + 1)
                };
                let inner = ring_step * ring;
                let (outer_sq, inner_sq) = (outer * outer, inner * inner);
                let occupancy = Array2::from_shape_fn((resolution, resolution), |idx| {
                    let r2 = radius_sq[idx];
                    let theta = (angles[idx] - start).rem_euclid(2.0 * PI);
                    theta < sector_width && r2 <= outer_sq && r2 > inner_sq
                });
                let pixel_count = occupancy.iter().filter(|&&v| v).count();
                masks.push(SectorMask {
                    occupancy,
                    pixel_count,
                });
            }
        }

        let frequency = FrequencyBinGeometry::new(resolution);
        tracing::info!(
            resolution,
            sector_count,
            ring_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built spectral geometry cache"
        );
        Ok(Self {
            resolution,
            sector_count,
            ring_count,
            masks,
            frequency,
        })
    }

    /// Build the cache for the reference parameters (256px, 24 sectors, 32 rings).
    pub fn canonical() -> Result<Self, AnalysisError> {
        Self::build(CANONICAL_RESOLUTION, DEFAULT_SECTOR_COUNT, DEFAULT_RING_COUNT)
    }

    /// Square resolution the masks were rasterized for.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Configured full-circle sector count.
    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    /// Number of materialized half-circle sectors.
    pub fn half_sector_count(&self) -> usize {
        self.sector_count.div_ceil(2)
    }

    /// Number of radial rings per sector.
    pub fn ring_count(&self) -> usize {
        self.ring_count
    }

    /// Mask for a (half-sector, ring) cell.
    pub fn mask(&self, sector: usize, ring: usize) -> Option<&SectorMask> {
        if sector >= self.half_sector_count() || ring >= self.ring_count {
            return None;
        }
        self.masks.get(sector * self.ring_count + ring)
    }

    /// Radial frequency bins of the unshifted spectrum.
    pub fn frequency(&self) -> &FrequencyBinGeometry {
        &self.frequency
    }
}

/// Frequency of FFT index `i` in cycles per image (numpy `fftfreq(n) * n`).
fn fft_frequency(i: usize, n: usize) -> f64 {
    if i <= (n - 1) / 2 {
        i as f64
    } else {
        i as f64 - n as f64
    }
}

/// Half-open bins, with the last bin closed on the right.
fn bin_for(edges: &[f64], value: f64) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if value < first || value > last {
        return None;
    }
    let bins = edges.len() - 1;
    let idx = edges.partition_point(|&edge| edge <= value);
    Some(idx.saturating_sub(1).min(bins - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache() -> GeometryCache {
        GeometryCache::build(32, 8, 4).unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            GeometryCache::build(0, 24, 32),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(matches!(
            GeometryCache::build(32, 0, 4),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(matches!(
            GeometryCache::build(32, 8, 0),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(matches!(
            GeometryCache::build(32, 8, 17),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn materializes_half_of_the_sectors() {
        let cache = small_cache();
        assert_eq!(cache.half_sector_count(), 4);
        assert!(cache.mask(3, 3).is_some());
        assert!(cache.mask(4, 0).is_none());
        assert!(cache.mask(0, 4).is_none());
    }

    #[test]
    fn adjacent_rings_are_disjoint() {
        let cache = small_cache();
        for sector in 0..cache.half_sector_count() {
            for ring in 0..cache.ring_count() - 1 {
                let inner = cache.mask(sector, ring).unwrap();
                let outer = cache.mask(sector, ring + 1).unwrap();
                let overlap = inner
                    .occupancy()
                    .iter()
                    .zip(outer.occupancy().iter())
                    .filter(|(a, b)| **a && **b)
                    .count();
                assert_eq!(overlap, 0, "sector {sector} ring {ring}");
            }
        }
    }

    #[test]
    fn ring_union_stays_inside_the_disk() {
        let cache = small_cache();
        let middle = 16usize;
        let disk = (0..32)
            .flat_map(|r| (0..32).map(move |c| (r, c)))
            .filter(|&(r, c)| {
                let dr = r as isize - middle as isize;
                let dc = c as isize - middle as isize;
                (dr * dr + dc * dc) as usize <= middle * middle
            })
            .count();
        for sector in 0..cache.half_sector_count() {
            let total: usize = (0..cache.ring_count())
                .map(|ring| cache.mask(sector, ring).unwrap().pixel_count())
                .sum();
            assert!(total > 0);
            assert!(total <= disk);
        }
    }

    #[test]
    fn outer_ring_reaches_the_half_width_when_rings_do_not_divide_it() {
        // 20 / 3 leaves a remainder: ring step 6, so the last ring spans (12, 20].
        let cache = GeometryCache::build(40, 8, 3).unwrap();
        let last = cache.mask(0, 2).unwrap();
        // (dr, dc) = (-16, 12) lies at distance exactly 20 inside sector 0.
        assert!(last.contains(4, 32));
        // (dr, dc) = (-19, 3) lies between 18 and 20.
        assert!(last.contains(1, 23));
        assert!(!cache.mask(0, 1).unwrap().contains(1, 23));

        let single_ring = GeometryCache::build(40, 8, 1).unwrap();
        for sector in 0..cache.half_sector_count() {
            let total: usize = (0..cache.ring_count())
                .map(|ring| cache.mask(sector, ring).unwrap().pixel_count())
                .sum();
            assert_eq!(
                total,
                single_ring.mask(sector, 0).unwrap().pixel_count(),
                "sector {sector}"
            );
        }
    }

    #[test]
    fn zero_frequency_pixel_is_never_masked() {
        let cache = small_cache();
        for sector in 0..cache.half_sector_count() {
            for ring in 0..cache.ring_count() {
                assert!(!cache.mask(sector, ring).unwrap().contains(16, 16));
            }
        }
    }

    #[test]
    fn pixel_count_matches_occupancy() {
        let cache = small_cache();
        let mask = cache.mask(1, 2).unwrap();
        let counted = mask.occupancy().iter().filter(|&&v| v).count();
        assert_eq!(mask.pixel_count(), counted);
    }

    #[test]
    fn frequency_bins_follow_fft_layout() {
        let cache = small_cache();
        let freq = cache.frequency();
        assert_eq!(freq.bin_count(), 16);
        assert_eq!(freq.edges().len(), 17);
        assert!((freq.edges()[0] - 0.5).abs() < 1e-12);
        assert!((freq.edges()[16] - 16.5).abs() < 1e-12);
        assert_eq!(freq.magnitudes()[(0, 0)], 0.0);
        assert_eq!(freq.magnitudes()[(0, 31)], 1.0);
        assert_eq!(freq.magnitudes()[(16, 0)], 16.0);
        assert_eq!(freq.pixel_bins()[0], None);
        assert_eq!(freq.pixel_bins()[1], Some(0));
        let expected = PI * (1.5_f64 * 1.5 - 0.5 * 0.5);
        assert!((freq.area_normalization()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn bin_lookup_closes_the_last_edge() {
        let edges = [0.5, 1.5, 2.5];
        assert_eq!(bin_for(&edges, 0.4), None);
        assert_eq!(bin_for(&edges, 0.5), Some(0));
        assert_eq!(bin_for(&edges, 1.5), Some(1));
        assert_eq!(bin_for(&edges, 2.5), Some(1));
        assert_eq!(bin_for(&edges, 2.6), None);
    }
}
