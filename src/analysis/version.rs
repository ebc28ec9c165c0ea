use crate::analysis::color::ColorSettings;
use crate::analysis::geometry::GeometryCache;
use crate::analysis::spectral::{REFERENCE_BIN_COUNT, SpectralSettings};
use crate::analysis::vector::FEATURE_NAMES;

/// Identifier for descriptors produced with the given parameters.
///
/// Stored descriptors with a different version must be recomputed.
pub fn analysis_version(
    geometry: &GeometryCache,
    spectral: &SpectralSettings,
    color: &ColorSettings,
) -> String {
    let payload = format!(
        "layout={}|res={}|sectors={}|rings={}|ref_bins={}|bands={:?}|pattern_thr={}|hist_bins={}|hist_range={}|color_thr={}",
        FEATURE_NAMES.join(","),
        geometry.resolution(),
        geometry.sector_count(),
        geometry.ring_count(),
        REFERENCE_BIN_COUNT,
        spectral.band_edges,
        spectral.pattern_peak_threshold,
        color.histogram_bins,
        color.histogram_range,
        color.peak_threshold,
    );
    let hash = blake3::hash(payload.as_bytes());
    format!("features_v1_{}", hash.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tracks_parameters() {
        let geometry = GeometryCache::build(32, 8, 4).unwrap();
        let spectral = SpectralSettings::default();
        let color = ColorSettings::default();
        let base = analysis_version(&geometry, &spectral, &color);
        assert!(base.starts_with("features_v1_"));
        assert_eq!(base, analysis_version(&geometry, &spectral, &color));

        let tuned = ColorSettings {
            peak_threshold: 20.0,
            ..ColorSettings::default()
        };
        assert_ne!(base, analysis_version(&geometry, &spectral, &tuned));

        let other = GeometryCache::build(32, 8, 2).unwrap();
        assert_ne!(base, analysis_version(&other, &spectral, &color));
    }
}
