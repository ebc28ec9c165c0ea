//! Statistical fingerprints of material photographs and similarity ranking.
//!
//! [`analysis`] turns an RGB photo into a fixed 14-value descriptor using the
//! lightness power spectrum, a precomputed sector/ring geometry, color
//! histograms and topological peak counting. [`similarity`] scores and ranks
//! 16-value characteristic vectors produced by an external rating model.

/// Descriptor extraction.
pub mod analysis;
/// Application directory resolution.
pub mod app_dirs;
/// TOML analysis settings.
pub mod config;
/// Tracing subscriber setup.
pub mod logging;
/// Scoring and ranking of characteristic vectors.
pub mod similarity;
