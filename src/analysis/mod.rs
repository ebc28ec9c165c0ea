//! Descriptor extraction for material photos (geometry, spectrum, color, statistics).

pub mod color;
pub mod error;
pub mod features;
pub(crate) mod fft;
pub mod geometry;
pub mod image;
pub mod luminance;
pub mod normalize;
pub mod peaks;
pub mod spectral;
pub mod vector;
pub mod version;

pub use color::{ColorFeatures, ColorSettings};
pub use error::AnalysisError;
pub use features::{FeatureExtractor, ImageStatistics, MaterialFeatures};
pub use geometry::{CANONICAL_RESOLUTION, GeometryCache};
pub use image::PerceptualImage;
pub use luminance::LuminanceStats;
pub use normalize::{FeatureNormalizer, PairNormalizer};
pub use spectral::{SpectralFeatures, SpectralSettings};
pub use vector::{FEATURE_NAMES, FEATURE_VECTOR_LEN, FeatureVector};
pub use version::analysis_version;
