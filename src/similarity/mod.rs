//! Similarity scoring and ranking over characteristic vectors.

pub mod characteristics;
pub mod error;
pub mod matcher;
pub mod oracle;
pub mod rank;
pub mod score;
pub mod source;

pub use characteristics::{CHARACTERISTIC_LEN, CHARACTERISTIC_NAMES, CharacteristicVector};
pub use error::SimilarityError;
pub use matcher::MaterialMatcher;
pub use oracle::RatingOracle;
pub use rank::{Ranked, rank};
pub use score::{DEFAULT_ALPHA, l1_distance, pearson, similarity};
pub use source::{CharacteristicsSource, MaterialCatalog, MaterialId, MaterialRecord};
