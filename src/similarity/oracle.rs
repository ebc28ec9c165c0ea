use image::RgbImage;

use super::characteristics::CharacteristicVector;
use super::error::SimilarityError;

/// Maps a non-specular and a specular photo of one material to its ratings.
///
/// Implementations wrap the learned rating model and are treated as opaque.
pub trait RatingOracle {
    fn rate(
        &self,
        non_specular: &RgbImage,
        specular: &RgbImage,
    ) -> Result<CharacteristicVector, SimilarityError>;
}

impl<F> RatingOracle for F
where
    F: Fn(&RgbImage, &RgbImage) -> Result<CharacteristicVector, SimilarityError>,
{
    fn rate(
        &self,
        non_specular: &RgbImage,
        specular: &RgbImage,
    ) -> Result<CharacteristicVector, SimilarityError> {
        self(non_specular, specular)
    }
}
