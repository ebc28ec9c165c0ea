//! Ranking entry points over an injected population supplier.

use image::RgbImage;

use super::characteristics::CharacteristicVector;
use super::error::SimilarityError;
use super::oracle::RatingOracle;
use super::rank::{Ranked, rank};
use super::score::DEFAULT_ALPHA;
use super::source::{CharacteristicsSource, MaterialId};

/// Finds the stored materials most similar to a target.
pub struct MaterialMatcher<S> {
    source: S,
    alpha: f64,
}

impl<S: CharacteristicsSource> MaterialMatcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            alpha: DEFAULT_ALPHA,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Rank every stored material against explicit characteristics.
    pub fn rank_characteristics(
        &self,
        target: &CharacteristicVector,
    ) -> Result<Vec<Ranked<MaterialId>>, SimilarityError> {
        let population: Vec<(MaterialId, [f64; 16])> = self
            .source
            .all_characteristics()?
            .into_iter()
            .map(|(id, vector)| (id, vector.to_array()))
            .collect();
        let ranked = rank(&target.to_array(), &population, self.alpha)?;
        tracing::debug!(candidates = ranked.len(), "Ranked material population");
        Ok(ranked)
    }

    /// Rank against a stored material; `None` when `id` is unknown.
    ///
    /// The material itself is part of the population and normally ranks first.
    pub fn rank_by_id(
        &self,
        id: MaterialId,
    ) -> Result<Option<Vec<Ranked<MaterialId>>>, SimilarityError> {
        let Some(target) = self.source.characteristics(id)? else {
            tracing::debug!(id, "No stored material with this id");
            return Ok(None);
        };
        self.rank_characteristics(&target).map(Some)
    }

    /// Rate two photos with the oracle, then rank against the result.
    pub fn rank_images(
        &self,
        oracle: &dyn RatingOracle,
        non_specular: &RgbImage,
        specular: &RgbImage,
    ) -> Result<(CharacteristicVector, Vec<Ranked<MaterialId>>), SimilarityError> {
        let target = oracle.rate(non_specular, specular)?;
        let ranked = self.rank_characteristics(&target)?;
        Ok((target, ranked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::source::{MaterialCatalog, MaterialRecord};

    fn record(id: MaterialId, fill: f64, bump: usize) -> MaterialRecord {
        let mut values = [fill; 16];
        values[bump] += 1.0;
        MaterialRecord {
            id,
            name: format!("material_{id}"),
            category: None,
            characteristics: CharacteristicVector::from_array(values),
        }
    }

    fn matcher() -> MaterialMatcher<MaterialCatalog> {
        MaterialMatcher::new(MaterialCatalog::new(vec![
            record(10, 2.0, 3),
            record(11, 0.0, 0),
            record(12, -1.0, 15),
        ]))
    }

    #[test]
    fn rank_by_id_puts_the_material_first() {
        let ranked = matcher().rank_by_id(12).unwrap().unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].id, 12);
        assert!((ranked[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_id_is_none() {
        assert_eq!(matcher().rank_by_id(99).unwrap(), None);
    }

    #[test]
    fn rank_images_uses_the_oracle() {
        let oracle = |_: &RgbImage, _: &RgbImage| -> Result<CharacteristicVector, SimilarityError> {
            let mut values = [0.0; 16];
            values[0] = 1.0;
            Ok(CharacteristicVector::from_array(values))
        };
        let image = RgbImage::new(1, 1);
        let (target, ranked) = matcher().rank_images(&oracle, &image, &image).unwrap();
        assert_eq!(target.brightness, 1.0);
        assert_eq!(ranked[0].id, 11);
    }

    #[test]
    fn oracle_errors_propagate() {
        let oracle = |_: &RgbImage, _: &RgbImage| -> Result<CharacteristicVector, SimilarityError> {
            Err(SimilarityError::Oracle("model unavailable".into()))
        };
        let image = RgbImage::new(1, 1);
        assert_eq!(
            matcher().rank_images(&oracle, &image, &image).unwrap_err(),
            SimilarityError::Oracle("model unavailable".into())
        );
    }

    #[test]
    fn alpha_is_applied() {
        let matcher = matcher().with_alpha(0.0);
        assert_eq!(matcher.alpha(), 0.0);
        let ranked = matcher.rank_by_id(11).unwrap().unwrap();
        assert_eq!(ranked[0].id, 11);
        assert_eq!(ranked[0].score, 1.0);
    }
}
