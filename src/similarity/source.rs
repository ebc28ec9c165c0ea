//! Population suppliers for ranking.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::characteristics::CharacteristicVector;
use super::error::SimilarityError;

/// Identifier of a stored material.
pub type MaterialId = u64;

/// Anything that can hand out stored characteristic vectors.
pub trait CharacteristicsSource {
    /// Every stored material with its characteristics.
    fn all_characteristics(
        &self,
    ) -> Result<Vec<(MaterialId, CharacteristicVector)>, SimilarityError>;

    /// Characteristics of one material, `None` when the id is unknown.
    fn characteristics(
        &self,
        id: MaterialId,
    ) -> Result<Option<CharacteristicVector>, SimilarityError> {
        Ok(self
            .all_characteristics()?
            .into_iter()
            .find_map(|(candidate, vector)| (candidate == id).then_some(vector)))
    }
}

/// A stored material record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: MaterialId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub characteristics: CharacteristicVector,
}

/// In-memory catalog, typically loaded from a JSON array of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialCatalog {
    records: Vec<MaterialRecord>,
}

impl MaterialCatalog {
    pub fn new(records: Vec<MaterialRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(text: &str) -> Result<Self, SimilarityError> {
        serde_json::from_str(text)
            .map_err(|err| SimilarityError::Source(format!("invalid catalog JSON: {err}")))
    }

    pub fn load(path: &Path) -> Result<Self, SimilarityError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            SimilarityError::Source(format!("failed to read {}: {err}", path.display()))
        })?;
        let catalog = Self::from_json(&text)?;
        tracing::info!(
            materials = catalog.len(),
            "Loaded material catalog from {}",
            path.display()
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, record: MaterialRecord) {
        self.records.push(record);
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose name contains `name` (case-insensitive) and whose
    /// category is one of `categories`. Empty filters match everything.
    pub fn filter<'a>(
        &'a self,
        name: Option<&'a str>,
        categories: &'a [String],
    ) -> impl Iterator<Item = &'a MaterialRecord> + 'a {
        let needle = name.filter(|n| !n.is_empty()).map(str::to_lowercase);
        self.records.iter().filter(move |record| {
            let name_ok = needle
                .as_deref()
                .is_none_or(|needle| record.name.to_lowercase().contains(needle));
            let category_ok = categories.is_empty()
                || record
                    .category
                    .as_ref()
                    .is_some_and(|category| categories.contains(category));
            name_ok && category_ok
        })
    }
}

impl CharacteristicsSource for MaterialCatalog {
    fn all_characteristics(
        &self,
    ) -> Result<Vec<(MaterialId, CharacteristicVector)>, SimilarityError> {
        Ok(self
            .records
            .iter()
            .map(|record| (record.id, record.characteristics))
            .collect())
    }

    fn characteristics(
        &self,
        id: MaterialId,
    ) -> Result<Option<CharacteristicVector>, SimilarityError> {
        Ok(self.get(id).map(|record| record.characteristics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"id": 1, "name": "Oak_Veneer", "category": "WOOD",
         "characteristics": {"brightness": 0.5, "warmth": 1.0}},
        {"id": 7, "name": "Brushed_Steel", "category": "METAL",
         "characteristics": {"shininess": 2.0}}
    ]"#;

    #[test]
    fn parses_records_with_missing_fields_as_zero() {
        let catalog = MaterialCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        let oak = catalog.get(1).unwrap();
        assert_eq!(oak.characteristics.brightness, 0.5);
        assert_eq!(oak.characteristics.sparkle, 0.0);
    }

    #[test]
    fn lookup_by_id() {
        let catalog = MaterialCatalog::from_json(CATALOG).unwrap();
        assert_eq!(
            catalog.characteristics(7).unwrap().map(|c| c.shininess),
            Some(2.0)
        );
        assert_eq!(catalog.characteristics(3).unwrap(), None);
    }

    #[test]
    fn filters_by_name_and_category() {
        let catalog = MaterialCatalog::from_json(CATALOG).unwrap();
        let names: Vec<_> = catalog
            .filter(Some("steel"), &[])
            .map(|r| r.id)
            .collect();
        assert_eq!(names, vec![7]);
        let wood = vec!["WOOD".to_string()];
        assert_eq!(catalog.filter(None, &wood).count(), 1);
        assert_eq!(catalog.filter(Some("oak"), &["METAL".to_string()]).count(), 0);
        assert_eq!(catalog.filter(Some(""), &[]).count(), 2);
    }

    #[test]
    fn invalid_json_is_a_source_error() {
        assert!(matches!(
            MaterialCatalog::from_json("{"),
            Err(SimilarityError::Source(_))
        ));
    }
}
