use serde_json::Value;

use crate::domain::assessment::CatalogItem;
use crate::repository::{
    CatalogReader, CatalogWriter, FileRepository, RepositoryError, RepositoryResult,
};

/// Fields every snapshot item must carry as non-null strings.
const REQUIRED_FIELDS: [&str; 3] = ["assessment_name", "description", "url"];

/// Converts raw snapshot values into items, failing on the first malformed one.
pub fn items_from_values(values: Vec<Value>) -> RepositoryResult<Vec<CatalogItem>> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            for field in REQUIRED_FIELDS {
                if !value.get(field).is_some_and(Value::is_string) {
                    return Err(RepositoryError::MalformedSnapshot {
                        position,
                        reason: format!("missing required field `{field}`"),
                    });
                }
            }
            serde_json::from_value(value).map_err(|e| RepositoryError::MalformedSnapshot {
                position,
                reason: e.to_string(),
            })
        })
        .collect()
}

impl CatalogReader for FileRepository {
    fn list_items(&self) -> RepositoryResult<Vec<CatalogItem>> {
        let values: Vec<Value> = Self::read_json(&self.corpus_path)?;
        let items = items_from_values(values)?;
        log::info!(
            "Loaded {} catalog items from {}",
            items.len(),
            self.corpus_path.display()
        );
        Ok(items)
    }
}

impl CatalogWriter for FileRepository {
    fn save_items(&self, items: &[CatalogItem]) -> RepositoryResult<usize> {
        Self::write_json(&self.corpus_path, items)?;
        Ok(items.len())
    }
}
