//! Registry of the datasets served by this process.
//!
//! The registry is built once at startup from configuration and never mutated afterwards.

use crate::dataset::{Dataset, Layout};
use crate::error::AccessorError;

use expanduser::expanduser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// A dataset registration of the form `ID=PATH`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatasetSource {
    pub id: String,
    pub path: PathBuf,
}

impl FromStr for DatasetSource {
    type Err = String;

    /// Parse `ID=PATH`, expanding a leading `~` in the path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=PATH but got '{s}'"))?;
        let id = id.trim();
        let path = path.trim();
        if id.is_empty() || path.is_empty() {
            return Err(format!("expected ID=PATH but got '{s}'"));
        }
        let path = expanduser(path).map_err(|err| format!("failed to expand '{path}': {err}"))?;
        Ok(DatasetSource {
            id: id.to_string(),
            path,
        })
    }
}

/// Read-only mapping of dataset identifiers to dataset handles.
#[derive(Clone, Debug)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, Dataset>,
}

impl DatasetRegistry {
    /// Returns a new DatasetRegistry.
    ///
    /// Fails if there are no sources, or any source path does not exist. Later registrations of
    /// an identifier replace earlier ones.
    ///
    /// # Arguments
    ///
    /// * `sources`: Dataset registrations
    /// * `layout`: Layout conventions shared by every dataset
    pub fn new(sources: &[DatasetSource], layout: Layout) -> Result<Self, AccessorError> {
        if sources.is_empty() {
            return Err(AccessorError::NoDatasets);
        }
        let mut datasets = BTreeMap::new();
        for source in sources {
            let dataset = Dataset::new(source.path.clone(), layout)?;
            tracing::info!(id = %source.id, path = %source.path.display(), "registered dataset");
            datasets.insert(source.id.clone(), dataset);
        }
        Ok(DatasetRegistry { datasets })
    }

    /// Returns the registered identifiers in ascending order.
    pub fn ids(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    /// Returns the dataset registered as `id`.
    pub fn get(&self, id: &str) -> Result<&Dataset, AccessorError> {
        self.datasets
            .get(id)
            .ok_or_else(|| AccessorError::DatasetNotFound { id: id.to_string() })
    }
}
