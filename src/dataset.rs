//! Dataset handles and node existence.
//!
//! A [Dataset] owns no open resources. Every operation opens the underlying store read-only,
//! performs its reads and drops the store handle before returning, on success and failure alike.
//! Handles are therefore cheap to clone and safe to share between concurrent requests.

use crate::error::AccessorError;
use crate::models::{Collection, LabelKind, Set};
use crate::node_path::NodePath;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zarrs::filesystem::FilesystemStore;
use zarrs::node::{node_exists, NodePath as ZarrNodePath};

/// Store backing a dataset.
pub type Store = FilesystemStore;

/// Per-deployment layout conventions of a dataset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    /// Kind segment of the annotation vector node
    pub label_kind: LabelKind,
}

/// Existence of every known collection and set of a dataset.
#[derive(Debug, PartialEq, Serialize)]
pub struct NodeSummary {
    pub collections: BTreeMap<Collection, bool>,
    pub sets: BTreeMap<Collection, BTreeMap<Set, bool>>,
}

/// A handle to one hierarchical array store.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// Filesystem path of the store
    path: PathBuf,
    /// Layout conventions
    layout: Layout,
}

impl Dataset {
    /// Returns a new Dataset.
    ///
    /// Fails with [AccessorError::DatasetPathNotFound] if `path` does not exist.
    ///
    /// # Arguments
    ///
    /// * `path`: Filesystem path of the store
    /// * `layout`: Layout conventions of the store
    pub fn new(path: impl Into<PathBuf>, layout: Layout) -> Result<Self, AccessorError> {
        let path = path.into();
        if !path.exists() {
            return Err(AccessorError::DatasetPathNotFound { path });
        }
        Ok(Dataset { path, layout })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Open the store read-only.
    ///
    /// The returned handle is released when the last reference is dropped.
    pub(crate) fn open_store(&self) -> Result<Arc<Store>, AccessorError> {
        Ok(Arc::new(FilesystemStore::new(&self.path)?))
    }

    /// Returns whether the node at `path` and all of its ancestors exist.
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path.display()))]
    pub fn exists(&self, path: &NodePath) -> Result<bool, AccessorError> {
        let store = self.open_store()?;
        exists_in(&store, path)
    }

    /// Returns the existence of every known collection and set.
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path.display()))]
    pub fn summary(&self) -> Result<NodeSummary, AccessorError> {
        let store = self.open_store()?;
        let mut collections = BTreeMap::new();
        let mut sets = BTreeMap::new();
        for collection in Collection::ALL {
            let collection_exists = exists_in(&store, &NodePath::collection(collection))?;
            collections.insert(collection, collection_exists);
            let mut collection_sets = BTreeMap::new();
            for set in Set::ALL {
                let set_exists =
                    collection_exists && exists_in(&store, &NodePath::set(collection, set))?;
                collection_sets.insert(set, set_exists);
            }
            sets.insert(collection, collection_sets);
        }
        Ok(NodeSummary { collections, sets })
    }
}

/// Returns whether the node at `path` and all of its ancestors exist in an open store.
pub(crate) fn exists_in(store: &Arc<Store>, path: &NodePath) -> Result<bool, AccessorError> {
    // The root group is not required to carry metadata.
    for ancestor in path.ancestors().iter().skip(1) {
        let zarr_path = ZarrNodePath::new(ancestor.as_str())?;
        if !node_exists(store, &zarr_path)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Fail with [AccessorError::NodeNotFound] unless the node at `path` exists.
pub(crate) fn require(store: &Arc<Store>, path: &NodePath) -> Result<(), AccessorError> {
    if exists_in(store, path)? {
        Ok(())
    } else {
        Err(AccessorError::NodeNotFound { path: path.clone() })
    }
}
