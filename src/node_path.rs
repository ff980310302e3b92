//! Canonical hierarchical keys of dataset nodes.

use crate::models::{Collection, NodeKind, NodeName, Set};

/// Root group under which every collection is stored.
const ROOT: &str = "/data";

/// A hierarchical key addressing one group, array or annotation vector inside a dataset.
///
/// Construction never fails and never touches the store. A path only means something once
/// [crate::dataset::Dataset::exists] has confirmed it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NodePath(String);

impl NodePath {
    /// Returns the path of a collection group, `/data/{collection}`.
    pub fn collection(collection: Collection) -> Self {
        NodePath(format!("{ROOT}/{collection}"))
    }

    /// Returns the path of a set group, `/data/{collection}/{set}`.
    pub fn set(collection: Collection, set: Set) -> Self {
        NodePath(format!("{ROOT}/{collection}/{set}"))
    }

    /// Returns the path of a leaf node, `/data/{collection}/{set}/{kind}/{name}`.
    ///
    /// # Arguments
    ///
    /// * `collection`: Collection containing the node
    /// * `set`: Set containing the node
    /// * `kind`: Kind segment
    /// * `name`: Name segment
    pub fn resolve(collection: Collection, set: Set, kind: NodeKind, name: NodeName) -> Self {
        NodePath(format!("{ROOT}/{collection}/{set}/{kind}/{name}"))
    }

    /// Returns the path of the observation array of a (collection, set) pair.
    pub fn core_array(collection: Collection, set: Set) -> Self {
        Self::resolve(collection, set, NodeKind::Sequence, NodeName::CoreArray)
    }

    /// Returns the path of the annotation vector of a (collection, set) pair.
    pub fn column_annotations(collection: Collection, set: Set, kind: NodeKind) -> Self {
        Self::resolve(collection, set, kind, NodeName::ColumnAnnotations)
    }

    /// Returns this path and each of its ancestors, root first.
    pub fn ancestors(&self) -> Vec<NodePath> {
        let mut paths = vec![NodePath("/".to_string())];
        let mut current = String::new();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            paths.push(NodePath(current.clone()));
        }
        paths
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
