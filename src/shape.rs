//! Shape validation of observation arrays.

use crate::dataset::{self, Dataset, Store};
use crate::error::AccessorError;
use crate::models::{Collection, Set};
use crate::node_path::NodePath;

use std::sync::Arc;
use zarrs::array::Array;

/// Rank of every observation array.
pub const RANK: usize = 3;

/// Axis lengths of an observation array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Shape {
    pub visits: usize,
    pub timepoints: usize,
    /// Number of feature channels, including the time channel.
    pub features: usize,
}

impl Shape {
    /// Map raw axis lengths to domain dimensions.
    ///
    /// Fails with [AccessorError::InvalidRank] unless there are exactly three axes.
    ///
    /// # Arguments
    ///
    /// * `path`: Path of the array, for error reporting
    /// * `raw`: Raw axis lengths
    pub fn from_raw(path: &NodePath, raw: &[u64]) -> Result<Self, AccessorError> {
        match raw {
            [visits, timepoints, features] => Ok(Shape {
                visits: usize::try_from(*visits)?,
                timepoints: usize::try_from(*timepoints)?,
                features: usize::try_from(*features)?,
            }),
            _ => Err(AccessorError::InvalidRank {
                path: path.clone(),
                rank: raw.len(),
            }),
        }
    }

    pub fn as_array(&self) -> [usize; RANK] {
        [self.visits, self.timepoints, self.features]
    }
}

impl Dataset {
    /// Returns the validated shape of the observation array of a (collection, set) pair.
    ///
    /// # Arguments
    ///
    /// * `collection`: Collection of the array
    /// * `set`: Set of the array
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path().display()))]
    pub fn shape_of(&self, collection: Collection, set: Set) -> Result<Shape, AccessorError> {
        let store = self.open_store()?;
        let (_, shape) = open_core_array(&store, collection, set)?;
        Ok(shape)
    }
}

/// Open the observation array of a (collection, set) pair and validate its shape.
///
/// Existence is checked before the array metadata is read.
pub(crate) fn open_core_array(
    store: &Arc<Store>,
    collection: Collection,
    set: Set,
) -> Result<(Array<Store>, Shape), AccessorError> {
    let path = NodePath::core_array(collection, set);
    dataset::require(store, &path)?;
    let array = Array::open(store.clone(), path.as_str())?;
    let shape = Shape::from_raw(&path, array.shape())?;
    Ok((array, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn path() -> NodePath {
        NodePath::core_array(Collection::Raw, Set::Train)
    }

    #[test]
    fn from_raw_rank_3() {
        let shape = Shape::from_raw(&path(), &[10, 6, 4]).unwrap();
        assert_eq!(
            Shape {
                visits: 10,
                timepoints: 6,
                features: 4
            },
            shape
        );
        assert_eq!([10, 6, 4], shape.as_array());
    }

    #[test]
    fn from_raw_empty_axes() {
        let shape = Shape::from_raw(&path(), &[0, 0, 0]).unwrap();
        assert_eq!([0, 0, 0], shape.as_array());
    }

    #[test]
    fn from_raw_wrong_rank() {
        for raw in [vec![], vec![4], vec![10, 4], vec![10, 6, 4, 1]] {
            match Shape::from_raw(&path(), &raw).unwrap_err() {
                AccessorError::InvalidRank { path: p, rank } => {
                    assert_eq!(path(), p);
                    assert_eq!(raw.len(), rank);
                }
                err => panic!("unexpected error {err:?}"),
            }
        }
    }

    #[test]
    fn shape_of() {
        let (_dir, dataset) = test_utils::fixture();
        let shape = dataset.shape_of(Collection::Raw, Set::Train).unwrap();
        assert_eq!(test_utils::TRAIN_SHAPE, shape.as_array());
    }

    #[test]
    fn shape_of_rank_2() {
        let (_dir, dataset) = test_utils::fixture();
        match dataset
            .shape_of(Collection::Processed, Set::Test)
            .unwrap_err()
        {
            AccessorError::InvalidRank { rank, .. } => assert_eq!(2, rank),
            err => panic!("unexpected error {err:?}"),
        }
    }

    #[test]
    fn shape_of_missing_node() {
        let (_dir, dataset) = test_utils::fixture();
        match dataset
            .shape_of(Collection::Raw, Set::Validation)
            .unwrap_err()
        {
            AccessorError::NodeNotFound { path } => assert_eq!(
                NodePath::core_array(Collection::Raw, Set::Validation),
                path
            ),
            err => panic!("unexpected error {err:?}"),
        }
    }
}
