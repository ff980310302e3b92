//! Feature label resolution.

use crate::dataset::{self, Dataset, Store};
use crate::error::AccessorError;
use crate::models::{Collection, Set};
use crate::node_path::NodePath;
use crate::shape;

use std::sync::Arc;
use zarrs::array::{Array, DataType};

impl Dataset {
    /// Returns the decoded feature labels of a (collection, set) pair.
    ///
    /// The labels are not checked against the shape of the observation array. Consumers that
    /// pair labels with feature indices should use [Dataset::feature_labels].
    ///
    /// # Arguments
    ///
    /// * `collection`: Collection of the labels
    /// * `set`: Set of the labels
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path().display()))]
    pub fn labels_of(&self, collection: Collection, set: Set) -> Result<Vec<String>, AccessorError> {
        let store = self.open_store()?;
        read_labels(&store, &self.label_path(collection, set))
    }

    /// Returns the feature labels of a (collection, set) pair, checked to have one label per
    /// feature.
    ///
    /// Fails with [AccessorError::LabelMismatch] when the label count differs from the number of
    /// features.
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path().display()))]
    pub fn feature_labels(
        &self,
        collection: Collection,
        set: Set,
    ) -> Result<Vec<String>, AccessorError> {
        let store = self.open_store()?;
        let (_, shape) = shape::open_core_array(&store, collection, set)?;
        let labels = read_labels(&store, &self.label_path(collection, set))?;
        check_labels(&labels, shape.features)?;
        Ok(labels)
    }

    /// Returns the path of the annotation vector under this dataset's layout.
    pub(crate) fn label_path(&self, collection: Collection, set: Set) -> NodePath {
        NodePath::column_annotations(collection, set, self.layout().label_kind.into())
    }
}

/// Fail with [AccessorError::LabelMismatch] unless there is exactly one label per feature.
pub(crate) fn check_labels(labels: &[String], features: usize) -> Result<(), AccessorError> {
    if labels.len() != features {
        return Err(AccessorError::LabelMismatch {
            labels: labels.len(),
            features,
        });
    }
    Ok(())
}

/// Read and decode the annotation vector at `path`.
///
/// String arrays are flattened in row-major order. Rank 2 `uint8` arrays hold one NUL-padded
/// byte string per row.
pub(crate) fn read_labels(
    store: &Arc<Store>,
    path: &NodePath,
) -> Result<Vec<String>, AccessorError> {
    dataset::require(store, path)?;
    let array = Array::open(store.clone(), path.as_str())?;
    match (array.data_type(), array.shape()) {
        (DataType::String, _) => {
            Ok(array.retrieve_array_subset_elements::<String>(&array.subset_all())?)
        }
        (DataType::UInt8, [rows, width]) => {
            let rows = usize::try_from(*rows)?;
            let width = usize::try_from(*width)?;
            if width == 0 {
                return Ok(vec![String::new(); rows]);
            }
            let bytes = array.retrieve_array_subset_elements::<u8>(&array.subset_all())?;
            decode_fixed_width(path, &bytes, width)
        }
        (data_type, _) => Err(AccessorError::UnsupportedDataType {
            path: path.clone(),
            data_type: format!("{data_type:?}"),
        }),
    }
}

/// Decode fixed-width, NUL-padded byte strings.
///
/// # Arguments
///
/// * `path`: Path of the annotation vector, for error reporting
/// * `bytes`: Row-major bytes, `width` per label
/// * `width`: Width of each label in bytes, greater than zero
fn decode_fixed_width(
    path: &NodePath,
    bytes: &[u8],
    width: usize,
) -> Result<Vec<String>, AccessorError> {
    bytes
        .chunks(width)
        .enumerate()
        .map(|(index, row)| {
            let end = row.iter().position(|b| *b == 0).unwrap_or(row.len());
            String::from_utf8(row[..end].to_vec()).map_err(|source| AccessorError::LabelDecode {
                path: path.clone(),
                index,
                source,
            })
        })
        .collect()
}
