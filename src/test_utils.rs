//! Fixture stores for unit tests.
//!
//! [fixture] writes a small dataset to a temporary directory:
//!
//! * `raw/train`: `[10, 6, 4]` `float64` observations, see [train_value]. String labels.
//! * `raw/test`: `[2, 5, 3]` `float64` observations with invalid points for cleansing, see
//!   [TEST_VALUES]. Fixed-width `uint8` labels.
//! * `processed/train`: `[2, 3, 4]` observations with only three labels.
//! * `processed/test`: a rank 2 observation array.
//! * `raw/validation` and `processed/validation` are absent.

use crate::dataset::{Dataset, Layout};
use crate::models::{Collection, LabelKind, Set};
use crate::node_path::NodePath;

use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use zarrs::array::chunk_grid::ChunkGrid;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::filesystem::FilesystemStore;
use zarrs::group::GroupBuilder;
use zarrs::storage::ReadableWritableListableStorage;

/// Shape of the `raw/train` observation array.
pub(crate) const TRAIN_SHAPE: [usize; 3] = [10, 6, 4];

/// Labels of the `raw/train` features.
pub(crate) const TRAIN_LABELS: [&str; 4] = ["Hematocrit", "Serum sodium", "Serum pH", "Time"];

/// Labels of the `raw/test` features.
pub(crate) const TEST_LABELS: [&str; 3] = ["Urobilin", "Glucose", "Time"];

/// Shape of the `raw/test` observation array.
pub(crate) const TEST_SHAPE: [u64; 3] = [2, 5, 3];

/// Row-major observations of `raw/test`.
///
/// Visit 0 pairs time `[0, 1, 2, NaN, 0]` with feature 0 values `[0, 2, NaN, 4, 7]`, so
/// cleansing keeps timepoints 1 and 4. Feature 1 is zero throughout visit 0.
#[rustfmt::skip]
pub(crate) const TEST_VALUES: [f64; 30] = [
    // visit 0
    0.0, 0.0, 0.0,
    2.0, 0.0, 1.0,
    f64::NAN, 0.0, 2.0,
    4.0, 0.0, f64::NAN,
    7.0, 0.0, 0.0,
    // visit 1
    1.0, 5.0, 0.0,
    1.0, 5.0, 1.0,
    1.0, 5.0, 2.0,
    1.0, 5.0, 3.0,
    1.0, 5.0, 4.0,
];

/// Layout of every fixture dataset.
pub(crate) fn layout() -> Layout {
    Layout {
        label_kind: LabelKind::Sequence,
    }
}

/// Value of the `raw/train` observation array at `[visit, timepoint, feature]`.
///
/// The last feature is the time channel, holding half the timepoint index. Feature 2 is zero
/// throughout visit 5. Every other value is positive.
pub(crate) fn train_value(visit: usize, timepoint: usize, feature: usize) -> f64 {
    match (visit, feature) {
        (_, 3) => timepoint as f64 * 0.5,
        (5, 2) => 0.0,
        _ => (visit * 100 + timepoint * 10 + feature) as f64 + 1.0,
    }
}

/// Returns a temporary store containing only a root group, and a dataset over it.
pub(crate) fn empty_fixture() -> (TempDir, Dataset) {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), "/");
    let dataset = Dataset::new(dir.path(), layout()).unwrap();
    (dir, dataset)
}

/// Returns a temporary store populated as described in the module docs, and a dataset over it.
pub(crate) fn fixture() -> (TempDir, Dataset) {
    let (dir, dataset) = empty_fixture();
    let root = dir.path();

    let [visits, timepoints, features] = TRAIN_SHAPE;
    let mut train = Vec::with_capacity(visits * timepoints * features);
    for v in 0..visits {
        for t in 0..timepoints {
            for f in 0..features {
                train.push(train_value(v, t, f));
            }
        }
    }
    let shape: Vec<u64> = TRAIN_SHAPE.iter().map(|n| *n as u64).collect();
    write_core_array(root, Collection::Raw, Set::Train, &shape, &train);
    write_string_array(root, &labels_path(Collection::Raw, Set::Train), &TRAIN_LABELS);

    write_core_array(root, Collection::Raw, Set::Test, &TEST_SHAPE, &TEST_VALUES);
    write_fixed_width_labels(root, &labels_path(Collection::Raw, Set::Test), &TEST_LABELS, 10);

    write_core_array(
        root,
        Collection::Processed,
        Set::Train,
        &[2, 3, 4],
        &[1.0; 24],
    );
    write_string_array(
        root,
        &labels_path(Collection::Processed, Set::Train),
        &["a", "b", "c"],
    );

    write_core_array(root, Collection::Processed, Set::Test, &[4, 4], &[1.0; 16]);

    (dir, dataset)
}

fn labels_path(collection: Collection, set: Set) -> String {
    NodePath::column_annotations(collection, set, layout().label_kind.into()).to_string()
}

fn open(dir: &Path) -> ReadableWritableListableStorage {
    Arc::new(FilesystemStore::new(dir).unwrap())
}

fn make_chunk_grid(shape: &[u64]) -> ChunkGrid {
    let chunk_shape: Vec<NonZeroU64> = shape
        .iter()
        .map(|&n| NonZeroU64::new(n.max(1)).unwrap())
        .collect();
    ChunkGrid::from(chunk_shape)
}

/// Write group metadata at `path`.
pub(crate) fn write_group(dir: &Path, path: &str) {
    GroupBuilder::new()
        .build(open(dir), path)
        .unwrap()
        .store_metadata()
        .unwrap();
}

/// Write group metadata for every ancestor of `path`, excluding the root.
fn write_parent_groups(dir: &Path, path: &str) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for end in 1..segments.len() {
        write_group(dir, &format!("/{}", segments[..end].join("/")));
    }
}

macro_rules! write_array {
    ($dir:expr, $path:expr, $shape:expr, $data_type:expr, $fill:expr, $element:ty, $data:expr) => {{
        let shape: &[u64] = $shape;
        let array = ArrayBuilder::new(
            shape.to_vec(),
            $data_type,
            make_chunk_grid(shape),
            FillValue::from($fill),
        )
        .build(open($dir), $path)
        .unwrap();
        array.store_metadata().unwrap();
        if shape.iter().product::<u64>() > 0 {
            array
                .store_array_subset_elements::<$element>(&array.subset_all(), $data)
                .unwrap();
        }
    }};
}

/// Write a `float64` observation array of any rank, with its parent groups.
pub(crate) fn write_core_array(
    dir: &Path,
    collection: Collection,
    set: Set,
    shape: &[u64],
    data: &[f64],
) {
    let path = NodePath::core_array(collection, set).to_string();
    write_parent_groups(dir, &path);
    write_array!(dir, &path, shape, DataType::Float64, 0.0f64, f64, data);
}

/// Write an `int32` observation array, with its parent groups.
pub(crate) fn write_i32_core_array(
    dir: &Path,
    collection: Collection,
    set: Set,
    shape: [u64; 3],
    data: &[i32],
) {
    let path = NodePath::core_array(collection, set).to_string();
    write_parent_groups(dir, &path);
    write_array!(dir, &path, &shape, DataType::Int32, 0i32, i32, data);
}

/// Write a `float16` observation array, with its parent groups.
pub(crate) fn write_f16_core_array(
    dir: &Path,
    collection: Collection,
    set: Set,
    shape: [u64; 3],
    data: &[half::f16],
) {
    let path = NodePath::core_array(collection, set).to_string();
    write_parent_groups(dir, &path);
    write_array!(dir, &path, &shape, DataType::Float16, half::f16::ZERO, half::f16, data);
}

/// Write a `bool` observation array, with its parent groups.
pub(crate) fn write_bool_core_array(
    dir: &Path,
    collection: Collection,
    set: Set,
    shape: [u64; 3],
    data: &[bool],
) {
    let path = NodePath::core_array(collection, set).to_string();
    write_parent_groups(dir, &path);
    write_array!(dir, &path, &shape, DataType::Bool, false, bool, data);
}

/// Write a rank 1 string array, with its parent groups.
pub(crate) fn write_string_array(dir: &Path, path: &str, values: &[&str]) {
    write_parent_groups(dir, path);
    let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
    let shape = [values.len() as u64];
    write_array!(dir, path, &shape, DataType::String, "", String, &values);
}

/// Write labels as a `[labels, width]` `uint8` array of NUL-padded rows, with its parent
/// groups.
pub(crate) fn write_fixed_width_labels(dir: &Path, path: &str, labels: &[&str], width: usize) {
    write_parent_groups(dir, path);
    let mut bytes = Vec::with_capacity(labels.len() * width);
    for label in labels {
        assert!(label.len() <= width);
        bytes.extend_from_slice(label.as_bytes());
        bytes.resize(bytes.len() + width - label.len(), 0);
    }
    let shape = [labels.len() as u64, width as u64];
    write_array!(dir, path, &shape, DataType::UInt8, 0u8, u8, &bytes);
}

/// Write a `[1, 1, 1]` array at `path` without any parent group metadata.
pub(crate) fn write_orphan_array(dir: &Path, path: &str) {
    write_array!(dir, path, &[1, 1, 1], DataType::Float64, 0.0f64, f64, &[1.0]);
}
