//! Feature extraction from observation arrays.
//!
//! The time channel is the last feature of an observation array. Extraction pairs the time
//! channel (`x`) with the selected feature values (`y`) over the selected visits.

use crate::array;
use crate::dataset::{Dataset, Store};
use crate::error::AccessorError;
use crate::models::{Cleanse, Collection, Set};
use crate::node_path::NodePath;
use crate::shape;

use ndarray::{Array1, ArrayD, Axis, Ix1};
use std::ops::Range;
use std::sync::Arc;

/// Visits and features to extract.
///
/// [None] selects every index along the axis, an index removes the axis from the result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    pub visit: Option<i64>,
    pub feature: Option<i64>,
}

impl Selection {
    /// Select every feature of one visit.
    pub fn visit(visit: i64) -> Self {
        Selection {
            visit: Some(visit),
            feature: None,
        }
    }

    /// Select one feature of one visit.
    pub fn series(visit: i64, feature: i64) -> Self {
        Selection {
            visit: Some(visit),
            feature: Some(feature),
        }
    }

    fn is_series(&self) -> bool {
        self.visit.is_some() && self.feature.is_some()
    }
}

/// Time channel values and feature values of a selection.
///
/// `x` has shape `[visits, timepoints]` and `y` has shape `[visits, timepoints, features]`, with
/// the selected axes removed. For a single visit and feature both are one dimensional and of
/// equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub x: ArrayD<f64>,
    pub y: ArrayD<f64>,
}

impl Series {
    /// Returns the `(x, y)` pairs of a one dimensional series.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Drop every point where either coordinate is NaN or both are zero.
    ///
    /// Only applies to one dimensional series.
    fn cleansed(self) -> Result<Series, AccessorError> {
        let x = self
            .x
            .into_dimensionality::<Ix1>()
            .map_err(|_| AccessorError::CleanseRequiresSeries)?;
        let y = self
            .y
            .into_dimensionality::<Ix1>()
            .map_err(|_| AccessorError::CleanseRequiresSeries)?;
        let (x, y): (Vec<f64>, Vec<f64>) = x
            .iter()
            .copied()
            .zip(y.iter().copied())
            .filter(|(x, y)| is_valid_point(*x, *y))
            .unzip();
        Ok(Series {
            x: Array1::from(x).into_dyn(),
            y: Array1::from(y).into_dyn(),
        })
    }
}

/// Returns whether a point survives cleansing.
pub fn is_valid_point(x: f64, y: f64) -> bool {
    !(x.is_nan() || y.is_nan() || (x == 0.0 && y == 0.0))
}

impl Dataset {
    /// Extract the time channel and feature values of a selection.
    ///
    /// # Arguments
    ///
    /// * `collection`: Collection of the observation array
    /// * `set`: Set of the observation array
    /// * `selection`: Visits and features to extract
    /// * `cleanse`: Whether to drop invalid points. Requires both a visit and a feature.
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path().display()))]
    pub fn extract(
        &self,
        collection: Collection,
        set: Set,
        selection: &Selection,
        cleanse: Cleanse,
    ) -> Result<Series, AccessorError> {
        if cleanse == Cleanse::DropInvalid && !selection.is_series() {
            return Err(AccessorError::CleanseRequiresSeries);
        }
        let store = self.open_store()?;
        extract_in(&store, collection, set, selection, cleanse)
    }
}

/// Returns the range of one axis covered by an optional index.
///
/// # Arguments
///
/// * `axis`: Name of the axis, for error reporting
/// * `index`: Selected index, or [None] for the whole axis
/// * `bound`: Length of the axis
fn axis_range(
    axis: &'static str,
    index: Option<i64>,
    bound: usize,
) -> Result<Range<u64>, AccessorError> {
    let length = u64::try_from(bound)?;
    match index {
        None => Ok(0..length),
        Some(index) => match u64::try_from(index) {
            Ok(i) if i < length => Ok(i..i + 1),
            _ => Err(AccessorError::OutOfRange { axis, index, bound }),
        },
    }
}

/// Extract a selection from an open store.
pub(crate) fn extract_in(
    store: &Arc<Store>,
    collection: Collection,
    set: Set,
    selection: &Selection,
    cleanse: Cleanse,
) -> Result<Series, AccessorError> {
    let path = NodePath::core_array(collection, set);
    let (core_array, shape) = shape::open_core_array(store, collection, set)?;
    let visits = axis_range("visit", selection.visit, shape.visits)?;
    let features = axis_range("feature", selection.feature, shape.features)?;
    if shape.features == 0 {
        return Err(AccessorError::NoTimeChannel { path });
    }
    let timepoints = 0..u64::try_from(shape.timepoints)?;
    let time_channel = u64::try_from(shape.features - 1)?;

    let read = |ranges: &[Range<u64>]| -> Result<ArrayD<f64>, AccessorError> {
        let data = array::retrieve_f64(&core_array, &path, ranges)?;
        array::build_array_from_shape(&array::ranges_shape(ranges)?, data)
    };
    let mut x = read(&[visits.clone(), timepoints.clone(), time_channel..time_channel + 1])?
        .index_axis_move(Axis(2), 0);
    let mut y = read(&[visits, timepoints, features])?;
    if selection.feature.is_some() {
        y = y.index_axis_move(Axis(2), 0);
    }
    if selection.visit.is_some() {
        x = x.index_axis_move(Axis(0), 0);
        y = y.index_axis_move(Axis(0), 0);
    }
    tracing::debug!(shape = ?y.shape(), "extracted");

    let series = Series { x, y };
    match cleanse {
        Cleanse::Keep => Ok(series),
        Cleanse::DropInvalid => series.cleansed(),
    }
}
