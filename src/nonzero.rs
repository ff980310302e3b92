//! Reduction of a visit to the features that were recorded.

use crate::dataset::Dataset;
use crate::error::AccessorError;
use crate::extract::{self, Selection};
use crate::labels;
use crate::models::{Cleanse, Collection, Set};

use ndarray::{Array2, ArrayView2, Axis, Ix2};

/// Feature columns of one visit holding at least one nonzero value.
///
/// `feature_ids`, `labels` and the columns of `values` are aligned and in increasing order of
/// original feature index.
#[derive(Clone, Debug, PartialEq)]
pub struct NonzeroFeatures {
    /// `[timepoints, kept features]` values
    pub values: Array2<f64>,
    /// Original index of each kept feature
    pub feature_ids: Vec<usize>,
    /// Label of each kept feature
    pub labels: Vec<String>,
}

/// Returns the indices of the columns of `values` holding at least one nonzero value.
///
/// NaN counts as nonzero.
pub fn nonzero_columns(values: ArrayView2<f64>) -> Vec<usize> {
    values
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, column)| column.iter().any(|value| *value != 0.0))
        .map(|(index, _)| index)
        .collect()
}

impl Dataset {
    /// Returns the features of a visit with at least one nonzero value, with their original
    /// indices and labels.
    ///
    /// The time channel is a feature like any other here.
    ///
    /// # Arguments
    ///
    /// * `collection`: Collection of the observation array
    /// * `set`: Set of the observation array
    /// * `visit`: Index of the visit
    #[tracing::instrument(level = "DEBUG", skip(self), fields(dataset = %self.path().display()))]
    pub fn nonzero_features(
        &self,
        collection: Collection,
        set: Set,
        visit: i64,
    ) -> Result<NonzeroFeatures, AccessorError> {
        let store = self.open_store()?;
        let series = extract::extract_in(
            &store,
            collection,
            set,
            &Selection::visit(visit),
            Cleanse::Keep,
        )?;
        let values = series.y.into_dimensionality::<Ix2>()?;
        let all_labels = labels::read_labels(&store, &self.label_path(collection, set))?;
        labels::check_labels(&all_labels, values.ncols())?;

        let feature_ids = nonzero_columns(values.view());
        let values = if feature_ids.is_empty() {
            Array2::zeros((values.nrows(), 0))
        } else {
            values.select(Axis(1), &feature_ids)
        };
        let labels: Vec<String> = feature_ids
            .iter()
            .map(|id| all_labels[*id].clone())
            .collect();
        if values.ncols() != labels.len() || feature_ids.len() != labels.len() {
            return Err(AccessorError::LabelMismatch {
                labels: labels.len(),
                features: values.ncols(),
            });
        }
        tracing::debug!(kept = feature_ids.len(), of = all_labels.len(), "nonzero features");
        Ok(NonzeroFeatures {
            values,
            feature_ids,
            labels,
        })
    }
}
