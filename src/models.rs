//! Data types and associated functions and methods

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use validator::{Validate, ValidationError};

/// Top-level logical partition of a dataset.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    /// Observations as recorded
    Raw,
    /// Observations after preprocessing
    Processed,
}

impl Collection {
    /// Every known collection, in the order they are reported.
    pub const ALL: [Collection; 2] = [Collection::Raw, Collection::Processed];
}

/// Logical partition within a collection.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Set {
    /// Training split
    Train,
    /// Test split
    Test,
    /// Validation split (only present in some datasets)
    Validation,
}

impl Set {
    /// Every known set, in the order they are reported.
    pub const ALL: [Set; 3] = [Set::Train, Set::Test, Set::Validation];
}

/// Kind segment of a node path.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Sequence,
    RawSequence,
    Target,
    Identifiers,
}

/// Name segment of a node path.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum NodeName {
    /// The rank 3 observation array
    CoreArray,
    /// The per-feature annotation vector
    ColumnAnnotations,
}

/// Kind segment under which a deployment stores its feature annotations.
///
/// Deployments disagree on this, so it has no default and must be configured.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LabelKind {
    /// `/data/{collection}/{set}/sequence/column_annotations`
    Sequence,
    /// `/data/{collection}/{set}/target/column_annotations`
    Target,
}

impl From<LabelKind> for NodeKind {
    fn from(kind: LabelKind) -> Self {
        match kind {
            LabelKind::Sequence => NodeKind::Sequence,
            LabelKind::Target => NodeKind::Target,
        }
    }
}

/// Cleansing policy applied to an extracted feature series.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Cleanse {
    /// Return every timepoint unchanged.
    Keep,
    /// Drop timepoints where either value is NaN, or where time and value are both zero.
    DropInvalid,
}

/// Path parameters identifying a dataset.
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct DatasetParams {
    /// Registered dataset identifier
    #[validate(custom = "validate_dataset_id")]
    pub dataset: String,
}

/// Path parameters identifying a (collection, set) pair of a dataset.
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct SetParams {
    /// Registered dataset identifier
    #[validate(custom = "validate_dataset_id")]
    pub dataset: String,
    pub collection: Collection,
    pub set: Set,
}

/// Path parameters identifying one visit of a (collection, set) pair.
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct VisitParams {
    /// Registered dataset identifier
    #[validate(custom = "validate_dataset_id")]
    pub dataset: String,
    pub collection: Collection,
    pub set: Set,
    /// Visit index. Signed, so that negative values are reported with the valid interval.
    pub visit: i64,
}

/// Path parameters identifying one feature of one visit.
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct FeatureParams {
    /// Registered dataset identifier
    #[validate(custom = "validate_dataset_id")]
    pub dataset: String,
    pub collection: Collection,
    pub set: Set,
    pub visit: i64,
    pub feature: i64,
}

/// Query parameters of the feature endpoints.
///
/// `visit` and `feature` are only read by the query-string form of the endpoint, where a missing
/// value is reported as a missing argument.
#[derive(Debug, Default, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct FeatureQuery {
    pub visit: Option<i64>,
    pub feature: Option<i64>,
    /// Overrides the configured cleansing policy for this request
    pub cleanse: Option<Cleanse>,
}

/// Validate a dataset identifier
///
/// Identifiers are short keys: ASCII alphanumerics, `-` and `_`.
fn validate_dataset_id(dataset: &str) -> Result<(), ValidationError> {
    if dataset.is_empty() || dataset.len() > 64 {
        let mut error = ValidationError::new("dataset must be between 1 and 64 characters long");
        error.add_param("length".into(), &dataset.len());
        return Err(error);
    }
    if !dataset
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new(
            "dataset must only contain ASCII alphanumerics, '-' and '_'",
        ));
    }
    Ok(())
}

/// Envelope of a successful response.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    /// Always `success`
    pub status: &'static str,
    /// Response payload
    pub data: T,
}

impl<T> Success<T> {
    /// Wrap a payload in a success envelope.
    pub fn new(data: T) -> Self {
        Success {
            status: "success",
            data,
        }
    }
}

/// Payload of the dataset list endpoint.
#[derive(Debug, Serialize)]
pub struct DatasetsData {
    pub datasets: Vec<String>,
}

/// Payload of the dataset info endpoint.
#[derive(Debug, Serialize)]
pub struct DatasetInfoData {
    pub nodes: crate::dataset::NodeSummary,
}

/// Named axis lengths of a shape.
#[derive(Debug, PartialEq, Serialize)]
pub struct ShapeFields {
    pub visits: usize,
    pub timepoints: usize,
    pub features: usize,
}

/// Payload of the shape endpoint.
#[derive(Debug, Serialize)]
pub struct ShapeData {
    pub shape: [usize; 3],
    pub rank: usize,
    pub fields: ShapeFields,
}

impl From<crate::shape::Shape> for ShapeData {
    fn from(shape: crate::shape::Shape) -> Self {
        ShapeData {
            shape: shape.as_array(),
            rank: crate::shape::RANK,
            fields: ShapeFields {
                visits: shape.visits,
                timepoints: shape.timepoints,
                features: shape.features,
            },
        }
    }
}

/// A feature label and its index.
#[derive(Debug, PartialEq, Serialize)]
pub struct Label {
    pub value: usize,
    pub name: String,
}

/// Payload of the labels endpoint.
#[derive(Debug, Serialize)]
pub struct LabelsData {
    pub labels: Vec<Label>,
}

/// A kept label of a nonzero reduction.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonzeroLabel {
    /// Index among the kept features
    pub value: usize,
    /// Index in the stored array
    pub original_value: usize,
    pub name: String,
}

/// One element of the restricted value matrix of a nonzero reduction.
#[derive(Debug, PartialEq, Serialize)]
pub struct NonzeroDatum {
    pub timepoint: usize,
    #[serde(rename = "featureID")]
    pub feature_id: usize,
    #[serde(rename = "originalFeatureID")]
    pub original_feature_id: usize,
    pub value: f64,
}

/// Payload of the nonzero feature endpoint.
#[derive(Debug, Serialize)]
pub struct NonzeroData {
    pub labels: Vec<NonzeroLabel>,
    pub features: Vec<NonzeroDatum>,
}

impl From<crate::nonzero::NonzeroFeatures> for NonzeroData {
    fn from(reduction: crate::nonzero::NonzeroFeatures) -> Self {
        let crate::nonzero::NonzeroFeatures {
            values,
            feature_ids,
            labels,
        } = reduction;
        let features = values
            .indexed_iter()
            .map(|((timepoint, feature_id), value)| NonzeroDatum {
                timepoint,
                feature_id,
                original_feature_id: feature_ids[feature_id],
                value: *value,
            })
            .collect();
        let labels = std::iter::zip(feature_ids, labels)
            .enumerate()
            .map(|(value, (original_value, name))| NonzeroLabel {
                value,
                original_value,
                name,
            })
            .collect();
        NonzeroData { labels, features }
    }
}

/// One (time, value) point of a feature series.
#[derive(Debug, PartialEq, Serialize)]
pub struct FeaturePoint {
    pub x: f64,
    pub y: f64,
}

/// Payload of the feature endpoints.
#[derive(Debug, Serialize)]
pub struct FeatureData {
    pub feature: Vec<FeaturePoint>,
    pub label: Label,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_de_tokens, assert_de_tokens_error, Token};

    #[test]
    fn collection_display() {
        assert_eq!("raw", Collection::Raw.to_string());
        assert_eq!("processed", Collection::Processed.to_string());
    }

    #[test]
    fn node_segments_display() {
        assert_eq!("raw_sequence", NodeKind::RawSequence.to_string());
        assert_eq!("identifiers", NodeKind::Identifiers.to_string());
        assert_eq!("core_array", NodeName::CoreArray.to_string());
        assert_eq!("column_annotations", NodeName::ColumnAnnotations.to_string());
    }

    #[test]
    fn label_kind_into_node_kind() {
        assert_eq!(NodeKind::Sequence, LabelKind::Sequence.into());
        assert_eq!(NodeKind::Target, LabelKind::Target.into());
    }

    #[test]
    fn test_set_params() {
        assert_de_tokens(
            &SetParams {
                dataset: "ds1".to_string(),
                collection: Collection::Processed,
                set: Set::Validation,
            },
            &[
                Token::Struct {
                    name: "SetParams",
                    len: 3,
                },
                Token::Str("dataset"),
                Token::Str("ds1"),
                Token::Str("collection"),
                Token::Enum { name: "Collection" },
                Token::Str("processed"),
                Token::Unit,
                Token::Str("set"),
                Token::Enum { name: "Set" },
                Token::Str("validation"),
                Token::Unit,
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_unknown_collection() {
        assert_de_tokens_error::<Collection>(
            &[Token::Enum { name: "Collection" }, Token::Str("cooked")],
            "unknown variant `cooked`, expected `raw` or `processed`",
        );
    }

    #[test]
    fn test_feature_query_cleanse() {
        assert_de_tokens(
            &FeatureQuery {
                visit: None,
                feature: Some(2),
                cleanse: Some(Cleanse::DropInvalid),
            },
            &[
                Token::Struct {
                    name: "FeatureQuery",
                    len: 2,
                },
                Token::Str("feature"),
                Token::Some,
                Token::I64(2),
                Token::Str("cleanse"),
                Token::Some,
                Token::Enum { name: "Cleanse" },
                Token::Str("drop-invalid"),
                Token::Unit,
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_feature_query_unknown_field() {
        assert_de_tokens_error::<FeatureQuery>(
            &[
                Token::Struct {
                    name: "FeatureQuery",
                    len: 1,
                },
                Token::Str("label"),
            ],
            "unknown field `label`, expected one of `visit`, `feature`, `cleanse`",
        );
    }

    #[test]
    fn test_dataset_id_valid() {
        let params = DatasetParams {
            dataset: "mimic-3_small".to_string(),
        };
        params.validate().unwrap()
    }

    #[test]
    #[should_panic(expected = "dataset must only contain ASCII alphanumerics")]
    fn test_dataset_id_invalid_chars() {
        let params = DatasetParams {
            dataset: "../etc".to_string(),
        };
        params.validate().unwrap()
    }

    #[test]
    #[should_panic(expected = "dataset must be between 1 and 64 characters long")]
    fn test_dataset_id_too_long() {
        let params = DatasetParams {
            dataset: "x".repeat(65),
        };
        params.validate().unwrap()
    }

    #[test]
    fn test_feature_query_negative_valid() {
        // Negative indices are reported by the extraction as out of range.
        let query = FeatureQuery {
            visit: Some(-1),
            feature: Some(-1),
            cleanse: None,
        };
        query.validate().unwrap()
    }

    #[test]
    fn success_envelope() {
        let body = serde_json::to_value(Success::new(DatasetsData {
            datasets: vec!["a".to_string()],
        }))
        .unwrap();
        assert_eq!(
            serde_json::json!({"status": "success", "data": {"datasets": ["a"]}}),
            body
        );
    }

    #[test]
    fn nonzero_datum_field_names() {
        let body = serde_json::to_value(NonzeroDatum {
            timepoint: 1,
            feature_id: 0,
            original_feature_id: 3,
            value: 2.5,
        })
        .unwrap();
        assert_eq!(
            serde_json::json!({"timepoint": 1, "featureID": 0, "originalFeatureID": 3, "value": 2.5}),
            body
        );
    }
}
