//! Error handling.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ndarray::ShapeError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::AcquireError;
use tracing::{event, Level};

use crate::node_path::NodePath;

/// Dataset accessor error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum AccessorError {
    /// Failure opening an array in the store
    #[error("failed to open array")]
    ArrayOpen(#[from] zarrs::array::ArrayCreateError),

    /// Failure reading or decoding array data
    #[error("failed to read array data")]
    ArrayRead(#[from] zarrs::array::ArrayError),

    /// Cleansing was requested for a selection that is not a single series
    #[error("cleansing requires both a visit and a feature to be selected")]
    CleanseRequiresSeries,

    /// Unknown dataset identifier
    #[error("dataset {id} not found")]
    DatasetNotFound { id: String },

    /// A registered dataset path does not exist
    #[error("dataset path {} does not exist", .path.display())]
    DatasetPathNotFound { path: PathBuf },

    /// Annotation bytes are not valid UTF-8
    #[error("label {index} at {path} is not valid UTF-8")]
    LabelDecode {
        path: NodePath,
        index: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Label count and feature count disagree
    #[error("{labels} labels do not match {features} features")]
    LabelMismatch { labels: usize, features: usize },

    /// Array has a rank other than 3
    #[error("expected array at {path} to have rank 3 but found rank {rank}")]
    InvalidRank { path: NodePath, rank: usize },

    /// A required argument was not supplied
    #[error("missing required argument '{name}'")]
    MissingArgument { name: &'static str },

    /// No datasets were registered
    #[error("no datasets registered")]
    NoDatasets,

    /// A node is absent from the store
    #[error("node {path} not found")]
    NodeNotFound { path: NodePath },

    /// Invalid node path
    #[error("invalid node path")]
    InvalidNodePath(#[from] zarrs::node::NodePathError),

    /// The array has no feature channel from which to read the time axis
    #[error("array at {path} has no time channel")]
    NoTimeChannel { path: NodePath },

    /// Index outside the valid half-open interval of an axis
    #[error("'{axis}' must be an integer in [0, {bound}) but got {index}")]
    OutOfRange {
        axis: &'static str,
        index: i64,
        bound: usize,
    },

    /// Error deserialising request path parameters
    #[error("request path is not valid")]
    RequestPathRejection(#[from] PathRejection),

    /// Error deserialising request query parameters
    #[error("request query is not valid")]
    RequestQueryRejection(#[from] QueryRejection),

    /// Error validating request parameters
    #[error("request parameters are not valid")]
    RequestValidation(#[from] validator::ValidationErrors),

    /// Error acquiring a semaphore
    #[error("error acquiring resources")]
    SemaphoreAcquireError(#[from] AcquireError),

    /// Error creating ndarray Array from Shape
    #[error("failed to create array from shape")]
    ShapeInvalid(#[from] ShapeError),

    /// Failure opening a store
    #[error("failed to open store")]
    StoreOpen(#[from] zarrs::filesystem::FilesystemStoreCreateError),

    /// Failure reading from a store
    #[error("failed to read from store")]
    Storage(#[from] zarrs::storage::StorageError),

    /// Error joining a blocking task
    #[error("error running blocking task")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Array data type that cannot be read as numbers or labels
    #[error("unsupported data type {data_type} at {path}")]
    UnsupportedDataType { path: NodePath, data_type: String },
}

impl IntoResponse for AccessorError {
    /// Convert from an `AccessorError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    http_status: StatusCode,

    /// `fail` for client errors, `error` for server errors
    status: String,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `http_status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(http_status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let status = if http_status.is_server_error() {
            "error"
        } else {
            "fail"
        };
        ErrorResponse {
            http_status,
            status: status.to_string(),
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<AccessorError> for ErrorResponse {
    /// Convert from an `AccessorError` into an `ErrorResponse`.
    fn from(error: AccessorError) -> Self {
        let response = match &error {
            // Bad request
            AccessorError::CleanseRequiresSeries
            | AccessorError::MissingArgument { name: _ }
            | AccessorError::OutOfRange {
                axis: _,
                index: _,
                bound: _,
            }
            | AccessorError::RequestPathRejection(_)
            | AccessorError::RequestQueryRejection(_)
            | AccessorError::RequestValidation(_) => Self::bad_request(&error),

            // Not found
            AccessorError::DatasetNotFound { id: _ }
            | AccessorError::NodeNotFound { path: _ } => Self::not_found(&error),

            // Internal server error. The stored data or the server is at fault.
            AccessorError::ArrayOpen(_)
            | AccessorError::ArrayRead(_)
            | AccessorError::DatasetPathNotFound { path: _ }
            | AccessorError::InvalidRank { path: _, rank: _ }
            | AccessorError::LabelDecode { .. }
            | AccessorError::LabelMismatch {
                labels: _,
                features: _,
            }
            | AccessorError::NoDatasets
            | AccessorError::InvalidNodePath(_)
            | AccessorError::NoTimeChannel { path: _ }
            | AccessorError::SemaphoreAcquireError(_)
            | AccessorError::ShapeInvalid(_)
            | AccessorError::StoreOpen(_)
            | AccessorError::Storage(_)
            | AccessorError::TaskJoin(_)
            | AccessorError::TryFromInt(_)
            | AccessorError::UnsupportedDataType {
                path: _,
                data_type: _,
            } => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.http_status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.http_status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
