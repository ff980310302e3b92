//! This crate provides seq2view, a server exposing slices of hierarchical multidimensional array
//! stores as JSON over HTTP for visualisation clients.
//!
//! Each dataset is a store holding rank 3 observation arrays of shape
//! `[visits, timepoints, features]` under `/data/{collection}/{set}/{kind}/core_array`, with one
//! label per feature in a sibling `column_annotations` array. The last feature of every
//! observation array is its time channel.
//!
//! The dataset accessor resolves logical coordinates to store nodes ([node_path]), validates
//! array shapes ([shape]), decodes feature labels ([labels]), extracts time/value series with
//! bounds checking ([extract]) and reduces a visit to its recorded features ([nonzero]). The
//! accessor opens its store for the duration of each operation only, so handles may be shared
//! freely between concurrent requests.
//!
//! seq2view is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs serialisation of JSON response data.
//! * [zarrs] reads the array stores.
//! * [ndarray] provides n-dimensional arrays used to slice and reduce observations.

pub mod app;
pub mod app_state;
pub mod array;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod labels;
pub mod metrics;
pub mod models;
pub mod node_path;
pub mod nonzero;
pub mod registry;
pub mod resource_manager;
pub mod server;
pub mod shape;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated;
