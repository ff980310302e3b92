//! Functions and utilities for reading store arrays into [ndarray] objects.

use crate::dataset::Store;
use crate::error::AccessorError;
use crate::node_path::NodePath;

use ndarray::{ArrayD, IxDyn};
use num_traits::AsPrimitive;
use std::ops::Range;
use zarrs::array::{Array, DataType, ElementOwned};
use zarrs::array_subset::ArraySubset;

/// Read a subset of an array, widening elements to [f64].
///
/// # Arguments
///
/// * `array`: Array to read from
/// * `subset`: Subset of the array to read
fn retrieve_as<T>(array: &Array<Store>, subset: &ArraySubset) -> Result<Vec<f64>, AccessorError>
where
    T: ElementOwned + AsPrimitive<f64>,
{
    retrieve_with::<T>(array, subset, |element| element.as_())
}

/// Read a subset of an array, converting each element with `widen`.
fn retrieve_with<T>(
    array: &Array<Store>,
    subset: &ArraySubset,
    widen: fn(T) -> f64,
) -> Result<Vec<f64>, AccessorError>
where
    T: ElementOwned,
{
    let elements = array.retrieve_array_subset_elements::<T>(subset)?;
    Ok(elements.into_iter().map(widen).collect())
}

/// Read a hyperslab of a numeric array as [f64], whatever its storage type.
///
/// Returns the elements in row-major order.
///
/// # Arguments
///
/// * `array`: Array to read from
/// * `path`: Path of the array, for error reporting
/// * `ranges`: Range of each axis to read
pub fn retrieve_f64(
    array: &Array<Store>,
    path: &NodePath,
    ranges: &[Range<u64>],
) -> Result<Vec<f64>, AccessorError> {
    let subset = ArraySubset::new_with_ranges(ranges);
    match array.data_type() {
        DataType::Float64 => Ok(array.retrieve_array_subset_elements::<f64>(&subset)?),
        DataType::Float32 => retrieve_as::<f32>(array, &subset),
        DataType::Float16 => retrieve_with::<half::f16>(array, &subset, f64::from),
        DataType::BFloat16 => retrieve_with::<half::bf16>(array, &subset, f64::from),
        DataType::Bool => retrieve_with::<bool>(array, &subset, |b| f64::from(u8::from(b))),
        DataType::Int8 => retrieve_as::<i8>(array, &subset),
        DataType::Int16 => retrieve_as::<i16>(array, &subset),
        DataType::Int32 => retrieve_as::<i32>(array, &subset),
        DataType::Int64 => retrieve_as::<i64>(array, &subset),
        DataType::UInt8 => retrieve_as::<u8>(array, &subset),
        DataType::UInt16 => retrieve_as::<u16>(array, &subset),
        DataType::UInt32 => retrieve_as::<u32>(array, &subset),
        DataType::UInt64 => retrieve_as::<u64>(array, &subset),
        data_type => Err(AccessorError::UnsupportedDataType {
            path: path.clone(),
            data_type: format!("{data_type:?}"),
        }),
    }
}

/// Returns the shape of the hyperslab selected by `ranges`.
pub fn ranges_shape(ranges: &[Range<u64>]) -> Result<Vec<usize>, AccessorError> {
    ranges
        .iter()
        .map(|range| Ok(usize::try_from(range.end - range.start)?))
        .collect()
}

/// Returns an [ndarray::ArrayD] owning `data` with the given shape.
///
/// # Arguments
///
/// * `shape`: The shape of the array
/// * `data`: Row-major elements of the array
pub fn build_array_from_shape(
    shape: &[usize],
    data: Vec<f64>,
) -> Result<ArrayD<f64>, AccessorError> {
    ArrayD::from_shape_vec(IxDyn(shape), data).map_err(AccessorError::ShapeInvalid)
}
