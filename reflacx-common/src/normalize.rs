//! Array normalisation
//!
//! Rescales numeric arrays (images, heatmaps) into a target value range.
//! All arithmetic is done in `f64`; [`normalize_as`] casts the result to a
//! narrower element type afterwards.

use crate::{Error, Result};
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, RemoveAxis};
use num_traits::{NumCast, ToPrimitive};

/// Default output range
pub const UNIT_RANGE: (f64, f64) = (0.0, 1.0);

/// Rescale `img` linearly so its minimum maps to `range.0` and its maximum
/// to `range.1`
///
/// A constant array has no spread; every element maps to `range.0`.
pub fn normalize<A, S, D>(img: &ArrayBase<S, D>, range: (f64, f64)) -> Array<f64, D>
where
    A: ToPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut result = img.map(|v| v.to_f64().unwrap_or(f64::NAN));
    if result.is_empty() {
        return result;
    }

    let min = result.fold(f64::INFINITY, |acc, &v| acc.min(v));
    result.mapv_inplace(|v| v - min);

    let max = result.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let divisor = if max != 0.0 { max } else { 1.0 };

    let (lo, hi) = range;
    result.mapv_inplace(|v| (v / divisor) * (hi - lo) + lo);
    result
}

/// Like [`normalize`], but a 3-D `H×W×C` array is rescaled one channel at a
/// time
///
/// Arrays of any other rank are normalised as a whole.
pub fn normalize_by_channel<A, S, D>(img: &ArrayBase<S, D>, range: (f64, f64)) -> Array<f64, D>
where
    A: ToPrimitive,
    S: Data<Elem = A>,
    D: Dimension + RemoveAxis,
{
    if img.ndim() != 3 {
        return normalize(img, range);
    }

    let mut result = img.map(|v| v.to_f64().unwrap_or(f64::NAN));
    for mut channel in result.axis_iter_mut(Axis(2)) {
        let normalized = normalize(&channel, range);
        channel.assign(&normalized);
    }
    result
}

/// Normalise and cast to element type `T`
///
/// Fails if a rescaled value cannot be represented in `T` (e.g. a negative
/// lower bound with an unsigned target).
pub fn normalize_as<T, A, S, D>(img: &ArrayBase<S, D>, range: (f64, f64)) -> Result<Array<T, D>>
where
    T: NumCast,
    A: ToPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    let normalized = normalize(img, range);

    let mut values = Vec::with_capacity(normalized.len());
    for &v in normalized.iter() {
        let cast = T::from(v).ok_or_else(|| {
            Error::InvalidInput(format!("value {} not representable in target type", v))
        })?;
        values.push(cast);
    }

    Array::from_shape_vec(normalized.raw_dim(), values)
        .map_err(|e| Error::InvalidInput(format!("shape mismatch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn test_unit_range() {
        let img = array![[0u16, 5], [10, 10]];
        let result = normalize(&img, UNIT_RANGE);
        assert_eq!(result, array![[0.0, 0.5], [1.0, 1.0]]);
    }

    #[test]
    fn test_constant_array_maps_to_lower_bound() {
        let img = Array2::<f32>::from_elem((3, 4), 7.5);
        let result = normalize(&img, (2.0, 9.0));
        assert!(result.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_custom_range_with_negative_values() {
        let img = array![-4.0, 0.0, 4.0];
        let result = normalize(&img, (-1.0, 1.0));
        assert_eq!(result, array![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_array() {
        let img = Array2::<f64>::zeros((0, 3));
        assert!(normalize(&img, UNIT_RANGE).is_empty());
    }

    #[test]
    fn test_by_channel_rescales_independently() {
        let mut img = Array3::<f64>::zeros((1, 2, 2));
        // channel 0: 0..10, channel 1: 100..200
        img[[0, 0, 0]] = 0.0;
        img[[0, 1, 0]] = 10.0;
        img[[0, 0, 1]] = 100.0;
        img[[0, 1, 1]] = 200.0;

        let result = normalize_by_channel(&img, UNIT_RANGE);
        assert_eq!(result[[0, 0, 0]], 0.0);
        assert_eq!(result[[0, 1, 0]], 1.0);
        assert_eq!(result[[0, 0, 1]], 0.0);
        assert_eq!(result[[0, 1, 1]], 1.0);

        let whole = normalize(&img, UNIT_RANGE);
        assert_eq!(whole[[0, 1, 0]], 0.05);
    }

    #[test]
    fn test_by_channel_on_2d_falls_back() {
        let img = array![[1.0, 3.0]];
        assert_eq!(normalize_by_channel(&img, UNIT_RANGE), array![[0.0, 1.0]]);
    }

    #[test]
    fn test_cast_to_u8() {
        let img = array![[0.0f64, 1.0], [2.0, 4.0]];
        let result: Array2<u8> = normalize_as(&img, (0.0, 255.0)).unwrap();
        assert_eq!(result, array![[0u8, 63], [127, 255]]);
    }

    #[test]
    fn test_cast_out_of_range_fails() {
        let img = array![0.0f64, 1.0];
        let result = normalize_as::<u8, _, _, _>(&img, (-1.0, 1.0));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
