//! Elementwise band algebra over same-shaped rasters
//!
//! All operations are pure and shape-preserving. Zero denominators in
//! normalized differences produce NaN, which downstream threshold tests
//! treat as "fails this test" rather than crashing the pipeline.

use crate::types::{BandData, MaskError, MaskResult, ScoreData};

/// Linearly rescale a band over the interval [low, high]:
///
/// `output = (input - low) / (high - low)`
///
/// The result is NOT clamped to [0, 1]; minimum-aggregation and
/// thresholding downstream provide the effective clamping. An inverted
/// interval (`high < low`) is legal and maps high inputs to low scores.
///
/// `low == high` or non-finite bounds are rejected as invalid parameters.
pub fn rescale(band: &BandData, low: f32, high: f32) -> MaskResult<ScoreData> {
    if !low.is_finite() || !high.is_finite() {
        return Err(MaskError::InvalidParameter(format!(
            "rescale bounds must be finite, got [{}, {}]",
            low, high
        )));
    }
    if low == high {
        return Err(MaskError::InvalidParameter(format!(
            "rescale interval is empty: low == high == {}",
            low
        )));
    }

    let span = high - low;
    Ok(band.mapv(|v| (v - low) / span))
}

/// Normalized difference between two bands:
///
/// `(a - b) / (a + b)`
///
/// Pixels with a zero denominator are set to NaN instead of producing
/// infinities; NaN inputs propagate.
pub fn normalized_difference(a: &BandData, b: &BandData) -> MaskResult<ScoreData> {
    check_shape(a, b)?;

    let mut out = ScoreData::zeros(a.dim());
    ndarray::Zip::from(&mut out)
        .and(a)
        .and(b)
        .for_each(|o, &x, &y| {
            let sum = x + y;
            *o = if sum == 0.0 { f32::NAN } else { (x - y) / sum };
        });

    Ok(out)
}

/// Elementwise sum of two bands.
pub fn sum(a: &BandData, b: &BandData) -> MaskResult<BandData> {
    check_shape(a, b)?;
    Ok(a + b)
}

/// Per-pixel minimum across all inputs.
///
/// Combines independent cloud-likelihood tests conservatively: a pixel is
/// only "very cloud-like" if every test agrees. NaN in any input propagates
/// NaN at that pixel so a failed sub-test is never absorbed by the minimum.
///
/// Commutative and associative; fails on an empty input set or on any
/// shape mismatch.
pub fn min_aggregate(inputs: &[&ScoreData]) -> MaskResult<ScoreData> {
    let first = inputs.first().ok_or_else(|| {
        MaskError::InvalidParameter("min_aggregate requires at least one input".to_string())
    })?;

    let mut acc = (*first).clone();
    for input in &inputs[1..] {
        check_shape(first, input)?;
        ndarray::Zip::from(&mut acc).and(*input).for_each(|a, &v| {
            // f32::min ignores NaN operands; a NaN sub-test must win here.
            *a = if a.is_nan() || v.is_nan() {
                f32::NAN
            } else {
                a.min(v)
            };
        });
    }

    Ok(acc)
}

fn check_shape(a: &BandData, b: &BandData) -> MaskResult<()> {
    if a.dim() != b.dim() {
        return Err(MaskError::ShapeMismatch {
            expected: a.dim(),
            actual: b.dim(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_rescale_basic() {
        let band = array![[0.1_f32, 0.3, 0.5]];
        let scaled = rescale(&band, 0.1, 0.5).unwrap();

        assert_relative_eq!(scaled[[0, 0]], 0.0);
        assert_relative_eq!(scaled[[0, 1]], 0.5);
        assert_relative_eq!(scaled[[0, 2]], 1.0);
    }

    #[test]
    fn test_rescale_not_clamped() {
        let band = array![[0.9_f32, -0.1]];
        let scaled = rescale(&band, 0.1, 0.5).unwrap();

        assert!(scaled[[0, 0]] > 1.0);
        assert!(scaled[[0, 1]] < 0.0);
    }

    #[test]
    fn test_rescale_inverted_interval() {
        // High input must map to a low score when the interval is inverted.
        let band = array![[0.8_f32, 0.6, 0.7]];
        let scaled = rescale(&band, 0.8, 0.6).unwrap();

        assert_relative_eq!(scaled[[0, 0]], 0.0);
        assert_relative_eq!(scaled[[0, 1]], 1.0);
        assert_relative_eq!(scaled[[0, 2]], 0.5);
    }

    #[test]
    fn test_rescale_round_trip() {
        let band = array![[0.12_f32, 0.34, 0.56], [0.78, 0.9, 0.01]];
        let (low, high) = (0.2_f32, 0.8);
        let scaled = rescale(&band, low, high).unwrap();

        for (orig, s) in band.iter().zip(scaled.iter()) {
            let recovered = s * (high - low) + low;
            assert_relative_eq!(recovered, *orig, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rescale_degenerate_interval() {
        let band = array![[0.5_f32]];
        let result = rescale(&band, 0.3, 0.3);
        assert!(matches!(result, Err(MaskError::InvalidParameter(_))));
    }

    #[test]
    fn test_normalized_difference() {
        let a = array![[0.8_f32]];
        let b = array![[0.2_f32]];
        let nd = normalized_difference(&a, &b).unwrap();
        assert_relative_eq!(nd[[0, 0]], 0.6);
    }

    #[test]
    fn test_normalized_difference_zero_denominator() {
        let a = array![[0.0_f32, 0.5]];
        let b = array![[0.0_f32, 0.5]];
        let nd = normalized_difference(&a, &b).unwrap();

        assert!(nd[[0, 0]].is_nan());
        assert_relative_eq!(nd[[0, 1]], 0.0);
    }

    #[test]
    fn test_normalized_difference_shape_mismatch() {
        let a = BandData::zeros((3, 3));
        let b = BandData::zeros((3, 4));
        assert!(matches!(
            normalized_difference(&a, &b),
            Err(MaskError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_min_aggregate_commutative_associative() {
        let a = array![[0.3_f32, 0.9]];
        let b = array![[0.5_f32, 0.2]];
        let c = array![[0.1_f32, 0.7]];

        let abc = min_aggregate(&[&a, &b, &c]).unwrap();
        let cba = min_aggregate(&[&c, &b, &a]).unwrap();
        let ab = min_aggregate(&[&a, &b]).unwrap();
        let ab_c = min_aggregate(&[&ab, &c]).unwrap();

        assert_eq!(abc, cba);
        assert_eq!(abc, ab_c);
        assert_relative_eq!(abc[[0, 0]], 0.1);
        assert_relative_eq!(abc[[0, 1]], 0.2);
    }

    #[test]
    fn test_min_aggregate_nan_propagates() {
        let a = array![[f32::NAN]];
        let b = array![[0.9_f32]];
        let min = min_aggregate(&[&a, &b]).unwrap();
        assert!(min[[0, 0]].is_nan());

        // Order must not matter for NaN either.
        let min = min_aggregate(&[&b, &a]).unwrap();
        assert!(min[[0, 0]].is_nan());
    }

    #[test]
    fn test_min_aggregate_empty() {
        let result = min_aggregate(&[]);
        assert!(matches!(result, Err(MaskError::InvalidParameter(_))));
    }

    #[test]
    fn test_sum() {
        let a = array![[0.1_f32, 0.2]];
        let b = array![[0.3_f32, 0.4]];
        let s = sum(&a, &b).unwrap();
        assert_relative_eq!(s[[0, 0]], 0.4);
        assert_relative_eq!(s[[0, 1]], 0.6);
    }
}
