//! Thresholding, boolean mask combination, and mask application
//!
//! Masks from the cloud scorer, the QA decoder, and the shadow projector
//! are independent boolean rasters over the same grid; they combine freely
//! with AND/OR/NOT before being applied to a scene.

use crate::types::{BandData, MaskData, MaskError, MaskResult, Scene, ScoreData};

/// Boolean raster from a continuous score: true where `score > t`.
///
/// NaN scores never classify as true.
pub fn threshold(score: &ScoreData, t: f32) -> MaskData {
    score.mapv(|v| v > t)
}

/// Logical NOT.
pub fn negate(mask: &MaskData) -> MaskData {
    mask.mapv(|v| !v)
}

/// Elementwise logical AND; fails on grid mismatch.
pub fn and(a: &MaskData, b: &MaskData) -> MaskResult<MaskData> {
    check_shape(a, b)?;
    let mut out = a.clone();
    ndarray::Zip::from(&mut out).and(b).for_each(|o, &v| {
        *o = *o && v;
    });
    Ok(out)
}

/// Elementwise logical OR; fails on grid mismatch.
pub fn or(a: &MaskData, b: &MaskData) -> MaskResult<MaskData> {
    check_shape(a, b)?;
    let mut out = a.clone();
    ndarray::Zip::from(&mut out).and(b).for_each(|o, &v| {
        *o = *o || v;
    });
    Ok(out)
}

/// Set masked pixels of a single band to the no-data sentinel (NaN).
///
/// Unmasked pixels pass through unchanged; applying the same mask twice
/// is idempotent.
pub fn apply_mask_band(band: &BandData, mask: &MaskData) -> MaskResult<BandData> {
    check_shape_band(band, mask)?;
    let mut out = band.clone();
    ndarray::Zip::from(&mut out).and(mask).for_each(|v, &m| {
        if m {
            *v = f32::NAN;
        }
    });
    Ok(out)
}

/// Apply a mask to every reflectance band of a scene.
///
/// Returns a new scene; the input is untouched. The integer QA channel and
/// the metadata are carried through unchanged (QA has no NaN sentinel;
/// consumers exclude QA pixels through the mask itself).
pub fn apply_mask(scene: &Scene, mask: &MaskData) -> MaskResult<Scene> {
    if mask.dim() != scene.shape() {
        return Err(MaskError::ShapeMismatch {
            expected: scene.shape(),
            actual: mask.dim(),
        });
    }

    log::debug!(
        "Masking {} pixels out of scene {}",
        mask.iter().filter(|&&m| m).count(),
        scene.metadata().product_id
    );

    let mut masked = Scene::new(
        scene.shape(),
        scene.pixel_spacing(),
        scene.metadata().clone(),
    );
    for (band, data) in scene.bands() {
        masked.insert_band(band, apply_mask_band(data, mask)?)?;
    }
    if let Some(qa) = scene.qa() {
        masked.insert_qa(qa.clone())?;
    }

    Ok(masked)
}

fn check_shape(a: &MaskData, b: &MaskData) -> MaskResult<()> {
    if a.dim() != b.dim() {
        return Err(MaskError::ShapeMismatch {
            expected: a.dim(),
            actual: b.dim(),
        });
    }
    Ok(())
}

fn check_shape_band(band: &BandData, mask: &MaskData) -> MaskResult<()> {
    if band.dim() != mask.dim() {
        return Err(MaskError::ShapeMismatch {
            expected: band.dim(),
            actual: mask.dim(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_threshold() {
        let score = array![[0.4_f32, 0.5, 0.6, f32::NAN]];
        let mask = threshold(&score, 0.5);
        assert!(!mask[[0, 0]]);
        assert!(!mask[[0, 1]]); // strictly greater than
        assert!(mask[[0, 2]]);
        assert!(!mask[[0, 3]]); // NaN fails the test
    }

    #[test]
    fn test_negate() {
        let mask = array![[true, false]];
        let neg = negate(&mask);
        assert!(!neg[[0, 0]]);
        assert!(neg[[0, 1]]);
    }

    #[test]
    fn test_and_or() {
        let a = array![[true, true, false, false]];
        let b = array![[true, false, true, false]];

        let both = and(&a, &b).unwrap();
        assert_eq!(both, array![[true, false, false, false]]);

        let either = or(&a, &b).unwrap();
        assert_eq!(either, array![[true, true, true, false]]);
    }

    #[test]
    fn test_combinator_shape_mismatch() {
        let a = MaskData::from_elem((2, 2), true);
        let b = MaskData::from_elem((2, 3), true);
        assert!(matches!(and(&a, &b), Err(MaskError::ShapeMismatch { .. })));
        assert!(matches!(or(&a, &b), Err(MaskError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_apply_mask_band() {
        let band = array![[0.1_f32, 0.2], [0.3, 0.4]];
        let mask = array![[true, false], [false, true]];

        let masked = apply_mask_band(&band, &mask).unwrap();
        assert!(masked[[0, 0]].is_nan());
        assert_eq!(masked[[0, 1]], 0.2);
        assert_eq!(masked[[1, 0]], 0.3);
        assert!(masked[[1, 1]].is_nan());

        // Input must be untouched.
        assert_eq!(band[[0, 0]], 0.1);
    }

    #[test]
    fn test_apply_mask_band_idempotent() {
        let band = array![[0.1_f32, 0.2]];
        let mask = array![[true, false]];

        let once = apply_mask_band(&band, &mask).unwrap();
        let twice = apply_mask_band(&once, &mask).unwrap();

        assert!(twice[[0, 0]].is_nan());
        assert_eq!(twice[[0, 1]], 0.2);
    }
}
