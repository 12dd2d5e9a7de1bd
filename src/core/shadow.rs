//! Geometric cloud shadow casting
//!
//! Projects a binary cloud mask along the solar ray at several hypothesized
//! cloud-base heights, composites the per-height candidates with a logical
//! OR, and intersects the result with a spectral darkness test.
//!
//! Known limitation carried from the reference design: dark natural
//! surfaces (water, basalt) can still pass the darkness gate and trigger
//! false positives where the geometry alone would flag them. A water-index
//! exclusion is deliberately NOT applied here.

use crate::core::band_math::normalized_difference;
use crate::core::mask;
use crate::types::{Band, MaskData, MaskResult, Scene, ScoreData};
use std::f64::consts::FRAC_PI_2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parameters for shadow projection
#[derive(Debug, Clone)]
pub struct ShadowParams {
    /// Score threshold used to binarize a continuous cloud indicator
    pub score_threshold: f32,
    /// Hypothesized cloud-base heights in meters
    pub cloud_heights_m: Vec<f64>,
    /// Minimum ND(green, swir2) for a pixel to count as spectrally dark
    pub darkness_threshold: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            // 500 m to 4000 m in 500 m steps
            cloud_heights_m: (1..=8).map(|i| i as f64 * 500.0).collect(),
            darkness_threshold: 0.25,
        }
    }
}

/// Cloud indicator accepted by the projector: a continuous score
/// (binarized at the configured threshold) or an already decided mask.
#[derive(Debug, Clone, Copy)]
pub enum CloudIndicator<'a> {
    Score(&'a ScoreData),
    Mask(&'a MaskData),
}

/// Shadow projection processor
pub struct ShadowProjector {
    params: ShadowParams,
}

impl ShadowProjector {
    /// Create a projector with the reference parameters.
    pub fn new() -> Self {
        Self {
            params: ShadowParams::default(),
        }
    }

    /// Create a projector with custom parameters.
    pub fn with_params(params: ShadowParams) -> Self {
        Self { params }
    }

    /// Compute the shadow mask for a scene.
    ///
    /// Pure function of the cloud indicator, the scene's solar geometry,
    /// its ground sampling distance, and the configured height hypotheses.
    /// A pixel is shadow iff some plausible cloud height casts onto it,
    /// it is not itself cloud, and it is spectrally dark.
    pub fn shadow_mask(&self, scene: &Scene, indicator: CloudIndicator) -> MaskResult<MaskData> {
        log::info!(
            "Projecting cloud shadows for product {} ({} height hypotheses)",
            scene.metadata().product_id,
            self.params.cloud_heights_m.len()
        );

        let cloud = match indicator {
            CloudIndicator::Score(score) => mask::threshold(score, self.params.score_threshold),
            CloudIndicator::Mask(m) => m.clone(),
        };
        if cloud.dim() != scene.shape() {
            return Err(crate::types::MaskError::ShapeMismatch {
                expected: scene.shape(),
                actual: cloud.dim(),
            });
        }

        let potential = self.potential_shadow(scene, &cloud)?;

        // A pixel cannot be simultaneously cloud and shadow.
        let potential = mask::and(&potential, &mask::negate(&cloud))?;

        // Shadows must also be spectrally dark; geometry alone is not enough.
        let green = scene.band(Band::Green)?;
        let swir2 = scene.band(Band::Swir2)?;
        let darkness = normalized_difference(green, swir2)?;
        let dark = mask::threshold(&darkness, self.params.darkness_threshold);

        let shadow = mask::and(&potential, &dark)?;

        log::info!("Shadow projection completed");
        Ok(shadow)
    }

    /// OR-composite of the translated cloud mask over all height hypotheses.
    fn potential_shadow(&self, scene: &Scene, cloud: &MaskData) -> MaskResult<MaskData> {
        let meta = scene.metadata();
        // Rotate the solar azimuth into the pixel coordinate convention and
        // convert the zenith angle to the elevation complement the tangent
        // formula needs.
        let azimuth = meta.solar_azimuth.to_radians() + FRAC_PI_2;
        let zenith = FRAC_PI_2 - meta.solar_zenith.to_radians();
        let scale = scene.pixel_spacing();

        log::debug!(
            "Shadow ray: azimuth' = {:.4} rad, zenith' = {:.4} rad, scale = {} m",
            azimuth,
            zenith,
            scale
        );

        let offsets: Vec<(isize, isize)> = self
            .params
            .cloud_heights_m
            .iter()
            .map(|&height| shadow_offset(azimuth, zenith, height, scale))
            .collect();

        // Per-height translations are independent; the OR reduction is
        // associative and commutative, so any combine order is fine.
        #[cfg(feature = "parallel")]
        let composite = offsets
            .par_iter()
            .map(|&(dx, dy)| translate(cloud, dx, dy))
            .reduce(
                || MaskData::from_elem(cloud.dim(), false),
                |a, b| or_masks(&a, &b),
            );

        #[cfg(not(feature = "parallel"))]
        let composite = offsets
            .iter()
            .map(|&(dx, dy)| translate(cloud, dx, dy))
            .fold(MaskData::from_elem(cloud.dim(), false), |a, b| {
                or_masks(&a, &b)
            });

        Ok(composite)
    }
}

impl Default for ShadowProjector {
    fn default() -> Self {
        Self::new()
    }
}

/// Pixel-space displacement of a shadow cast from `height` meters.
///
/// The shadow vector length is `tan(zenith') * height`; its components are
/// rounded to whole pixels of `scale` meters.
fn shadow_offset(azimuth: f64, zenith: f64, height: f64, scale: f64) -> (isize, isize) {
    let length = zenith.tan() * height;
    let dx = (azimuth.cos() * length / scale).round() as isize;
    let dy = (azimuth.sin() * length / scale).round() as isize;
    (dx, dy)
}

/// Shift a boolean raster by a whole-pixel offset.
///
/// `dx` moves along columns, `dy` along rows. Samples shifted off the grid
/// are dropped; uncovered pixels are false. This is a footprint translation,
/// not a resample.
fn translate(mask: &MaskData, dx: isize, dy: isize) -> MaskData {
    let (rows, cols) = mask.dim();
    let mut out = MaskData::from_elem((rows, cols), false);

    for ((row, col), &set) in mask.indexed_iter() {
        if !set {
            continue;
        }
        let r = row as isize + dy;
        let c = col as isize + dx;
        if r >= 0 && r < rows as isize && c >= 0 && c < cols as isize {
            out[[r as usize, c as usize]] = true;
        }
    }

    out
}

fn or_masks(a: &MaskData, b: &MaskData) -> MaskData {
    let mut out = a.clone();
    ndarray::Zip::from(&mut out).and(b).for_each(|o, &v| {
        *o = *o || v;
    });
    out
}
