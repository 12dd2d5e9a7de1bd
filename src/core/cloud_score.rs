//! Continuous per-pixel cloud scoring from band algebra
//!
//! Combines six rescaled spectral indicators with a per-pixel minimum.
//! Each individual test uses wide, forgiving thresholds; strictness comes
//! from requiring every test to agree, which suppresses false positives
//! from isolated bright surfaces (snow, sand, sun glint) at the cost of
//! some false negatives on ambiguous single-band evidence.

use crate::core::band_math::{normalized_difference, rescale, sum};
use crate::types::{Band, MaskResult, Scene, ScoreData};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rescale intervals for the six cloud indicators.
///
/// The defaults are the reference constants for Sentinel-2 surface
/// reflectance. Each interval is (low, high); the snow interval is
/// intentionally inverted so high NDSI maps to a low score.
#[derive(Debug, Clone)]
pub struct CloudScoreParams {
    /// Blue band brightness interval
    pub blue: (f32, f32),
    /// Aerosol band brightness interval
    pub aerosol: (f32, f32),
    /// Aerosol + cirrus sum interval (high-altitude cirrus test)
    pub cirrus_sum: (f32, f32),
    /// Red + green + blue sum interval (general brightness test)
    pub visible_sum: (f32, f32),
    /// ND(red4, swir1) interval (moisture test; clouds are moist)
    pub moisture: (f32, f32),
    /// ND(green, swir1) interval, inverted (snow penalty; snow has high NDSI)
    pub snow: (f32, f32),
}

impl Default for CloudScoreParams {
    fn default() -> Self {
        Self {
            blue: (0.1, 0.5),
            aerosol: (0.1, 0.3),
            cirrus_sum: (0.15, 0.20),
            visible_sum: (0.2, 0.8),
            moisture: (-0.1, 0.1),
            snow: (0.8, 0.6),
        }
    }
}

/// Cloud score processor
pub struct CloudScorer {
    params: CloudScoreParams,
}

impl CloudScorer {
    /// Create a scorer with the reference thresholds.
    pub fn new() -> Self {
        Self {
            params: CloudScoreParams::default(),
        }
    }

    /// Create a scorer with custom thresholds.
    pub fn with_params(params: CloudScoreParams) -> Self {
        Self { params }
    }

    /// Compute the combined cloud-likelihood score for a scene.
    ///
    /// The accumulator is seeded at 1.0 and lowered by the minimum over
    /// all six indicators; only the combined score is exposed. Fails with
    /// `MissingBand` if any required band is absent.
    pub fn score(&self, scene: &Scene) -> MaskResult<ScoreData> {
        log::info!(
            "Computing cloud score for product {}",
            scene.metadata().product_id
        );
        log::debug!("Score parameters: {:?}", self.params);

        let aerosol = scene.band(Band::Aerosol)?;
        let blue = scene.band(Band::Blue)?;
        let green = scene.band(Band::Green)?;
        let red = scene.band(Band::Red)?;
        let red4 = scene.band(Band::Red4)?;
        let cirrus = scene.band(Band::Cirrus)?;
        let swir1 = scene.band(Band::Swir1)?;

        let p = &self.params;

        // Brightness in the blue band.
        let blue_test = rescale(blue, p.blue.0, p.blue.1)?;

        // Brightness in the aerosol band.
        let aerosol_test = rescale(aerosol, p.aerosol.0, p.aerosol.1)?;

        // High-altitude cirrus: aerosol + cirrus.
        let cirrus_test = rescale(&sum(aerosol, cirrus)?, p.cirrus_sum.0, p.cirrus_sum.1)?;

        // General visible brightness: red + green + blue.
        let visible = sum(&sum(red, green)?, blue)?;
        let visible_test = rescale(&visible, p.visible_sum.0, p.visible_sum.1)?;

        // Moisture: clouds are moist, bare bright surfaces are not.
        let moisture_test = rescale(
            &normalized_difference(red4, swir1)?,
            p.moisture.0,
            p.moisture.1,
        )?;

        // Snow penalty: NDSI is high over snow, so the interval is
        // inverted and high NDSI pulls the minimum down.
        let snow_test = rescale(&normalized_difference(green, swir1)?, p.snow.0, p.snow.1)?;

        let combined = combine_indicators(&[
            &blue_test,
            &aerosol_test,
            &cirrus_test,
            &visible_test,
            &moisture_test,
            &snow_test,
        ])?;

        log::info!("Cloud score computed");
        Ok(combined)
    }
}

/// Per-pixel minimum over the indicators, seeded at 1.0.
///
/// NaN from a failed sub-test propagates so thresholding excludes the
/// pixel. Row-parallel when the `parallel` feature is enabled; both paths
/// fold the indicators in the same order and produce identical results.
#[cfg(feature = "parallel")]
fn combine_indicators(indicators: &[&ScoreData]) -> MaskResult<ScoreData> {
    use crate::types::MaskError;

    let (rows, cols) = indicators[0].dim();
    let data: Vec<f32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![1.0_f32; cols];
            for col in 0..cols {
                let mut acc = 1.0_f32;
                for indicator in indicators {
                    let v = indicator[[row, col]];
                    acc = if acc.is_nan() || v.is_nan() {
                        f32::NAN
                    } else {
                        acc.min(v)
                    };
                }
                row_data[col] = acc;
            }
            row_data
        })
        .collect();

    ScoreData::from_shape_vec((rows, cols), data)
        .map_err(|e| MaskError::Processing(e.to_string()))
}

#[cfg(not(feature = "parallel"))]
fn combine_indicators(indicators: &[&ScoreData]) -> MaskResult<ScoreData> {
    let ceiling = ScoreData::ones(indicators[0].dim());
    let mut inputs: Vec<&ScoreData> = vec![&ceiling];
    inputs.extend_from_slice(indicators);
    crate::core::band_math::min_aggregate(&inputs)
}

impl Default for CloudScorer {
    fn default() -> Self {
        Self::new()
    }
}
