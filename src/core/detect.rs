//! End-to-end cloud and shadow detection
//!
//! Thin composition of the scorer, the QA decoder, the shadow projector,
//! and the mask compositor into the one entry point a processing pipeline
//! typically wants: score the scene, decide cloud, cast shadows, combine.

use crate::core::cloud_score::{CloudScoreParams, CloudScorer};
use crate::core::mask;
use crate::core::qa_bitmask;
use crate::core::shadow::{CloudIndicator, ShadowParams, ShadowProjector};
use crate::types::{MaskData, MaskResult, Scene, ScoreData};

/// Parameters for the full detection pipeline
#[derive(Debug, Clone)]
pub struct DetectorParams {
    pub score: CloudScoreParams,
    pub shadow: ShadowParams,
    /// Threshold turning the continuous score into the final cloud mask
    pub mask_threshold: f32,
    /// Prefer the QA-derived cloud flag over the score for shadow casting
    /// when the scene carries a QA channel
    pub cast_from_qa: bool,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            score: CloudScoreParams::default(),
            shadow: ShadowParams::default(),
            mask_threshold: 0.5,
            cast_from_qa: false,
        }
    }
}

/// All masks derived from a single scene.
#[derive(Debug, Clone)]
pub struct SceneMasks {
    /// Continuous cloud-likelihood score
    pub cloud_score: ScoreData,
    /// Score-derived cloud mask
    pub cloud_mask: MaskData,
    /// QA-derived cloud mask, when the scene carries a QA channel
    pub qa_cloud_mask: Option<MaskData>,
    /// Geometric shadow mask
    pub shadow_mask: MaskData,
    /// Cloud OR shadow: the pixels to exclude downstream
    pub combined: MaskData,
}

/// Cloud and shadow detection pipeline
pub struct CloudShadowDetector {
    params: DetectorParams,
}

impl CloudShadowDetector {
    /// Create a detector with the reference parameters.
    pub fn new() -> Self {
        Self {
            params: DetectorParams::default(),
        }
    }

    /// Create a detector with custom parameters.
    pub fn with_params(params: DetectorParams) -> Self {
        Self { params }
    }

    /// Run the full detection chain on a scene.
    pub fn detect(&self, scene: &Scene) -> MaskResult<SceneMasks> {
        log::info!(
            "Running cloud/shadow detection on product {}",
            scene.metadata().product_id
        );

        let scorer = CloudScorer::with_params(self.params.score.clone());
        let cloud_score = scorer.score(scene)?;
        let cloud_mask = mask::threshold(&cloud_score, self.params.mask_threshold);

        let qa_cloud_mask = scene.qa().map(qa_bitmask::qa_cloud_mask);

        let projector = ShadowProjector::with_params(self.params.shadow.clone());
        let indicator = match (&qa_cloud_mask, self.params.cast_from_qa) {
            (Some(qa_mask), true) => CloudIndicator::Mask(qa_mask),
            _ => CloudIndicator::Score(&cloud_score),
        };
        let shadow_mask = projector.shadow_mask(scene, indicator)?;

        let mut combined = mask::or(&cloud_mask, &shadow_mask)?;
        if let Some(qa_mask) = &qa_cloud_mask {
            combined = mask::or(&combined, qa_mask)?;
        }

        log::info!(
            "Detection finished: {} cloud, {} shadow pixels",
            cloud_mask.iter().filter(|&&m| m).count(),
            shadow_mask.iter().filter(|&&m| m).count()
        );

        Ok(SceneMasks {
            cloud_score,
            cloud_mask,
            qa_cloud_mask,
            shadow_mask,
            combined,
        })
    }

    /// Apply the combined exclusion mask, yielding a cleaned scene.
    pub fn apply(&self, scene: &Scene, masks: &SceneMasks) -> MaskResult<Scene> {
        mask::apply_mask(scene, &masks.combined)
    }
}

impl Default for CloudShadowDetector {
    fn default() -> Self {
        Self::new()
    }
}
