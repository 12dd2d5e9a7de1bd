//! Core cloud and shadow masking modules

pub mod band_math;
pub mod qa_bitmask;
pub mod cloud_score;
pub mod shadow;
pub mod mask;
pub mod detect;

// Re-export main types
pub use band_math::{min_aggregate, normalized_difference, rescale, sum};
pub use qa_bitmask::{
    decode_flag, decode_flags, qa_clear_mask, qa_cloud_mask, QA_CIRRUS_BIT, QA_CLOUD_BIT,
};
pub use cloud_score::{CloudScoreParams, CloudScorer};
pub use shadow::{CloudIndicator, ShadowParams, ShadowProjector};
pub use mask::{and, apply_mask, apply_mask_band, negate, or, threshold};
pub use detect::{CloudShadowDetector, DetectorParams, SceneMasks};
