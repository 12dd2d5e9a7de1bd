//! cloudmask: A Fast, Modular Sentinel-2 Cloud and Shadow Mask Generator
//!
//! This library detects clouds and their cast shadows in Sentinel-2 surface
//! reflectance scenes and produces per-pixel boolean masks for excluding
//! contaminated pixels from downstream analysis.
//!
//! Detection combines three deterministic methods:
//! - a continuous cloud-likelihood score from band algebra (six rescaled
//!   spectral tests combined by a per-pixel minimum),
//! - the authoritative cloud flag decoded bit-exactly from the packed
//!   QA60 quality band,
//! - geometric shadow casting of the cloud mask along the solar ray at
//!   several hypothesized cloud-base heights, gated by a spectral
//!   darkness test.
//!
//! The crate assumes its input has already been band-renamed and scaled
//! to reflectance in [0, 1]; acquisition, catalog filtering, rendering,
//! and export are out of scope.

pub mod types;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Band, BandData, MaskData, MaskError, MaskResult, QaData, Scene, SceneMetadata, ScoreData,
};

pub use core::{
    CloudIndicator, CloudScoreParams, CloudScorer, CloudShadowDetector, DetectorParams,
    SceneMasks, ShadowParams, ShadowProjector,
};
