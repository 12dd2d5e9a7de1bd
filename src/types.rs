use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Single-band reflectance data, scaled to [0, 1]. NaN marks no-data pixels.
pub type BandData = Array2<f32>;

/// Packed integer quality-assurance data (Sentinel-2 QA60).
pub type QaData = Array2<u16>;

/// Continuous per-pixel indicator in [0, 1]; higher = more cloud-like.
/// NaN marks pixels that failed a sub-test and must never classify as cloud.
pub type ScoreData = Array2<f32>;

/// Decided boolean mask (true = flagged).
pub type MaskData = Array2<bool>;

/// Sentinel-2 surface reflectance bands after renaming and scaling.
///
/// The packed QA channel is held separately on [`Scene`] because it is
/// integer-typed, not reflectance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// B1 coastal aerosol
    Aerosol,
    /// B2
    Blue,
    /// B3
    Green,
    /// B4
    Red,
    /// B5 narrow red edge
    Red2,
    /// B8 near infrared
    Nir,
    /// B8A narrow near infrared
    Red4,
    /// B9 water vapour
    H2o,
    /// B10 cirrus
    Cirrus,
    /// B11 shortwave infrared 1
    Swir1,
    /// B12 shortwave infrared 2
    Swir2,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Band::Aerosol => "aerosol",
            Band::Blue => "blue",
            Band::Green => "green",
            Band::Red => "red",
            Band::Red2 => "red2",
            Band::Nir => "nir",
            Band::Red4 => "red4",
            Band::H2o => "h2o",
            Band::Cirrus => "cirrus",
            Band::Swir1 => "swir1",
            Band::Swir2 => "swir2",
        };
        write!(f, "{}", name)
    }
}

/// Scalar acquisition attributes attached to a scene.
///
/// Solar angles are read by the shadow projector; they are fixed at
/// construction and never updated by any operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Product identifier (e.g. granule id)
    pub product_id: String,
    /// Sensing time
    pub acquisition_time: DateTime<Utc>,
    /// Solar azimuth angle in degrees
    pub solar_azimuth: f64,
    /// Solar zenith angle in degrees
    pub solar_zenith: f64,
}

/// A multi-band surface reflectance scene on a single pixel grid.
///
/// All bands share the same shape and nominal ground sampling distance.
/// Scenes are value-like: operations derive new rasters or new scenes,
/// they never mutate bands in place.
#[derive(Debug, Clone)]
pub struct Scene {
    bands: HashMap<Band, BandData>,
    qa: Option<QaData>,
    metadata: SceneMetadata,
    pixel_spacing: f64,
    shape: (usize, usize),
}

impl Scene {
    /// Create an empty scene on a fixed grid.
    ///
    /// `pixel_spacing` is the nominal ground sampling distance in meters.
    pub fn new(shape: (usize, usize), pixel_spacing: f64, metadata: SceneMetadata) -> Self {
        Self {
            bands: HashMap::new(),
            qa: None,
            metadata,
            pixel_spacing,
            shape,
        }
    }

    /// Attach a reflectance band. Fails if the raster is not on the scene grid.
    pub fn insert_band(&mut self, band: Band, data: BandData) -> MaskResult<()> {
        self.check_shape(data.dim())?;
        self.bands.insert(band, data);
        Ok(())
    }

    /// Builder-style variant of [`Scene::insert_band`].
    pub fn with_band(mut self, band: Band, data: BandData) -> MaskResult<Self> {
        self.insert_band(band, data)?;
        Ok(self)
    }

    /// Attach the packed QA channel.
    pub fn insert_qa(&mut self, qa: QaData) -> MaskResult<()> {
        self.check_shape(qa.dim())?;
        self.qa = Some(qa);
        Ok(())
    }

    /// Builder-style variant of [`Scene::insert_qa`].
    pub fn with_qa(mut self, qa: QaData) -> MaskResult<Self> {
        self.insert_qa(qa)?;
        Ok(self)
    }

    /// Look up a reflectance band. Never substitutes a default.
    pub fn band(&self, band: Band) -> MaskResult<&BandData> {
        self.bands.get(&band).ok_or(MaskError::MissingBand(band))
    }

    pub fn has_band(&self, band: Band) -> bool {
        self.bands.contains_key(&band)
    }

    /// The packed QA channel, if the scene carries one.
    pub fn qa(&self) -> Option<&QaData> {
        self.qa.as_ref()
    }

    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    /// Ground sampling distance in meters.
    pub fn pixel_spacing(&self) -> f64 {
        self.pixel_spacing
    }

    /// Grid shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Iterate over the attached reflectance bands.
    pub fn bands(&self) -> impl Iterator<Item = (Band, &BandData)> {
        self.bands.iter().map(|(b, d)| (*b, d))
    }

    fn check_shape(&self, dim: (usize, usize)) -> MaskResult<()> {
        if dim != self.shape {
            return Err(MaskError::ShapeMismatch {
                expected: self.shape,
                actual: dim,
            });
        }
        Ok(())
    }
}

/// Error types for mask generation
#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("required band '{0}' is missing from the scene")]
    MissingBand(Band),

    #[error("raster shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("processing error: {0}")]
    Processing(String),
}

/// Result type for mask operations
pub type MaskResult<T> = Result<T, MaskError>;
