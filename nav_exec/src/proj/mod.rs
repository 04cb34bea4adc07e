//! # Projector
//!
//! The camera sits above the centre of the field looking straight down, so anything raised off
//! the ground appears pushed away from the field centre. The projector moves the perceived
//! corners of a raised object back towards the centre, onto the point directly below the object,
//! and then inflates the shape about its own centroid so it covers the vehicle's real outline.
//!
//! For a perceived centroid at distance `UV` from the field centre, a camera at height `TV` and an
//! object at height `AC`:
//!
//! ```text
//! theta  = atan2(UV, TV)
//! BC     = tan(theta) * AC
//! scalar = (UV - BC) / UV
//! ```
//!
//! Every corner is then scaled about the field centre by `scalar`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

pub use params::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::geom::{centroid, euclid, FieldDims, Point};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parallax corrector for raised objects.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    params: ProjParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProjError {
    #[error("At least 3 corners are needed, found {0}")]
    TooFewCorners(usize),

    #[error("The camera height must be positive and finite, found {0}")]
    InvalidCameraHeight(f64),

    #[error("Corner {0} is not finite")]
    NonFiniteCorner(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Projector {
    pub fn new(params: ProjParams) -> Result<Self, ProjError> {
        if !params.camera_height.is_finite() || params.camera_height <= 0.0 {
            return Err(ProjError::InvalidCameraHeight(params.camera_height));
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &ProjParams {
        &self.params
    }

    /// Correct the perceived corners of the object for parallax.
    pub fn project(&self, corners: &[Point], field: FieldDims) -> Result<Vec<Point>, ProjError> {
        project_corners(
            corners,
            self.params.object_height,
            self.params.camera_height,
            self.params.shape_scale,
            field
        )
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// One-shot version of `Projector::project`.
pub fn project_corners(
    corners: &[Point],
    object_height: f64,
    camera_height: f64,
    shape_scale: f64,
    field: FieldDims
) -> Result<Vec<Point>, ProjError> {
    if corners.len() < 3 {
        return Err(ProjError::TooFewCorners(corners.len()));
    }
    if !camera_height.is_finite() || camera_height <= 0.0 {
        return Err(ProjError::InvalidCameraHeight(camera_height));
    }
    if let Some(i) = corners.iter().position(|c| !(c.x.is_finite() && c.y.is_finite())) {
        return Err(ProjError::NonFiniteCorner(i));
    }

    let field_center = field.center();
    let perceived = centroid(corners).ok_or(ProjError::TooFewCorners(0))?;

    let uv = euclid(&perceived, &field_center);
    let theta = uv.atan2(camera_height);
    let bc = theta.tan() * object_height;

    // Object right under the camera has no parallax
    let scalar = if uv == 0.0 { 1.0 } else { (uv - bc) / uv };

    let grounded: Vec<Point> = corners
        .iter()
        .map(|c| field_center + (c - field_center) * scalar)
        .collect();

    let grounded_center = centroid(&grounded).ok_or(ProjError::TooFewCorners(0))?;

    Ok(grounded
        .iter()
        .map(|c| grounded_center + (c - grounded_center) * shape_scale)
        .collect())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
