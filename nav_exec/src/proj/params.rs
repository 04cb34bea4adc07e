//! Parameters structure for the projector

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjParams {
    /// Height of the tracked marker above the ground.
    ///
    /// Units: millimeters
    pub object_height: f64,

    /// Height of the camera above the ground, directly over the field centre.
    ///
    /// Units: millimeters
    pub camera_height: f64,

    /// Factor the corrected footprint is inflated by about its own centroid.
    pub shape_scale: f64,
}

impl Default for ProjParams {
    fn default() -> Self {
        Self {
            object_height: 80.0,
            camera_height: 545.0,
            shape_scale: 2.2,
        }
    }
}
