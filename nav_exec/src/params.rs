//! # Navigation Executable Parameters
//!
//! This module provide parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::geom::FieldDims;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavExecParams {
    /// Host name or address of the actuator controller
    pub act_host: String,

    /// Port of the actuator controller
    pub act_port: u16,

    /// Units: milliseconds
    pub act_connect_timeout_ms: u64,

    /// Units: milliseconds
    pub act_write_timeout_ms: u64,

    /// Exit if the actuator controller can't be reached, otherwise carry on without it
    pub exit_on_link_fail: bool,

    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Size of the camera image the field fills.
    ///
    /// Units: pixels
    pub field: FieldDims,
}

impl Default for NavExecParams {
    fn default() -> Self {
        Self {
            act_host: "192.168.43.44".into(),
            act_port: 59898,
            act_connect_timeout_ms: 2000,
            act_write_timeout_ms: 100,
            exit_on_link_fail: true,
            cycle_period_s: 1.0 / 30.0,
            field: FieldDims::new(640.0, 480.0),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params() {
        let params: NavExecParams = util::params::from_toml_str(
            "act_host = \"127.0.0.1\"\n\
             exit_on_link_fail = false\n\
             \n\
             [field]\n\
             width = 800.0\n\
             height = 600.0\n"
        ).unwrap();

        assert_eq!(params.act_host, "127.0.0.1");
        assert_eq!(params.act_port, 59898);
        assert!(!params.exit_on_link_fail);
        assert_eq!(params.field.center(), FieldDims::new(800.0, 600.0).center());
    }
}
