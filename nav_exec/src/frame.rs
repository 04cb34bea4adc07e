//! # Frames
//!
//! A frame is what the vision system and path planner hand over for one camera image. In a frame
//! script every field except the vehicle corners is optional and only applied when present, so a
//! script can update the targets or intent once and then just move the vehicle.
//!
//! ```text
//! 0.0: {"vehicle_corners": [[340, 240], [300, 225], [300, 255]], "targets": [[500, 240]]};
//! 0.5: {"vehicle_corners": [[360, 240], [320, 225], [320, 255]]};
//! 4.0: {"vehicle_corners": [[500, 240], [460, 225], [460, 255]],
//!       "intent": {"towards_goal": true}, "targets": [[30, 240]]};
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{geom::Point, pose::PathIntent};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Vision and planner output for one camera image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Perceived corners of the vehicle's marker, nose first. These are projected before use.
    pub vehicle_corners: Vec<Point>,

    /// New waypoint queue from the planner
    #[serde(default)]
    pub targets: Option<Vec<Point>>,

    /// New path intent from the planner
    #[serde(default)]
    pub intent: Option<PathIntent>,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use util::script_interpreter::{Pending, ScriptInterpreter};

    #[test]
    fn test_frame_script() {
        let script = "
            0.0: {\"vehicle_corners\": [[340, 240], [300, 225], [300, 255]], \"targets\": [[500, 240]]};
            0.5: {\"vehicle_corners\": [[360, 240], [320, 225], [320, 255]],
                  \"intent\": {\"towards_goal\": true}};
        ";

        let mut si: ScriptInterpreter<Frame> =
            ScriptInterpreter::from_script_str("frames", script).unwrap();
        assert_eq!(si.get_num_entries(), 2);

        let frames = match si.get_pending_at(1.0) {
            Pending::Some(f) => f,
            _ => panic!("Expected both frames")
        };

        assert_eq!(frames[0].targets, Some(vec![Point::new(500.0, 240.0)]));
        assert_eq!(frames[0].intent, None);
        assert_eq!(frames[1].vehicle_corners[0], Point::new(360.0, 240.0));
        assert_eq!(
            frames[1].intent,
            Some(PathIntent { towards_goal: true, reverse: false })
        );
    }
}
