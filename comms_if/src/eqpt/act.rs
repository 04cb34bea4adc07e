//! # Actuator Controller Commands
//!
//! The actuator controller speaks a line-oriented ASCII protocol. Every outbound command is a
//! single line made of a keyword followed by integer arguments:
//!
//! ```text
//! move <speed>
//! turn <angle_deg> <speed>
//! collect <inner_speed> <outer_speed>
//! beep <pattern>
//! ```
//!
//! Inbound lines are status notifications. Only the exact lines `stalled inner` and
//! `stalled outer` carry meaning, everything else is ignored by the client.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command sent to the actuator controller.
///
/// Commands are fire-and-forget, the controller never acknowledges them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActCmd {
    /// Drive straight at the given speed, negative speeds reverse.
    Move { speed: i32 },

    /// Turn on the spot by the given angle at the given speed.
    Turn { angle_deg: i32, speed: i32 },

    /// Run the collection mechanism, negative speeds eject.
    Collect { inner_speed: i32, outer_speed: i32 },

    /// Play a beep pattern.
    Beep { pattern: i32 },
}

/// A status notification sent by the actuator controller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActStatus {
    /// The inner collection motor has stalled
    StalledInner,

    /// The outer collection motor has stalled
    StalledOuter,
}

/// Errors which can occur while parsing a command line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ActParseError {
    #[error("Empty command line")]
    Empty,

    #[error("Unknown command keyword \"{0}\"")]
    UnknownKeyword(String),

    #[error("Command \"{0}\" expects {1} argument(s), found {2}")]
    WrongArgCount(String, usize, usize),

    #[error("Invalid integer argument \"{0}\"")]
    InvalidArg(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActCmd {
    /// The stop command, zero drive speed.
    pub const STOP: ActCmd = ActCmd::Move { speed: 0 };

    /// The keyword which starts the line for this command.
    pub fn keyword(&self) -> &'static str {
        match self {
            ActCmd::Move { .. } => "move",
            ActCmd::Turn { .. } => "turn",
            ActCmd::Collect { .. } => "collect",
            ActCmd::Beep { .. } => "beep",
        }
    }

    /// Get the command as a line to send on the wire, without the line terminator.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActCmd::Move { speed } => write!(f, "move {}", speed),
            ActCmd::Turn { angle_deg, speed } => write!(f, "turn {} {}", angle_deg, speed),
            ActCmd::Collect { inner_speed, outer_speed } =>
                write!(f, "collect {} {}", inner_speed, outer_speed),
            ActCmd::Beep { pattern } => write!(f, "beep {}", pattern),
        }
    }
}

impl FromStr for ActCmd {
    type Err = ActParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();

        let keyword = words.next().ok_or(ActParseError::Empty)?;

        let args = words
            .map(|w| w.parse::<i32>().map_err(|_| ActParseError::InvalidArg(w.into())))
            .collect::<Result<Vec<i32>, _>>()?;

        let expect = |n: usize| -> Result<(), ActParseError> {
            if args.len() == n {
                Ok(())
            } else {
                Err(ActParseError::WrongArgCount(keyword.into(), n, args.len()))
            }
        };

        match keyword {
            "move" => {
                expect(1)?;
                Ok(ActCmd::Move { speed: args[0] })
            }
            "turn" => {
                expect(2)?;
                Ok(ActCmd::Turn { angle_deg: args[0], speed: args[1] })
            }
            "collect" => {
                expect(2)?;
                Ok(ActCmd::Collect { inner_speed: args[0], outer_speed: args[1] })
            }
            "beep" => {
                expect(1)?;
                Ok(ActCmd::Beep { pattern: args[0] })
            }
            k => Err(ActParseError::UnknownKeyword(k.into())),
        }
    }
}

impl ActStatus {
    /// Wire text of the inner stall notification.
    pub const STALLED_INNER_LINE: &'static str = "stalled inner";

    /// Wire text of the outer stall notification.
    pub const STALLED_OUTER_LINE: &'static str = "stalled outer";

    /// Parse a status line.
    ///
    /// Only exact matches are recognised, any other text (including different whitespace or
    /// case) gives `None`. A single trailing `\r` from CRLF line endings is tolerated.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        match line {
            Self::STALLED_INNER_LINE => Some(ActStatus::StalledInner),
            Self::STALLED_OUTER_LINE => Some(ActStatus::StalledOuter),
            _ => None,
        }
    }

    /// Get the status as it is sent on the wire.
    pub fn as_line(&self) -> &'static str {
        match self {
            ActStatus::StalledInner => Self::STALLED_INNER_LINE,
            ActStatus::StalledOuter => Self::STALLED_OUTER_LINE,
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
    fn test_cmd_lines() {
        assert_eq!(ActCmd::Move { speed: -280 }.to_line(), "move -280");
        assert_eq!(ActCmd::Turn { angle_deg: -45, speed: 120 }.to_line(), "turn -45 120");
        assert_eq!(
            ActCmd::Collect { inner_speed: -200, outer_speed: -500 }.to_line(),
            "collect -200 -500"
        );
        assert_eq!(ActCmd::Beep { pattern: 4 }.to_line(), "beep 4");
        assert_eq!(ActCmd::STOP.to_line(), "move 0");
    }

    #[test]
    fn test_cmd_parse() {
        assert_eq!("turn 12 200".parse::<ActCmd>(), Ok(ActCmd::Turn { angle_deg: 12, speed: 200 }));
        assert_eq!("  beep   4 ".parse::<ActCmd>(), Ok(ActCmd::Beep { pattern: 4 }));
        assert_eq!("".parse::<ActCmd>(), Err(ActParseError::Empty));
        assert_eq!(
            "fly 10".parse::<ActCmd>(),
            Err(ActParseError::UnknownKeyword("fly".into()))
        );
        assert_eq!(
            "collect 1".parse::<ActCmd>(),
            Err(ActParseError::WrongArgCount("collect".into(), 2, 1))
        );
        assert_eq!(
            "move fast".parse::<ActCmd>(),
            Err(ActParseError::InvalidArg("fast".into()))
        );
    }

    #[test]
    fn test_status_exact_match() {
        assert_eq!(ActStatus::from_line("stalled inner"), Some(ActStatus::StalledInner));
        assert_eq!(ActStatus::from_line("stalled outer\r"), Some(ActStatus::StalledOuter));
        assert_eq!(ActStatus::from_line("stalled  inner"), None);
        assert_eq!(ActStatus::from_line("Stalled outer"), None);
        assert_eq!(ActStatus::from_line(" stalled outer"), None);
        assert_eq!(ActStatus::from_line("battery low"), None);
    }
}
