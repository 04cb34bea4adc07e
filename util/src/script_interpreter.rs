//! # Script interpreter module
//!
//! This module provides an interpreter for timed scripts, where each entry of the script is a
//! JSON payload scheduled at a number of seconds after the start of the session:
//!
//! ```text
//! 0.0: {"targets": [[100.0, 100.0]]};
//! 2.5: {"vehicle_corners": [[10.0, 10.0], [0.0, 5.0], [0.0, 15.0]]};
//! ```
//!
//! The executables use these to replay recorded or hand-written inputs without live sources.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An entry which is scripted to occur at a specific time.
pub struct Entry<T> {
    /// The time the entry is supposed to be released at
    exec_time_s: f64,

    /// The entry's payload
    payload: T
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending` to
/// acquire a list of entries which are now due.
pub struct ScriptInterpreter<T> {
    _script_path: PathBuf,
    entries: VecDeque<Entry<T>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script entries must be in time order, found {1} s after {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid entry at {0} s: {1}")]
    InvalidEntry(f64, serde_json::Error)
}

pub enum Pending<T> {
    None,
    Some(Vec<T>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> ScriptInterpreter<T>
where
    T: DeserializeOwned
{

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.to_string_lossy().to_string()));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        Self::from_script_str(path, &script)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script_str<P: AsRef<Path>>(
        script_path: P,
        script: &str
    ) -> Result<Self, ScriptError> {
        // Empty queue of entries
        let mut queue: VecDeque<Entry<T>> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = match RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
        {
            Ok(r) => r,
            Err(_) => return Err(ScriptError::ScriptEmpty)
        };

        for cap in re.captures_iter(script) {
            let (time_str, payload_str) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str.parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            // Entries are released from the front so they must be sorted
            if let Some(last) = queue.back() {
                if exec_time_s < last.exec_time_s {
                    return Err(ScriptError::OutOfOrder(last.exec_time_s, exec_time_s))
                }
            }

            // Parse the payload, the scripts contain JSON only.
            let payload = serde_json::from_str(payload_str)
                .map_err(|e| ScriptError::InvalidEntry(exec_time_s, e))?;

            queue.push_back(Entry {
                exec_time_s,
                payload
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            _script_path: PathBuf::from(script_path.as_ref()),
            entries: queue
        })
    }

    /// Return the entries which are due at the current session time.
    pub fn get_pending(&mut self) -> Pending<T> {
        self.get_pending_at(get_elapsed_seconds())
    }

    /// Return the entries which are due at the given time.
    pub fn get_pending_at(&mut self, current_time_s: f64) -> Pending<T> {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.entries.is_empty() {
            return Pending::EndOfScript
        }

        let mut due: Vec<T> = vec![];

        // Pop items from the front of the queue until the exec times are in the future
        while self.entries
            .front()
            .map(|e| e.exec_time_s <= current_time_s)
            .unwrap_or(false)
        {
            if let Some(e) = self.entries.pop_front() {
                due.push(e.payload);
            }
        }

        if due.is_empty() {
            Pending::None
        }
        else {
            Pending::Some(due)
        }
    }

    /// Get the number of entries remaining in the script
    pub fn get_num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(e) => e.exec_time_s,
            None => 0f64
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        id: u32
    }

    const SCRIPT: &str = "
        0.0: {\"id\": 0};
        0.5: {\"id\": 1};
        0.5: {\"id\": 2};
        2: {\"id\": 3};
    ";

    #[test]
    fn test_pending_entries() {
        let mut si: ScriptInterpreter<Payload> =
            ScriptInterpreter::from_script_str("test.script", SCRIPT).unwrap();

        assert_eq!(si.get_num_entries(), 4);
        assert_eq!(si.get_duration(), 2.0);

        match si.get_pending_at(0.0) {
            Pending::Some(v) => assert_eq!(v, vec![Payload { id: 0 }]),
            _ => panic!("Expected the first entry")
        }
        assert!(matches!(si.get_pending_at(0.1), Pending::None));
        match si.get_pending_at(1.0) {
            Pending::Some(v) => assert_eq!(v, vec![Payload { id: 1 }, Payload { id: 2 }]),
            _ => panic!("Expected both 0.5 s entries")
        }
        assert!(matches!(si.get_pending_at(5.0), Pending::Some(_)));
        assert!(matches!(si.get_pending_at(6.0), Pending::EndOfScript));
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::<Payload>::from_script_str("empty", "# nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::<Payload>::from_script_str("bad", "1.0: {\"id\": \"x\"};"),
            Err(ScriptError::InvalidEntry(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::<Payload>::from_script_str(
                "order", "1.0: {\"id\": 0};\n0.5: {\"id\": 1};"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
    }
}
