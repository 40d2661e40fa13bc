//! # Script interpreter module
//!
//! This module provides an interpreter for timed event scripts. Each line of a
//! script has the form
//!
//! ```text
//! <time_s>: <json payload>;
//! ```
//!
//! where the payload is deserialised into the caller's event type.

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

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An event which is scripted to occur at a specific time.
struct ScriptedEvent<E> {
    /// The time the event is supposed to occur at
    exec_time_s: f64,

    event: E
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending` to
/// acquire the events that are due.
pub struct ScriptInterpreter<E> {
    script_path: PathBuf,
    events: VecDeque<ScriptedEvent<E>>
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

    #[error("Script contains an invalid event at {0} s: {1}")]
    InvalidEvent(f64, serde_json::Error),

    #[error("Script events are not in time order ({0} s follows {1} s)")]
    OutOfOrder(f64, f64)
}

pub enum PendingEvents<E> {
    None,
    Some(Vec<E>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E: DeserializeOwned> ScriptInterpreter<E> {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        let mut interp = Self::from_script(&script)?;
        interp.script_path = path;

        Ok(interp)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of events
        let mut queue: VecDeque<ScriptedEvent<E>> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(|e| ScriptError::InvalidTimestamp(e.to_string()))?;

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or_default();

            // Parse the exec time
            let exec_time_s: f64 = match time_str.parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            if let Some(last) = queue.back() {
                if exec_time_s < last.exec_time_s {
                    return Err(ScriptError::OutOfOrder(
                        exec_time_s, last.exec_time_s))
                }
            }

            // Parse the event from the payload. The scripts contain JSON only.
            let event = match serde_json::from_str(payload) {
                Ok(e) => e,
                Err(e) => return Err(ScriptError::InvalidEvent(
                    exec_time_s, e
                ))
            };

            queue.push_back(ScriptedEvent {
                exec_time_s,
                event
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: PathBuf::new(),
            events: queue
        })
    }
}

impl<E> ScriptInterpreter<E> {
    /// Return the events whose execution time is at or before
    /// `current_time_s`.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingEvents<E> {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.events.is_empty() {
            return PendingEvents::EndOfScript
        }

        let mut due: Vec<E> = vec![];

        // Keep popping events off the front of the queue until the head is in
        // the future.
        while self.events
            .front()
            .map(|e| e.exec_time_s <= current_time_s)
            .unwrap_or(false)
        {
            if let Some(e) = self.events.pop_front() {
                due.push(e.event);
            }
        }

        if !due.is_empty() {
            PendingEvents::Some(due)
        }
        else {
            PendingEvents::None
        }
    }

    /// Get the number of events remaining in the script
    pub fn get_num_events(&self) -> usize {
        self.events.len()
    }

    /// Get the time of the last event in the script
    pub fn get_duration(&self) -> f64 {
        match self.events.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// Path the script was loaded from, empty if loaded from a string.
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(tag = "type")]
    enum TestEvent {
        Ping,
        Set { value: f64 }
    }

    #[test]
    fn test_pending_events() {
        let script = "\
            0.0: {\"type\": \"Ping\"};\n\
            # comment lines are ignored\n\
            1.5: {\"type\": \"Set\", \"value\": 2.0};\n\
            1.5: {\"type\": \"Ping\"};\n";

        let mut interp = ScriptInterpreter::<TestEvent>::from_script(script).unwrap();
        assert_eq!(interp.get_num_events(), 3);
        assert_eq!(interp.get_duration(), 1.5);

        match interp.get_pending(0.0) {
            PendingEvents::Some(v) => assert_eq!(v, vec![TestEvent::Ping]),
            _ => panic!("Expected the first event")
        }

        assert!(matches!(interp.get_pending(1.0), PendingEvents::None));

        match interp.get_pending(2.0) {
            PendingEvents::Some(v) => assert_eq!(
                v, vec![TestEvent::Set { value: 2.0 }, TestEvent::Ping]),
            _ => panic!("Expected the remaining events")
        }

        assert!(matches!(interp.get_pending(3.0), PendingEvents::EndOfScript));
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::<TestEvent>::from_script("nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::<TestEvent>::from_script("1.0: {\"type\": \"Nope\"};"),
            Err(ScriptError::InvalidEvent(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::<TestEvent>::from_script(
                "2.0: {\"type\": \"Ping\"};\n1.0: {\"type\": \"Ping\"};"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
    }
}
