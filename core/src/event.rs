//! Signals that drive an exploration session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Position;

const KNOWN_KINDS: [&str; 3] = ["position_reset", "start", "end"];

/// Start state announced before each run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionReset {
    /// Index of the upcoming run.
    pub run_number: u32,
    /// Number of runs left after this one.
    pub runs_remaining: u32,
    /// Starting position in the map grid.
    pub position: (f64, f64),
    /// Starting heading in degrees, clockwise from `+y`.
    pub rotation: f64,
    /// Goal position in the map grid.
    pub target_position: (f64, f64),
}

impl PositionReset {
    /// Starting position as a vector.
    #[must_use]
    pub fn start(&self) -> Position {
        self.position.into()
    }

    /// Goal position as a vector.
    #[must_use]
    pub fn target(&self) -> Position {
        self.target_position.into()
    }

    /// Starting heading in radians.
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.rotation.to_radians()
    }
}

/// Payload of the start signal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartData {
    /// Seconds left in the session's time budget.
    pub time_remaining: f64,
}

/// Every signal a session reacts to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Event {
    /// Establishes or refreshes the start state for the next run.
    PositionReset {
        /// Start state of the run.
        #[serde(rename = "d")]
        data: PositionReset,
    },
    /// Starts a run with the given time budget.
    Start {
        /// Budget of the run.
        #[serde(rename = "d")]
        data: StartData,
    },
    /// Requests cancellation of the active run.
    End {
        /// Whether the session considers the attempt complete.
        complete: bool,
    },
}

/// Reasons an incoming signal could not be turned into an [`Event`].
#[derive(Debug, Error)]
pub enum EventError {
    /// The signal names a kind this client does not handle.
    #[error("unknown event kind `{0}`")]
    UnknownKind(String),
    /// The signal is not valid JSON or its payload does not match its kind.
    #[error("malformed event: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Deserialize)]
struct Envelope {
    op: String,
}

impl Event {
    /// Decodes a signal from its JSON wire form.
    pub fn decode(json: &str) -> Result<Event, EventError> {
        let envelope: Envelope = serde_json::from_str(json).map_err(EventError::Malformed)?;
        if !KNOWN_KINDS.contains(&envelope.op.as_str()) {
            return Err(EventError::UnknownKind(envelope.op));
        }
        serde_json::from_str(json).map_err(EventError::Malformed)
    }

    /// Wire name of the event's kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Event::PositionReset { .. } => KNOWN_KINDS[0],
            Event::Start { .. } => KNOWN_KINDS[1],
            Event::End { .. } => KNOWN_KINDS[2],
        }
    }
}
