#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Exploration control loop and the session that drives it.
//!
//! [`explore`] runs one timed pass over the maze: observe, move most of a
//! tile, observe again, replan, finish the tile aligned to the tile clock,
//! then turn. [`Session`] owns the maze between passes and maps incoming
//! [`Event`](micromouse_core::Event)s onto runs.

mod cancel;
mod config;
mod explore;
mod session;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::{ConfigError, ExploreConfig};
pub use explore::{explore, RunFailure, RunReport, RunStatus};
pub use micromouse_system_tracker::{TrackerConfig, TrackerError};
pub use session::{RunOutcome, Session, SessionError, SessionState};
