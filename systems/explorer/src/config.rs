//! Timing parameters of an exploration run.

use std::time::Duration;

use micromouse_system_tracker::TrackerConfig;
use serde::Deserialize;
use thiserror::Error;

/// Settings that shape the per-tile cycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Motion and sensing constants handed to the tracker.
    pub tracker: TrackerConfig,
    /// Share of each tile period spent moving before the next direction is
    /// chosen.
    pub decision_fraction: f64,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            decision_fraction: 0.8,
        }
    }
}

/// Settings that cannot drive a run.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Speed must be positive and finite.
    #[error("tiles_per_second must be positive and finite, got {0}")]
    Speed(f64),
    /// The decision point must fall within the tile period.
    #[error("decision_fraction must lie within [0, 1], got {0}")]
    DecisionFraction(f64),
    /// The nudge must be a finite, non-negative distance.
    #[error("wall_nudge must be finite and non-negative, got {0}")]
    WallNudge(f64),
}

impl ExploreConfig {
    /// Checks that every value describes a runnable cycle.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let speed = self.tracker.tiles_per_second;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::Speed(speed));
        }
        if !(0.0..=1.0).contains(&self.decision_fraction) {
            return Err(ConfigError::DecisionFraction(self.decision_fraction));
        }
        let nudge = self.tracker.wall_nudge;
        if !(nudge.is_finite() && nudge >= 0.0) {
            return Err(ConfigError::WallNudge(nudge));
        }
        Ok(self)
    }

    /// Time needed to cross one tile. Zero for a speed that fails
    /// [`ExploreConfig::validate`].
    #[must_use]
    pub fn tile_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.tracker.tiles_per_second.recip()).unwrap_or_default()
    }

    /// Time spent moving before each decision.
    #[must_use]
    pub fn decision_interval(&self) -> Duration {
        let seconds = self.tile_period().as_secs_f64() * self.decision_fraction;
        Duration::try_from_secs_f64(seconds).unwrap_or_default()
    }

    /// Time spent moving between a decision and the end of the tile.
    #[must_use]
    pub fn rest_interval(&self) -> Duration {
        self.tile_period().saturating_sub(self.decision_interval())
    }

    /// Number of tiles the mouse can cross in `time_remaining` seconds.
    #[must_use]
    pub fn tile_budget(&self, time_remaining: f64) -> u32 {
        let tiles = (time_remaining * self.tracker.tiles_per_second).floor();
        if tiles.is_nan() || tiles <= 0.0 {
            0
        } else {
            // Float to int casts saturate.
            tiles as u32
        }
    }
}
