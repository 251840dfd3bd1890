//! Optional TOML settings file.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use micromouse_simulator::SimulatorConfig;
use micromouse_system_explorer::ExploreConfig;
use serde::Deserialize;

/// Every tunable the CLI reads from disk. Missing sections and keys keep
/// their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// `[explore]` and `[explore.tracker]`.
    pub(crate) explore: ExploreConfig,
    /// `[simulator]`.
    pub(crate) simulator: SimulatorConfig,
}

impl Settings {
    /// Reads settings from a TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load settings from {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse settings toml contents")
    }
}
