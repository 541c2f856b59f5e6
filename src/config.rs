//! Detector configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::detector::State;
use crate::error::Error;

/// Configuration for an [`ActivityDetector`](crate::ActivityDetector).
///
/// All fields are optional in TOML and fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Host events that force a transition to active.
    #[serde(default = "default_activity_events")]
    pub activity_events: Vec<String>,
    /// Host events that force a transition to idle.
    #[serde(default = "default_inactivity_events")]
    pub inactivity_events: Vec<String>,
    /// Activity events that are ignored while already idle, so that noise
    /// like pointer jitter cannot wake the detector.
    #[serde(default = "default_ignored_events_when_idle")]
    pub ignored_events_when_idle: Vec<String>,
    /// Inactivity time in milliseconds before the state flips to idle.
    #[serde(default = "default_time_to_idle_ms")]
    pub time_to_idle_ms: u64,
    /// State the detector starts in.
    #[serde(default)]
    pub initial_state: State,
    /// Whether construction immediately wires listeners and arms the timer.
    #[serde(default = "default_auto_init")]
    pub auto_init: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            activity_events: default_activity_events(),
            inactivity_events: default_inactivity_events(),
            ignored_events_when_idle: default_ignored_events_when_idle(),
            time_to_idle_ms: default_time_to_idle_ms(),
            initial_state: State::default(),
            auto_init: default_auto_init(),
        }
    }
}

impl DetectorConfig {
    /// Inactivity duration before the automatic idle transition.
    pub fn time_to_idle(&self) -> Duration {
        Duration::from_millis(self.time_to_idle_ms)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DetectorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), Error> {
        if self.time_to_idle_ms == 0 {
            return Err(Error::InvalidConfig(
                "time_to_idle_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value functions

fn default_activity_events() -> Vec<String> {
    [
        "click",
        "mousemove",
        "keydown",
        "DOMMouseScroll",
        "mousewheel",
        "mousedown",
        "touchstart",
        "touchmove",
        "focus",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_inactivity_events() -> Vec<String> {
    vec!["blur".to_string()]
}

fn default_ignored_events_when_idle() -> Vec<String> {
    vec!["mousemove".to_string()]
}

fn default_time_to_idle_ms() -> u64 {
    30_000
}

fn default_auto_init() -> bool {
    true
}
