//! Activity detection: the two-state machine and its subscription handles.

mod machine;

use serde::{Deserialize, Serialize};

/// User activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// User is currently active.
    #[default]
    Active,
    /// User has gone idle.
    Idle,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Active => f.write_str("active"),
            State::Idle => f.write_str("idle"),
        }
    }
}

pub use machine::{ActivityDetector, Subscription};
