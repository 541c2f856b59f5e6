//! Page-visibility capability detection.
//!
//! Hosts expose the hidden flag under different property names (unprefixed
//! or vendor-prefixed). The capability is probed once per detector
//! construction and reused for the detector's lifetime, instead of being
//! re-checked on every event.

use tracing::debug;

use super::VisibilitySource;

/// A detected visibility capability: which property carries the hidden flag
/// and which event signals a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityCapability {
    pub hidden_property: &'static str,
    pub change_event: &'static str,
}

/// Candidate property/event pairs, probed in order. The unprefixed pair
/// wins over vendor-prefixed ones.
const CANDIDATES: &[VisibilityCapability] = &[
    VisibilityCapability {
        hidden_property: "hidden",
        change_event: "visibilitychange",
    },
    VisibilityCapability {
        hidden_property: "webkitHidden",
        change_event: "webkitvisibilitychange",
    },
    VisibilityCapability {
        hidden_property: "mozHidden",
        change_event: "mozvisibilitychange",
    },
    VisibilityCapability {
        hidden_property: "msHidden",
        change_event: "msvisibilitychange",
    },
];

/// Probe `source` for visibility support. Returns `None` when the host has
/// no usable hidden property, in which case visibility wiring is disabled.
pub fn detect(source: &dyn VisibilitySource) -> Option<VisibilityCapability> {
    let capability = CANDIDATES
        .iter()
        .copied()
        .find(|c| source.supports_property(c.hidden_property));

    match capability {
        Some(c) => debug!(property = c.hidden_property, "visibility support detected"),
        None => debug!("no visibility support on this host"),
    }

    capability
}
