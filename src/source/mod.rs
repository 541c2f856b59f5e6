//! Host event abstraction.
//!
//! The detector never talks to a real window or document directly; it is
//! handed two capabilities at construction time: an [`EventSource`] for the
//! window-equivalent (interaction events) and a [`VisibilitySource`] for the
//! document-equivalent (page visibility). Any embedding that can deliver
//! named events can implement these, and [`local`] provides an in-process
//! implementation for hosts without a native event system (and for tests).

pub mod local;
pub mod visibility;

use std::sync::Arc;

/// An event delivered by a host source.
#[derive(Debug, Clone)]
pub struct Event {
    /// Host event name, e.g. `click` or `visibilitychange`.
    pub name: String,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A registered event listener.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Identifies one listener registration on one source.
///
/// Registrations are identified by id rather than by callback identity, so
/// the same closure registered twice can still be removed individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A target that dispatches named events to registered listeners.
pub trait EventSource: Send + Sync {
    /// Register `listener` for events named `event`.
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerId;

    /// Remove a previous registration. Removing an id that is no longer
    /// registered is a no-op.
    fn remove_listener(&self, event: &str, id: ListenerId);
}

/// A document-equivalent target that also exposes page visibility.
pub trait VisibilitySource: EventSource {
    /// Whether the host exposes the given hidden-state property
    /// (e.g. `hidden` or `webkitHidden`).
    fn supports_property(&self, property: &str) -> bool;

    /// Current hidden state as reported through `property`.
    fn is_hidden(&self, property: &str) -> bool;
}
