//! In-process event sources.
//!
//! Reference implementations of [`EventSource`] and [`VisibilitySource`]
//! backed by a plain listener table. Embedders without a native event
//! system can emit events through these directly; the test suite drives the
//! detector with them as well.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use super::{Event, EventSource, Listener, ListenerId, VisibilitySource};

/// A window-equivalent event target.
///
/// Listeners for one event name are invoked in registration order. The
/// listener table is snapshotted before dispatch, so a listener may add or
/// remove listeners (including itself) while an `emit` is in flight; such
/// changes take effect from the next `emit`.
#[derive(Default)]
pub struct LocalEventSource {
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl LocalEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every listener registered for `name`.
    pub fn emit(&self, name: &str) {
        let event = Event::new(name);
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().expect("listener table poisoned");
            listeners
                .get(name)
                .map(|regs| regs.iter().map(|(_, l)| l.clone()).collect())
                .unwrap_or_default()
        };
        for listener in snapshot {
            listener(&event);
        }
    }

    /// Number of live registrations across all event names.
    pub fn listener_count(&self) -> usize {
        let listeners = self.listeners.lock().expect("listener table poisoned");
        listeners.values().map(Vec::len).sum()
    }
}

impl EventSource for LocalEventSource {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().expect("listener table poisoned");
        listeners
            .entry(event.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        let mut listeners = self.listeners.lock().expect("listener table poisoned");
        if let Some(regs) = listeners.get_mut(event) {
            regs.retain(|(reg_id, _)| *reg_id != id);
        }
    }
}

/// A document-equivalent target with a hidden flag.
///
/// The supported hidden-property name is fixed at construction; pass a
/// vendor-prefixed name to simulate older hosts, or build with
/// [`unsupported`](LocalVisibilitySource::unsupported) for a host without
/// any visibility API.
pub struct LocalVisibilitySource {
    events: LocalEventSource,
    hidden: AtomicBool,
    hidden_property: Option<String>,
}

impl LocalVisibilitySource {
    /// A source exposing the unprefixed `hidden` property, initially visible.
    pub fn new() -> Self {
        Self::with_property("hidden")
    }

    /// A source exposing `property` as its hidden flag.
    pub fn with_property(property: impl Into<String>) -> Self {
        Self {
            events: LocalEventSource::new(),
            hidden: AtomicBool::new(false),
            hidden_property: Some(property.into()),
        }
    }

    /// A source with no visibility support at all.
    pub fn unsupported() -> Self {
        Self {
            events: LocalEventSource::new(),
            hidden: AtomicBool::new(false),
            hidden_property: None,
        }
    }

    /// Set the hidden flag. Does not emit anything on its own; pair with
    /// [`emit`](LocalVisibilitySource::emit) of the change event, as a real
    /// host would.
    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::SeqCst);
    }

    /// Deliver an event to every listener registered for `name`.
    pub fn emit(&self, name: &str) {
        self.events.emit(name);
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }
}

impl Default for LocalVisibilitySource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for LocalVisibilitySource {
    fn add_listener(&self, event: &str, listener: Listener) -> ListenerId {
        self.events.add_listener(event, listener)
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        self.events.remove_listener(event, id)
    }
}

impl VisibilitySource for LocalVisibilitySource {
    fn supports_property(&self, property: &str) -> bool {
        self.hidden_property.as_deref() == Some(property)
    }

    fn is_hidden(&self, property: &str) -> bool {
        self.supports_property(property) && self.hidden.load(Ordering::SeqCst)
    }
}
