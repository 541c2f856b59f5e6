//! The activity state machine.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::DetectorConfig;
use crate::error::Error;
use crate::source::visibility::{self, VisibilityCapability};
use crate::source::{Event, EventSource, Listener, ListenerId, VisibilitySource};

use super::State;

/// A subscriber callback, invoked on every transition into its state.
type Callback = Arc<Mutex<dyn FnMut() + Send>>;

/// One `on` registration. Registrations carry their own id so removal never
/// depends on callback identity; the same callback registered twice is two
/// independent registrations.
struct Registration {
    id: u64,
    callback: Callback,
}

/// Per-state callback lists, invoked in insertion order.
#[derive(Default)]
struct Registry {
    active: Vec<Registration>,
    idle: Vec<Registration>,
}

impl Registry {
    fn list(&self, state: State) -> &[Registration] {
        match state {
            State::Active => &self.active,
            State::Idle => &self.idle,
        }
    }

    fn list_mut(&mut self, state: State) -> &mut Vec<Registration> {
        match state {
            State::Active => &mut self.active,
            State::Idle => &mut self.idle,
        }
    }

    fn clear(&mut self) {
        self.active.clear();
        self.idle.clear();
    }
}

/// Which injected source a listener was attached to.
enum SourceKind {
    Window,
    Document,
}

/// A listener attachment made by `init`, remembered so `stop` can undo it.
struct Attachment {
    source: SourceKind,
    event: String,
    id: ListenerId,
}

/// Shared detector state. The lock is never held while subscriber callbacks
/// run, so callbacks may re-enter the detector.
struct Core {
    config: DetectorConfig,
    /// Current state; `None` until the first transition, which makes the
    /// `init` transition observable to subscribers registered beforehand.
    state: Option<State>,
    listeners: Registry,
    next_subscription_id: u64,
    /// Bumped on every cancellation; a pending timer task must observe its
    /// own generation before it may fire.
    timer_gen: u64,
    idle_timer: Option<JoinHandle<()>>,
    attached: Vec<Attachment>,
}

impl Core {
    /// Run one transition. Cancels the pending idle timer, rearms it when
    /// entering (or re-entering) the active state, and returns the
    /// callbacks to invoke once the lock is released. A transition to the
    /// current state rearms the timer but notifies nobody.
    fn transition(&mut self, new_state: State, core: &Arc<Mutex<Core>>) -> Vec<Callback> {
        self.cancel_idle_timer();
        if new_state == State::Active {
            self.arm_idle_timer(core);
        }
        if self.state == Some(new_state) {
            return Vec::new();
        }
        self.state = Some(new_state);
        debug!(state = %new_state, "state changed");
        self.listeners
            .list(new_state)
            .iter()
            .map(|r| r.callback.clone())
            .collect()
    }

    fn cancel_idle_timer(&mut self) {
        self.timer_gen = self.timer_gen.wrapping_add(1);
        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
        }
    }

    fn arm_idle_timer(&mut self, core: &Arc<Mutex<Core>>) {
        let armed_gen = self.timer_gen;
        let delay = self.config.time_to_idle();
        let weak = Arc::downgrade(core);
        self.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            idle_timeout_fired(weak, armed_gen);
        }));
    }
}

fn lock_core(core: &Mutex<Core>) -> MutexGuard<'_, Core> {
    core.lock().unwrap_or_else(|e| e.into_inner())
}

/// Run a transition against the shared core and notify subscribers.
fn apply_transition(core: &Arc<Mutex<Core>>, new_state: State) {
    let callbacks = {
        let mut guard = lock_core(core);
        guard.transition(new_state, core)
    };
    invoke_callbacks(&callbacks);
}

/// Invoke one transition's callbacks in registration order. A panicking
/// subscriber is caught and logged so the remaining callbacks still run and
/// the state machine stays usable.
fn invoke_callbacks(callbacks: &[Callback]) {
    for callback in callbacks {
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut callback = callback.lock().unwrap_or_else(|e| e.into_inner());
            (*callback)();
        }));
        if result.is_err() {
            error!("state change callback panicked, skipping it");
        }
    }
}

fn idle_timeout_fired(core: Weak<Mutex<Core>>, armed_gen: u64) {
    let Some(core) = core.upgrade() else { return };
    let callbacks = {
        let mut guard = lock_core(&core);
        if guard.timer_gen != armed_gen {
            // Cancelled between expiry and acquiring the lock.
            return;
        }
        guard.transition(State::Idle, &core)
    };
    invoke_callbacks(&callbacks);
}

/// An activity event wakes the detector unless it arrives while idle and
/// its name is on the ignore list, in which case it is dropped entirely and
/// does not touch the timer.
fn handle_activity_event(core: &Weak<Mutex<Core>>, event_name: &str) {
    let Some(core) = core.upgrade() else { return };
    let should_activate = {
        let guard = lock_core(&core);
        guard.state == Some(State::Active)
            || !guard
                .config
                .ignored_events_when_idle
                .iter()
                .any(|e| e == event_name)
    };
    if should_activate {
        apply_transition(&core, State::Active);
    }
}

fn handle_inactivity_event(core: &Weak<Mutex<Core>>) {
    let Some(core) = core.upgrade() else { return };
    apply_transition(&core, State::Idle);
}

fn handle_visibility_event(core: &Weak<Mutex<Core>>, hidden: bool) {
    let Some(core) = core.upgrade() else { return };
    let new_state = if hidden { State::Idle } else { State::Active };
    apply_transition(&core, new_state);
}

/// Detects whether a user is active or idle from host events.
///
/// The detector owns a two-state machine, one idle timer and a registry of
/// subscriber callbacks. It is driven entirely by the two injected sources:
/// a window-equivalent [`EventSource`] delivering interaction events and a
/// document-equivalent [`VisibilitySource`] delivering page visibility.
///
/// The idle timer runs as a Tokio task, so the detector must be created and
/// initialized from within a Tokio runtime.
///
/// Dropping the detector stops it.
pub struct ActivityDetector {
    core: Arc<Mutex<Core>>,
    window: Arc<dyn EventSource>,
    document: Arc<dyn VisibilitySource>,
    /// Visibility capability, probed once at construction.
    capability: Option<VisibilityCapability>,
}

impl ActivityDetector {
    /// Create a new detector.
    ///
    /// Validates `config` and probes `document` for visibility support.
    /// When `config.auto_init` is set, the detector starts immediately with
    /// `config.initial_state`; otherwise call [`init`](Self::init) or
    /// [`init_as`](Self::init_as) when ready.
    pub fn new(
        config: DetectorConfig,
        window: Arc<dyn EventSource>,
        document: Arc<dyn VisibilitySource>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let capability = visibility::detect(document.as_ref());
        let auto_init = config.auto_init;
        let initial_state = config.initial_state;

        let detector = Self {
            core: Arc::new(Mutex::new(Core {
                config,
                state: None,
                listeners: Registry::default(),
                next_subscription_id: 0,
                timer_gen: 0,
                idle_timer: None,
                attached: Vec::new(),
            })),
            window,
            document,
            capability,
        };

        if auto_init {
            detector.init_as(initial_state);
        }
        Ok(detector)
    }

    /// Start the detector in the default first state (active).
    pub fn init(&self) {
        self.init_as(State::default());
    }

    /// Start the detector in an explicit first state.
    ///
    /// Performs the initial transition (subscribers registered beforehand
    /// are notified), then attaches the activity, inactivity and
    /// visibility listeners. Not idempotent: a second `init` without an
    /// intervening [`stop`](Self::stop) attaches a second set of
    /// listeners. Callers pair each `init` with exactly one `stop`.
    pub fn init_as(&self, first_state: State) {
        apply_transition(&self.core, first_state);

        let (activity_events, inactivity_events) = {
            let core = lock_core(&self.core);
            (
                core.config.activity_events.clone(),
                core.config.inactivity_events.clone(),
            )
        };

        for name in &activity_events {
            let weak = Arc::downgrade(&self.core);
            let listener: Listener = Arc::new(move |event: &Event| {
                handle_activity_event(&weak, &event.name);
            });
            let id = self.window.add_listener(name, listener);
            self.remember(SourceKind::Window, name.clone(), id);
        }

        for name in &inactivity_events {
            let weak = Arc::downgrade(&self.core);
            let listener: Listener = Arc::new(move |_: &Event| {
                handle_inactivity_event(&weak);
            });
            let id = self.window.add_listener(name, listener);
            self.remember(SourceKind::Window, name.clone(), id);
        }

        if let Some(capability) = self.capability {
            let weak = Arc::downgrade(&self.core);
            let document = self.document.clone();
            let listener: Listener = Arc::new(move |_: &Event| {
                let hidden = document.is_hidden(capability.hidden_property);
                handle_visibility_event(&weak, hidden);
            });
            let id = self.document.add_listener(capability.change_event, listener);
            self.remember(SourceKind::Document, capability.change_event.to_string(), id);
        }

        info!(state = %first_state, "activity detector started");
    }

    fn remember(&self, source: SourceKind, event: String, id: ListenerId) {
        lock_core(&self.core).attached.push(Attachment { source, event, id });
    }

    /// Register `callback` to run on every future transition into `state`.
    ///
    /// Callbacks for one transition run in registration order. The same
    /// callback may be registered multiple times and fires once per
    /// registration. The returned [`Subscription`] removes exactly this
    /// registration; dropping it without unsubscribing keeps the callback
    /// registered.
    pub fn on<F>(&self, state: State, callback: F) -> Subscription
    where
        F: FnMut() + Send + 'static,
    {
        let mut core = lock_core(&self.core);
        let id = core.next_subscription_id;
        core.next_subscription_id += 1;
        core.listeners.list_mut(state).push(Registration {
            id,
            callback: Arc::new(Mutex::new(callback)),
        });
        Subscription {
            state,
            id,
            core: Arc::downgrade(&self.core),
        }
    }

    /// Current state, or `None` if the detector was never initialized.
    pub fn state(&self) -> Option<State> {
        lock_core(&self.core).state
    }

    /// Stop the detector.
    ///
    /// Cancels the pending idle timer, drops every subscription (held
    /// [`Subscription`] handles become no-ops) and detaches every listener
    /// that `init` attached. Safe to call before `init` and safe to call
    /// twice.
    pub fn stop(&self) {
        let attached = {
            let mut core = lock_core(&self.core);
            core.cancel_idle_timer();
            core.listeners.clear();
            std::mem::take(&mut core.attached)
        };
        for attachment in attached {
            match attachment.source {
                SourceKind::Window => self.window.remove_listener(&attachment.event, attachment.id),
                SourceKind::Document => {
                    self.document.remove_listener(&attachment.event, attachment.id)
                }
            }
        }
        info!("activity detector stopped");
    }
}

impl Drop for ActivityDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle for one `on` registration.
pub struct Subscription {
    state: State,
    id: u64,
    core: Weak<Mutex<Core>>,
}

impl Subscription {
    /// Remove this registration. A no-op if the registration is already
    /// gone, including after [`ActivityDetector::stop`] or after the
    /// detector was dropped.
    pub fn unsubscribe(self) {
        let Some(core) = self.core.upgrade() else { return };
        let mut core = lock_core(&core);
        core.listeners.list_mut(self.state).retain(|r| r.id != self.id);
    }
}
