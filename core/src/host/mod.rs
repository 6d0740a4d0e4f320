//! Host abstraction seam.
//!
//! Everything the lifecycle core needs from the surrounding platform (the
//! windowing shell, the process host) is expressed as the traits in this
//! module. The core never talks to a concrete host type, which is what
//! keeps [`LifecycleController`](crate::controller::LifecycleController)
//! testable against the in-process fakes in [`dummy`].

pub mod dummy;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::deferral::DeferralGuard;
use crate::input::Key;

/// Identifies one sink registration on one event source.
///
/// Tokens are only meaningful to the source that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationToken(u64);

/// Receiver of host lifecycle events.
///
/// Implement this trait to observe the host. All methods default to no-ops
/// so implementations only override what they care about.
///
/// Sinks are invoked synchronously on whichever thread the host delivers
/// events from, so implementations should be quick and must not block on
/// the delivering thread.
pub trait LifecycleEventSink: Send + Sync {
    /// The host activated the application's view.
    fn on_activated(&self) {}

    /// The host is about to suspend the application.
    ///
    /// Take a deferral from `op` to run shutdown work beyond the callback
    /// itself; the host waits until the deferral completes or the grace
    /// period runs out.
    fn on_suspending(&self, _op: &dyn SuspendingOperation) {}

    /// The host brought the application back from suspension.
    fn on_resuming(&self) {}

    /// The host is tearing the application down.
    fn on_exiting(&self) {}

    /// The window client area was resized to the given bounds.
    fn on_window_size_changed(&self, _width: u32, _height: u32) {}

    /// The window became visible or hidden.
    fn on_visibility_changed(&self, _visible: bool) {}

    /// The window was closed.
    fn on_window_closed(&self) {}

    /// The display scale factor changed.
    fn on_dpi_changed(&self, _scale_factor: f64) {}

    /// The display orientation changed.
    fn on_orientation_changed(&self) {}

    /// The display contents were invalidated and need re-presenting.
    fn on_display_contents_invalidated(&self) {}

    /// A key was pressed (`pressed == true`) or released.
    fn on_key(&self, _key: Key, _pressed: bool) {}
}

/// A host object that emits lifecycle events to registered sinks.
///
/// Registration is dynamic: sinks can come and go over the object's
/// lifetime, and [`unregister`](LifecycleEventSource::unregister) with a
/// stale token is a reported no-op rather than an error.
pub trait LifecycleEventSource: Send + Sync {
    /// Registers a sink and returns the token that removes it again.
    fn register(&self, sink: Arc<dyn LifecycleEventSink>) -> RegistrationToken;

    /// Removes a previously registered sink. Returns whether the token was
    /// still registered.
    fn unregister(&self, token: RegistrationToken) -> bool;
}

/// Process-level host controls.
pub trait HostControl: Send + Sync {
    /// Asks the host to terminate the application.
    ///
    /// Idempotent; the host ends its dispatch loop as soon as it processes
    /// the request.
    fn request_exit(&self);
}

/// A host window.
///
/// Also an event source: window-scoped events (size, visibility, keys)
/// are delivered to sinks registered on the window itself.
pub trait HostWindow: LifecycleEventSource {
    /// Current client-area bounds in physical pixels, width by height.
    fn bounds(&self) -> (u32, u32);

    /// Sets the title bar text.
    fn set_title(&self, title: &str);

    /// Sets the smallest size the user may resize the window to.
    fn set_min_size(&self, width: u32, height: u32);

    /// Asks the host to resize the window. The host may clamp or ignore
    /// the request; the authoritative size arrives through
    /// [`on_window_size_changed`](LifecycleEventSink::on_window_size_changed).
    fn request_size(&self, width: u32, height: u32);

    /// Brings the window to the foreground and gives it input focus.
    fn activate(&self);
}

/// The host's in-flight suspend, offered to sinks during
/// [`on_suspending`](LifecycleEventSink::on_suspending).
pub trait SuspendingOperation: Send + Sync {
    /// Takes a deferral on the suspend.
    ///
    /// The host holds the suspend open until the returned guard completes,
    /// within the grace period described by
    /// [`SUSPEND_GRACE_PERIOD`](crate::deferral::SUSPEND_GRACE_PERIOD).
    fn acquire_deferral(&self) -> DeferralGuard;
}

/// The host's event dispatch loop, reduced to the two pumping modes the
/// lifecycle run sequence needs.
pub trait Dispatcher {
    /// Processes every event already queued, then returns without waiting
    /// for more.
    fn drain_pending(&mut self);

    /// Blocks processing events until the host signals termination.
    fn run_until_quit(&mut self);
}

/// Token-keyed sink list, shared by the host implementations in this
/// workspace.
///
/// Dispatch snapshots the list and invokes sinks outside the lock, so a
/// sink may register or unregister during delivery; the change is visible
/// from the next dispatch.
pub struct SinkRegistry {
    sinks: Mutex<Vec<(RegistrationToken, Arc<dyn LifecycleEventSink>)>>,
    next_token: AtomicU64,
}

impl SinkRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Adds a sink and issues its token.
    pub fn register(&self, sink: Arc<dyn LifecycleEventSink>) -> RegistrationToken {
        let token = RegistrationToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.sinks.lock().push((token, sink));
        token
    }

    /// Removes a sink. Returns whether the token was present.
    pub fn unregister(&self, token: RegistrationToken) -> bool {
        let mut sinks = self.sinks.lock();
        let before = sinks.len();
        sinks.retain(|(sink_token, _)| *sink_token != token);
        sinks.len() != before
    }

    /// Invokes `f` for every registered sink, in registration order.
    pub fn for_each(&self, f: impl Fn(&dyn LifecycleEventSink)) {
        let snapshot: Vec<Arc<dyn LifecycleEventSink>> = self
            .sinks
            .lock()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();
        for sink in snapshot {
            f(sink.as_ref());
        }
    }

    /// Returns the number of registered sinks.
    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Returns true if no sinks are registered.
    pub fn is_empty(&self) -> bool {
        self.sinks.lock().is_empty()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level event source backed by a [`SinkRegistry`].
///
/// Hosts push process-scoped events (activation, suspend, resume, exit)
/// through the `emit_*` methods; the controller and other observers attach
/// through the [`LifecycleEventSource`] side.
pub struct EventRouter {
    registry: SinkRegistry,
}

impl EventRouter {
    /// Creates a router with no sinks.
    pub fn new() -> Self {
        Self {
            registry: SinkRegistry::new(),
        }
    }

    /// Delivers `on_activated` to every sink.
    pub fn emit_activated(&self) {
        self.registry.for_each(|sink| sink.on_activated());
    }

    /// Delivers `on_suspending` to every sink.
    pub fn emit_suspending(&self, op: &dyn SuspendingOperation) {
        self.registry.for_each(|sink| sink.on_suspending(op));
    }

    /// Delivers `on_resuming` to every sink.
    pub fn emit_resuming(&self) {
        self.registry.for_each(|sink| sink.on_resuming());
    }

    /// Delivers `on_exiting` to every sink.
    pub fn emit_exiting(&self) {
        self.registry.for_each(|sink| sink.on_exiting());
    }

    /// Returns the number of attached sinks.
    pub fn sink_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleEventSource for EventRouter {
    fn register(&self, sink: Arc<dyn LifecycleEventSink>) -> RegistrationToken {
        self.registry.register(sink)
    }

    fn unregister(&self, token: RegistrationToken) -> bool {
        self.registry.unregister(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingSink {
        activations: AtomicUsize,
    }

    impl CountingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                activations: AtomicUsize::new(0),
            })
        }
    }

    impl LifecycleEventSink for CountingSink {
        fn on_activated(&self) {
            self.activations.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn register_unregister_roundtrip() {
        let registry = SinkRegistry::new();
        assert!(registry.is_empty());

        let sink = CountingSink::new();
        let token = registry.register(sink.clone());
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(token));
        assert!(registry.is_empty());
        // Stale token.
        assert!(!registry.unregister(token));
    }

    #[test]
    fn tokens_are_distinct_per_registration() {
        let registry = SinkRegistry::new();
        let sink = CountingSink::new();
        let a = registry.register(sink.clone());
        let b = registry.register(sink);
        assert_ne!(a, b);

        // Removing one registration leaves the other.
        assert!(registry.unregister(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn router_emits_to_all_sinks() {
        let router = EventRouter::new();
        let first = CountingSink::new();
        let second = CountingSink::new();
        router.register(first.clone());
        router.register(second.clone());

        router.emit_activated();

        assert_eq!(first.activations.load(Ordering::SeqCst), 1);
        assert_eq!(second.activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_sink_no_longer_receives() {
        let router = EventRouter::new();
        let sink = CountingSink::new();
        let token = router.register(sink.clone());

        router.emit_activated();
        assert!(router.unregister(token));
        router.emit_activated();

        assert_eq!(sink.activations.load(Ordering::SeqCst), 1);
    }
}
