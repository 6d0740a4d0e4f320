//! Dummy host for testing and development.
//!
//! These types don't talk to a real windowing system but provide a valid
//! host implementation, so the whole lifecycle can be driven end to end
//! from a test without a display server or platform event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::deferral::{DeferralGuard, DeferralToken};
use crate::host::{
    Dispatcher, HostControl, HostWindow, LifecycleEventSink, LifecycleEventSource,
    RegistrationToken, SinkRegistry, SuspendingOperation,
};
use crate::input::Key;

/// Dummy process control.
///
/// Records exit requests and raises the quit flag that
/// [`DummyDispatcher::run_until_quit`] blocks on.
pub struct DummyControl {
    exit_requests: AtomicUsize,
    quit: Mutex<bool>,
    quit_signal: Condvar,
}

impl DummyControl {
    /// Create a new dummy control with the quit flag down.
    pub fn new() -> Self {
        Self {
            exit_requests: AtomicUsize::new(0),
            quit: Mutex::new(false),
            quit_signal: Condvar::new(),
        }
    }

    /// Number of times `request_exit` was called.
    pub fn exit_requests(&self) -> usize {
        self.exit_requests.load(Ordering::SeqCst)
    }

    /// Whether an exit has been requested.
    pub fn quit_requested(&self) -> bool {
        *self.quit.lock()
    }

    /// Block until the quit flag is raised or `timeout` elapses.
    ///
    /// Returns `true` if quit was requested in time.
    pub fn wait_quit(&self, timeout: Duration) -> bool {
        let mut quit = self.quit.lock();
        while !*quit {
            if self.quit_signal.wait_for(&mut quit, timeout).timed_out() {
                return *quit;
            }
        }
        true
    }

    /// Block until the quit flag is raised.
    pub fn wait_quit_blocking(&self) {
        let mut quit = self.quit.lock();
        while !*quit {
            self.quit_signal.wait(&mut quit);
        }
    }
}

impl Default for DummyControl {
    fn default() -> Self {
        Self::new()
    }
}

impl HostControl for DummyControl {
    fn request_exit(&self) {
        log::trace!("DummyControl: exit requested");
        self.exit_requests.fetch_add(1, Ordering::SeqCst);
        let mut quit = self.quit.lock();
        *quit = true;
        self.quit_signal.notify_all();
    }
}

/// Dummy host window.
///
/// Tracks the presentation state a real window would have and lets tests
/// play the host's part: [`resize`](DummyWindow::resize),
/// [`press_key`](DummyWindow::press_key) and the `emit_*` methods feed
/// events to every registered sink.
pub struct DummyWindow {
    registry: SinkRegistry,
    bounds: Mutex<(u32, u32)>,
    title: Mutex<String>,
    min_size: Mutex<Option<(u32, u32)>>,
    requested_sizes: Mutex<Vec<(u32, u32)>>,
    activations: AtomicUsize,
}

impl DummyWindow {
    /// Create a window with the given initial bounds.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            registry: SinkRegistry::new(),
            bounds: Mutex::new((width, height)),
            title: Mutex::new(String::new()),
            min_size: Mutex::new(None),
            requested_sizes: Mutex::new(Vec::new()),
            activations: AtomicUsize::new(0),
        }
    }

    /// Apply a host-side resize: updates the bounds, then notifies sinks.
    ///
    /// The bounds are updated first so a sink that queries
    /// [`bounds`](HostWindow::bounds) during the callback sees the size it
    /// was just told about.
    pub fn resize(&self, width: u32, height: u32) {
        log::trace!("DummyWindow: resize to {width}x{height}");
        *self.bounds.lock() = (width, height);
        self.registry
            .for_each(|sink| sink.on_window_size_changed(width, height));
    }

    /// Deliver a key press to sinks.
    pub fn press_key(&self, key: Key) {
        self.registry.for_each(|sink| sink.on_key(key, true));
    }

    /// Deliver a key release to sinks.
    pub fn release_key(&self, key: Key) {
        self.registry.for_each(|sink| sink.on_key(key, false));
    }

    /// Deliver a window-closed event to sinks.
    pub fn close(&self) {
        self.registry.for_each(|sink| sink.on_window_closed());
    }

    /// Deliver a visibility change to sinks.
    pub fn emit_visibility(&self, visible: bool) {
        self.registry
            .for_each(|sink| sink.on_visibility_changed(visible));
    }

    /// Deliver a scale factor change to sinks.
    pub fn emit_dpi_changed(&self, scale_factor: f64) {
        self.registry.for_each(|sink| sink.on_dpi_changed(scale_factor));
    }

    /// Current title bar text.
    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    /// Minimum size applied through `set_min_size`, if any.
    pub fn min_size(&self) -> Option<(u32, u32)> {
        *self.min_size.lock()
    }

    /// Every size passed to `request_size`, in call order.
    pub fn requested_sizes(&self) -> Vec<(u32, u32)> {
        self.requested_sizes.lock().clone()
    }

    /// Number of times `activate` was called.
    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    /// Number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.registry.len()
    }
}

impl LifecycleEventSource for DummyWindow {
    fn register(&self, sink: Arc<dyn LifecycleEventSink>) -> RegistrationToken {
        self.registry.register(sink)
    }

    fn unregister(&self, token: RegistrationToken) -> bool {
        self.registry.unregister(token)
    }
}

impl HostWindow for DummyWindow {
    fn bounds(&self) -> (u32, u32) {
        *self.bounds.lock()
    }

    fn set_title(&self, title: &str) {
        log::trace!("DummyWindow: title set to {title:?}");
        *self.title.lock() = title.to_string();
    }

    fn set_min_size(&self, width: u32, height: u32) {
        *self.min_size.lock() = Some((width, height));
    }

    fn request_size(&self, width: u32, height: u32) {
        // Recorded but not applied; tests decide when the "host" resizes.
        self.requested_sizes.lock().push((width, height));
    }

    fn activate(&self) {
        log::trace!("DummyWindow: activated");
        self.activations.fetch_add(1, Ordering::SeqCst);
    }
}

struct SuspendProbe {
    acquisitions: AtomicUsize,
    completions: AtomicUsize,
    done: Mutex<bool>,
    done_signal: Condvar,
}

struct ProbeToken {
    probe: Arc<SuspendProbe>,
}

impl DeferralToken for ProbeToken {
    fn complete(self: Box<Self>) {
        self.probe.completions.fetch_add(1, Ordering::SeqCst);
        let mut done = self.probe.done.lock();
        *done = true;
        self.probe.done_signal.notify_all();
    }
}

/// Dummy suspend operation.
///
/// Counts deferral acquisitions and completions so tests can assert the
/// exactly-once completion contract.
pub struct DummySuspend {
    probe: Arc<SuspendProbe>,
}

impl DummySuspend {
    /// Create a suspend operation with no deferral taken.
    pub fn new() -> Self {
        Self {
            probe: Arc::new(SuspendProbe {
                acquisitions: AtomicUsize::new(0),
                completions: AtomicUsize::new(0),
                done: Mutex::new(false),
                done_signal: Condvar::new(),
            }),
        }
    }

    /// Number of deferrals handed out.
    pub fn acquisitions(&self) -> usize {
        self.probe.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of deferral completions received.
    pub fn completions(&self) -> usize {
        self.probe.completions.load(Ordering::SeqCst)
    }

    /// Block until a deferral completes or `timeout` elapses.
    ///
    /// Returns `true` if a completion arrived in time.
    pub fn wait_completed(&self, timeout: Duration) -> bool {
        let mut done = self.probe.done.lock();
        while !*done {
            if self
                .probe
                .done_signal
                .wait_for(&mut done, timeout)
                .timed_out()
            {
                return *done;
            }
        }
        true
    }
}

impl Default for DummySuspend {
    fn default() -> Self {
        Self::new()
    }
}

impl SuspendingOperation for DummySuspend {
    fn acquire_deferral(&self) -> DeferralGuard {
        self.probe.acquisitions.fetch_add(1, Ordering::SeqCst);
        DeferralGuard::new(Box::new(ProbeToken {
            probe: Arc::clone(&self.probe),
        }))
    }
}

/// Dummy dispatch loop driven by a [`DummyControl`]'s quit flag.
pub struct DummyDispatcher {
    control: Arc<DummyControl>,
    drains: Arc<AtomicUsize>,
    blocking_runs: Arc<AtomicUsize>,
}

impl DummyDispatcher {
    /// Create a dispatcher that quits when `control` receives an exit
    /// request.
    pub fn new(control: Arc<DummyControl>) -> Self {
        Self {
            control,
            drains: Arc::new(AtomicUsize::new(0)),
            blocking_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `drain_pending` calls.
    ///
    /// Clone before moving the dispatcher into a run thread.
    pub fn drain_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.drains)
    }

    /// Shared counter of `run_until_quit` entries.
    pub fn run_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.blocking_runs)
    }
}

impl Dispatcher for DummyDispatcher {
    fn drain_pending(&mut self) {
        log::trace!("DummyDispatcher: draining pending events");
        self.drains.fetch_add(1, Ordering::SeqCst);
    }

    fn run_until_quit(&mut self) {
        log::trace!("DummyDispatcher: blocking until quit");
        self.blocking_runs.fetch_add(1, Ordering::SeqCst);
        self.control.wait_quit_blocking();
        log::trace!("DummyDispatcher: quit observed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BoundsProbe {
        observed: Mutex<Vec<((u32, u32), (u32, u32))>>,
        window: Mutex<Option<Arc<DummyWindow>>>,
    }

    impl LifecycleEventSink for BoundsProbe {
        fn on_window_size_changed(&self, width: u32, height: u32) {
            if let Some(window) = self.window.lock().as_ref() {
                self.observed
                    .lock()
                    .push(((width, height), window.bounds()));
            }
        }
    }

    #[test]
    fn resize_updates_bounds_before_notifying() {
        let window = Arc::new(DummyWindow::new(1600, 900));
        let probe = Arc::new(BoundsProbe {
            observed: Mutex::new(Vec::new()),
            window: Mutex::new(Some(Arc::clone(&window))),
        });
        window.register(probe.clone());

        window.resize(1024, 768);

        let observed = probe.observed.lock();
        assert_eq!(observed.len(), 1);
        let (payload, queried) = observed[0];
        assert_eq!(payload, (1024, 768));
        assert_eq!(queried, (1024, 768));
    }

    #[test]
    fn control_quit_flag_wakes_waiters() {
        let control = Arc::new(DummyControl::new());
        assert!(!control.wait_quit(Duration::from_millis(10)));

        let waiter = {
            let control = Arc::clone(&control);
            std::thread::spawn(move || control.wait_quit(Duration::from_secs(5)))
        };
        control.request_exit();
        assert!(waiter.join().unwrap());
        assert_eq!(control.exit_requests(), 1);
    }

    #[test]
    fn suspend_probe_counts_completions() {
        let suspend = DummySuspend::new();
        let guard = suspend.acquire_deferral();
        assert_eq!(suspend.acquisitions(), 1);
        assert_eq!(suspend.completions(), 0);

        guard.complete();
        assert_eq!(suspend.completions(), 1);
        assert!(suspend.wait_completed(Duration::from_millis(10)));
    }

    #[test]
    fn dispatcher_returns_once_quit_is_requested() {
        let control = Arc::new(DummyControl::new());
        let mut dispatcher = DummyDispatcher::new(Arc::clone(&control));
        let drains = dispatcher.drain_counter();
        let runs = dispatcher.run_counter();

        dispatcher.drain_pending();
        assert_eq!(drains.load(Ordering::SeqCst), 1);

        let run_thread = std::thread::spawn(move || dispatcher.run_until_quit());
        control.request_exit();
        run_thread.join().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
