//! Lifecycle controller.
//!
//! Wires the phase cell, worker loop, notification hub and input gate to a
//! host expressed through the [`crate::host`] traits, and drives the
//! application through its startup, suspend and shutdown sequences.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::WindowConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::host::{
    Dispatcher, HostControl, HostWindow, LifecycleEventSink, LifecycleEventSource,
    RegistrationToken, SuspendingOperation,
};
use crate::input::InputGate;
use crate::notify::{Notification, NotificationHub};
use crate::phase::PhaseCell;
use crate::worker::{NoopTask, PollPacing, WorkerLoop, WorkerTask};

struct AppBinding {
    source: Arc<dyn LifecycleEventSource>,
    token: RegistrationToken,
}

struct WindowBinding {
    window: Arc<dyn HostWindow>,
    relay_token: RegistrationToken,
    input_token: RegistrationToken,
}

struct ControllerInner {
    config: WindowConfig,
    control: Arc<dyn HostControl>,
    phase: Arc<PhaseCell>,
    hub: NotificationHub,
    worker: WorkerLoop,
    task: Mutex<Option<Box<dyn WorkerTask>>>,
    gate: Arc<InputGate>,
    app_binding: Mutex<Option<AppBinding>>,
    window_binding: Mutex<Option<WindowBinding>>,
    initialized: AtomicBool,
}

impl ControllerInner {
    /// Full exit: terminal phase transition first, then the host request.
    /// The order guarantees that anything observing the host teardown also
    /// observes `Exiting`.
    fn request_exit(&self) {
        self.phase.request_exit();
        self.control.request_exit();
    }

    fn handle_activated(&self) {
        log::debug!("view activated");
        if let Some(binding) = self.window_binding.lock().as_ref() {
            binding.window.activate();
        }
    }

    fn handle_resuming(&self) {
        log::info!("resumed from suspension");
        self.hub.publish(Notification::Resumed);
    }

    fn handle_exiting(&self) {
        log::info!("host teardown in progress");
        // Host-initiated teardown still winds the worker down.
        self.phase.request_exit();
    }

    fn handle_window_size_changed(&self, width: u32, height: u32) {
        log::debug!("window resized to {width}x{height}");
        self.hub
            .publish(Notification::WindowResized { width, height });
    }

    fn handle_visibility_changed(&self, visible: bool) {
        log::debug!("window visibility changed: {visible}");
    }

    fn handle_window_closed(&self) {
        log::info!("window closed");
    }

    fn handle_dpi_changed(&self, scale_factor: f64) {
        log::debug!("display scale factor changed to {scale_factor}");
    }

    fn handle_orientation_changed(&self) {
        log::debug!("display orientation changed");
    }

    fn handle_display_contents_invalidated(&self) {
        log::trace!("display contents invalidated");
    }
}

/// Issues the exit request when dropped, so a suspend that panics in a
/// subscriber still terminates the application instead of leaving it
/// live behind a host that believes the suspend finished.
struct ExitOnDrop {
    inner: Arc<ControllerInner>,
}

impl Drop for ExitOnDrop {
    fn drop(&mut self) {
        log::debug!("suspend sequence over, requesting exit");
        self.inner.request_exit();
    }
}

/// Completes the host's suspend deferral off the delivering thread.
///
/// Subscribers run their shutdown work during the `Suspending`
/// publication. The deferral guard and the exit hook travel into the
/// spawned thread, so whether that work returns or panics the deferral
/// completes exactly once and the application is asked to exit; the host
/// is released as soon as the work is done rather than after the full
/// grace period.
fn suspend_in_background(inner: &Arc<ControllerInner>, op: &dyn SuspendingOperation) {
    log::info!("suspend requested, deferral acquired");
    let guard = op.acquire_deferral();
    let thread_inner = Arc::clone(inner);
    let spawned = std::thread::Builder::new()
        .name("stagehand-suspend".into())
        .spawn(move || {
            // The guard is declared after the exit hook, so an unwind
            // completes the deferral before the exit request fires.
            let exit = ExitOnDrop { inner: thread_inner };
            let guard = guard;
            exit.inner.hub.publish(Notification::Suspending);
            guard.complete();
        });
    if let Err(e) = spawned {
        // The closure was dropped, which already completed the deferral.
        log::error!("failed to spawn suspend thread: {e}");
        inner.request_exit();
    }
}

/// Relay registered on host event sources on the controller's behalf.
///
/// Holds the controller weakly so a source that outlives the controller
/// delivers into nothing instead of keeping it alive.
struct ControllerSink {
    inner: Weak<ControllerInner>,
}

impl ControllerSink {
    fn with_inner(&self, f: impl FnOnce(&Arc<ControllerInner>)) {
        if let Some(inner) = self.inner.upgrade() {
            f(&inner);
        }
    }
}

impl LifecycleEventSink for ControllerSink {
    fn on_activated(&self) {
        self.with_inner(|inner| inner.handle_activated());
    }

    fn on_suspending(&self, op: &dyn SuspendingOperation) {
        self.with_inner(|inner| suspend_in_background(inner, op));
    }

    fn on_resuming(&self) {
        self.with_inner(|inner| inner.handle_resuming());
    }

    fn on_exiting(&self) {
        self.with_inner(|inner| inner.handle_exiting());
    }

    fn on_window_size_changed(&self, width: u32, height: u32) {
        self.with_inner(|inner| inner.handle_window_size_changed(width, height));
    }

    fn on_visibility_changed(&self, visible: bool) {
        self.with_inner(|inner| inner.handle_visibility_changed(visible));
    }

    fn on_window_closed(&self) {
        self.with_inner(|inner| inner.handle_window_closed());
    }

    fn on_dpi_changed(&self, scale_factor: f64) {
        self.with_inner(|inner| inner.handle_dpi_changed(scale_factor));
    }

    fn on_orientation_changed(&self) {
        self.with_inner(|inner| inner.handle_orientation_changed());
    }

    fn on_display_contents_invalidated(&self) {
        self.with_inner(|inner| inner.handle_display_contents_invalidated());
    }
}

/// Drives an application through its lifecycle against an abstract host.
///
/// The controller owns the pieces that make up the application's runtime
/// state: the shared [`PhaseCell`], the [`WorkerLoop`], the
/// [`NotificationHub`] applications subscribe to, and the [`InputGate`]
/// bound to each window. Host specifics stay behind the [`crate::host`]
/// traits.
///
/// # Lifecycle
///
/// 1. [`initialize`](LifecycleController::initialize) - attach to the
///    host's application-level event source
/// 2. [`set_window`](LifecycleController::set_window) - bind a window and
///    apply the [`WindowConfig`]
/// 3. [`load`](LifecycleController::load) - announce `Loaded` so the
///    application prepares its content
/// 4. [`run`](LifecycleController::run) - drain startup events, start the
///    worker, then block dispatching until the host quits
///
/// Shutdown can start anywhere: the cancel key, a host suspend, an
/// explicit [`exit`](LifecycleController::exit) call or the worker loop
/// finishing all converge on the terminal `Exiting` phase.
///
/// Controllers are cheap to clone; clones share the same state.
///
/// # Example
///
/// ```ignore
/// let controller = LifecycleController::new(WindowConfig::default(), control);
/// controller.initialize(host_events)?;
/// controller.set_window(window);
/// controller.notifications().subscribe(|n| log::info!("{n:?}"));
/// controller.load("demo");
/// controller.run(&mut dispatcher)?;
/// ```
#[derive(Clone)]
pub struct LifecycleController {
    inner: Arc<ControllerInner>,
}

impl LifecycleController {
    /// Creates a controller with default worker pacing.
    pub fn new(config: WindowConfig, control: Arc<dyn HostControl>) -> Self {
        Self::with_pacing(config, control, PollPacing::default())
    }

    /// Creates a controller with explicit worker pacing.
    pub fn with_pacing(
        config: WindowConfig,
        control: Arc<dyn HostControl>,
        pacing: PollPacing,
    ) -> Self {
        let phase = Arc::new(PhaseCell::new());
        let gate = Arc::new(InputGate::new(Arc::clone(&phase)));
        let worker = WorkerLoop::with_pacing(Arc::clone(&phase), pacing);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                control,
                phase,
                hub: NotificationHub::new(),
                worker,
                task: Mutex::new(None),
                gate,
                app_binding: Mutex::new(None),
                window_binding: Mutex::new(None),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    /// Attaches the controller to the host's application-level event
    /// source.
    ///
    /// Fails with [`LifecycleError::AlreadyInitialized`] on a second call,
    /// without registering anything twice. Call
    /// [`uninitialize`](LifecycleController::uninitialize) first to attach
    /// to a different source.
    pub fn initialize(&self, source: Arc<dyn LifecycleEventSource>) -> LifecycleResult<()> {
        if self
            .inner
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LifecycleError::AlreadyInitialized);
        }

        let relay = Arc::new(ControllerSink {
            inner: Arc::downgrade(&self.inner),
        });
        let token = source.register(relay);
        *self.inner.app_binding.lock() = Some(AppBinding { source, token });
        log::info!("lifecycle controller initialized");
        Ok(())
    }

    /// Detaches from the host: drops the application-level registration
    /// and any window binding, after which
    /// [`initialize`](LifecycleController::initialize) may be called again.
    pub fn uninitialize(&self) {
        if let Some(binding) = self.inner.app_binding.lock().take() {
            binding.source.unregister(binding.token);
        }
        if let Some(binding) = self.inner.window_binding.lock().take() {
            binding.window.unregister(binding.relay_token);
            binding.window.unregister(binding.input_token);
        }
        self.inner.initialized.store(false, Ordering::Release);
        log::info!("lifecycle controller uninitialized");
    }

    /// Binds a window: applies the [`WindowConfig`] and registers the
    /// controller's relay plus the input gate on it.
    ///
    /// Rebinding is allowed at any time; the previous window's
    /// registrations are released first, so events from it no longer reach
    /// the controller.
    pub fn set_window(&self, window: Arc<dyn HostWindow>) {
        let mut slot = self.inner.window_binding.lock();
        if let Some(previous) = slot.take() {
            previous.window.unregister(previous.relay_token);
            previous.window.unregister(previous.input_token);
            log::debug!("previous window binding released");
        }

        let config = &self.inner.config;
        window.set_title(&config.title);
        window.set_min_size(config.min_size.0, config.min_size.1);
        window.request_size(config.launch_size.0, config.launch_size.1);

        let relay_token = window.register(Arc::new(ControllerSink {
            inner: Arc::downgrade(&self.inner),
        }));
        let input_token = window.register(self.inner.gate.clone());

        log::info!(
            "window bound, requested {}x{} (min {}x{})",
            config.launch_size.0,
            config.launch_size.1,
            config.min_size.0,
            config.min_size.1
        );
        *slot = Some(WindowBinding {
            window,
            relay_token,
            input_token,
        });
    }

    /// Returns the currently bound window, if any.
    pub fn window(&self) -> Option<Arc<dyn HostWindow>> {
        self.inner
            .window_binding
            .lock()
            .as_ref()
            .map(|binding| Arc::clone(&binding.window))
    }

    /// Updates the bound window's title. No-op without a window.
    pub fn set_title(&self, title: &str) {
        if let Some(binding) = self.inner.window_binding.lock().as_ref() {
            binding.window.set_title(title);
        }
    }

    /// Stores the task the worker loop will tick. Takes effect at the next
    /// [`run`](LifecycleController::run); without one the worker idles on
    /// a [`NoopTask`].
    pub fn set_worker_task(&self, task: impl WorkerTask + 'static) {
        *self.inner.task.lock() = Some(Box::new(task));
    }

    /// Announces that the application should prepare its content.
    ///
    /// Publishes [`Notification::Loaded`] synchronously. `entry_point` is
    /// informational and only logged.
    pub fn load(&self, entry_point: &str) {
        log::info!("loading application content (entry point {entry_point:?})");
        self.inner.hub.publish(Notification::Loaded);
    }

    /// Runs the application until the host terminates it.
    ///
    /// Drains already-queued host events once, starts the worker loop,
    /// then blocks dispatching host events. When the dispatcher returns,
    /// the worker is wound down and joined before this call returns, so
    /// the application is fully quiesced afterwards.
    ///
    /// The worker's termination hook asks the host to exit, which is what
    /// ends [`Dispatcher::run_until_quit`] in the usual cancel-key and
    /// suspend sequences.
    ///
    /// Fails with [`LifecycleError::WorkerActive`] if a worker from an
    /// earlier `run` is somehow still alive.
    pub fn run(&self, dispatcher: &mut dyn Dispatcher) -> LifecycleResult<()> {
        log::info!("entering run sequence");
        dispatcher.drain_pending();

        let task = self
            .inner
            .task
            .lock()
            .take()
            .unwrap_or_else(|| Box::new(NoopTask));
        let hook_target = Arc::downgrade(&self.inner);
        self.inner.worker.start(task, move || {
            if let Some(inner) = hook_target.upgrade() {
                log::debug!("worker loop finished, requesting host termination");
                inner.request_exit();
            }
        })?;

        dispatcher.run_until_quit();

        self.inner.worker.exit();
        self.inner.worker.join();
        log::info!("run sequence complete");
        Ok(())
    }

    /// Requests application exit: moves the phase to `Exiting` and asks
    /// the host to terminate. Idempotent.
    pub fn exit(&self) {
        log::debug!("exit requested");
        self.inner.request_exit();
    }

    /// The shared phase cell.
    ///
    /// Embedders that want background work to begin call
    /// [`request_run`](PhaseCell::request_run) on it, typically from a
    /// `Loaded` subscriber; nothing in the controller starts the `Running`
    /// phase on its own.
    pub fn phase_cell(&self) -> &Arc<PhaseCell> {
        &self.inner.phase
    }

    /// The notification hub applications subscribe to.
    pub fn notifications(&self) -> &NotificationHub {
        &self.inner.hub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EventRouter;
    use crate::host::dummy::{DummyControl, DummySuspend, DummyWindow};
    use crate::input::Key;
    use crate::phase::Phase;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn controller_with_control() -> (LifecycleController, Arc<DummyControl>) {
        let control = Arc::new(DummyControl::new());
        let controller = LifecycleController::new(WindowConfig::default(), control.clone());
        (controller, control)
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let (controller, _control) = controller_with_control();
        let router = Arc::new(EventRouter::new());

        controller.initialize(router.clone()).unwrap();
        assert_eq!(router.sink_count(), 1);

        let second = controller.initialize(router.clone());
        assert!(matches!(second, Err(LifecycleError::AlreadyInitialized)));
        // The failed call must not have added another registration.
        assert_eq!(router.sink_count(), 1);
    }

    #[test]
    fn uninitialize_releases_registrations_and_rearms() {
        let (controller, _control) = controller_with_control();
        let router = Arc::new(EventRouter::new());
        let window = Arc::new(DummyWindow::new(1600, 900));

        controller.initialize(router.clone()).unwrap();
        controller.set_window(window.clone());
        assert_eq!(router.sink_count(), 1);
        assert_eq!(window.sink_count(), 2);

        controller.uninitialize();
        assert_eq!(router.sink_count(), 0);
        assert_eq!(window.sink_count(), 0);

        controller.initialize(router.clone()).unwrap();
        assert_eq!(router.sink_count(), 1);
    }

    #[test]
    fn set_window_applies_config() {
        let control = Arc::new(DummyControl::new());
        let config = WindowConfig::new("Configured")
            .with_launch_size(800, 600)
            .with_min_size(120, 110);
        let controller = LifecycleController::new(config, control);
        let window = Arc::new(DummyWindow::new(1, 1));

        controller.set_window(window.clone());

        assert_eq!(window.title(), "Configured");
        assert_eq!(window.min_size(), Some((120, 110)));
        assert_eq!(window.requested_sizes(), vec![(800, 600)]);
        // Relay plus input gate.
        assert_eq!(window.sink_count(), 2);
        assert!(controller.window().is_some());
    }

    #[test]
    fn rebinding_releases_previous_window() {
        let (controller, _control) = controller_with_control();
        let first = Arc::new(DummyWindow::new(1600, 900));
        let second = Arc::new(DummyWindow::new(1600, 900));

        controller.set_window(first.clone());
        controller.set_window(second.clone());

        assert_eq!(first.sink_count(), 0);
        assert_eq!(second.sink_count(), 2);

        // Events from the released window no longer reach the hub.
        let resizes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&resizes);
        controller.notifications().subscribe(move |n| {
            if matches!(n, Notification::WindowResized { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        first.resize(640, 480);
        assert_eq!(resizes.load(Ordering::SeqCst), 0);
        second.resize(640, 480);
        assert_eq!(resizes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn load_publishes_loaded() {
        let (controller, _control) = controller_with_control();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        controller.notifications().subscribe(move |n| {
            if matches!(n, Notification::Loaded) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        controller.load("demo");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resize_event_publishes_new_bounds() {
        let (controller, _control) = controller_with_control();
        let window = Arc::new(DummyWindow::new(1600, 900));
        controller.set_window(window.clone());

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        controller.notifications().subscribe(move |n| {
            if let Notification::WindowResized { width, height } = *n {
                *sink.lock() = Some((width, height));
            }
        });

        window.resize(1024, 768);
        assert_eq!(*seen.lock(), Some((1024, 768)));
    }

    #[test]
    fn activation_focuses_bound_window() {
        let (controller, _control) = controller_with_control();
        let router = Arc::new(EventRouter::new());
        let window = Arc::new(DummyWindow::new(1600, 900));
        controller.initialize(router.clone()).unwrap();
        controller.set_window(window.clone());

        router.emit_activated();
        assert_eq!(window.activation_count(), 1);
    }

    #[test]
    fn cancel_key_moves_phase_without_touching_host() {
        let (controller, control) = controller_with_control();
        let window = Arc::new(DummyWindow::new(1600, 900));
        controller.set_window(window.clone());

        window.press_key(Key::Escape);

        // The gate only moves the phase; host termination is the worker
        // loop's job once it observes the phase.
        assert_eq!(controller.phase_cell().phase(), Phase::Exiting);
        assert_eq!(control.exit_requests(), 0);
    }

    #[test]
    fn resuming_publishes_resumed() {
        let (controller, _control) = controller_with_control();
        let router = Arc::new(EventRouter::new());
        controller.initialize(router.clone()).unwrap();

        let resumes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&resumes);
        controller.notifications().subscribe(move |n| {
            if matches!(n, Notification::Resumed) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        router.emit_resuming();
        assert_eq!(resumes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn suspend_publishes_then_completes_then_exits() {
        let (controller, control) = controller_with_control();
        let router = Arc::new(EventRouter::new());
        controller.initialize(router.clone()).unwrap();

        let suspend = Arc::new(DummySuspend::new());
        let completions_at_publish = Arc::new(Mutex::new(None));
        let probe = Arc::clone(&suspend);
        let slot = Arc::clone(&completions_at_publish);
        controller.notifications().subscribe(move |n| {
            if matches!(n, Notification::Suspending) {
                *slot.lock() = Some(probe.completions());
            }
        });

        router.emit_suspending(suspend.as_ref());

        assert!(suspend.wait_completed(Duration::from_secs(2)));
        assert!(control.wait_quit(Duration::from_secs(2)));
        assert_eq!(suspend.acquisitions(), 1);
        assert_eq!(suspend.completions(), 1);
        // Subscribers ran before the deferral completed.
        assert_eq!(*completions_at_publish.lock(), Some(0));
        assert_eq!(controller.phase_cell().phase(), Phase::Exiting);
    }

    #[test]
    fn suspend_subscriber_panic_still_completes_deferral_and_exits() {
        let (controller, control) = controller_with_control();
        let router = Arc::new(EventRouter::new());
        controller.initialize(router.clone()).unwrap();

        controller.notifications().subscribe(|n| {
            if matches!(n, Notification::Suspending) {
                panic!("subscriber failure");
            }
        });

        let suspend = Arc::new(DummySuspend::new());
        router.emit_suspending(suspend.as_ref());

        assert!(suspend.wait_completed(Duration::from_secs(2)));
        assert_eq!(suspend.completions(), 1);
        // The host believes the suspend finished, so the application must
        // go down with it rather than linger.
        assert!(control.wait_quit(Duration::from_secs(2)));
        assert_eq!(control.exit_requests(), 1);
        assert_eq!(controller.phase_cell().phase(), Phase::Exiting);
    }

    #[test]
    fn host_teardown_relay_stops_worker_phase() {
        let (controller, _control) = controller_with_control();
        let router = Arc::new(EventRouter::new());
        controller.initialize(router.clone()).unwrap();

        router.emit_exiting();
        assert_eq!(controller.phase_cell().phase(), Phase::Exiting);
    }

    #[test]
    fn set_title_reaches_bound_window() {
        let (controller, _control) = controller_with_control();
        let window = Arc::new(DummyWindow::new(1600, 900));
        controller.set_window(window.clone());

        controller.set_title("Renamed");
        assert_eq!(window.title(), "Renamed");
    }
}
