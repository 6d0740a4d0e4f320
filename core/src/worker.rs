use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{LifecycleError, LifecycleResult};
use crate::phase::{Phase, PhaseCell};

/// A unit of background application work, ticked repeatedly by the
/// [`WorkerLoop`] while the phase is `Running`.
///
/// Each tick should be short. The loop checks the phase between ticks, so a
/// tick that blocks for long delays shutdown by the same amount.
pub trait WorkerTask: Send {
    /// Performs one iteration of work.
    fn tick(&mut self);
}

/// Closures can be used directly as worker tasks.
impl<F: FnMut() + Send> WorkerTask for F {
    fn tick(&mut self) {
        self()
    }
}

impl WorkerTask for Box<dyn WorkerTask> {
    fn tick(&mut self) {
        (**self).tick()
    }
}

/// Task that does nothing per tick.
///
/// Stands in when an application has no background work and only uses the
/// worker loop for its shutdown signalling.
pub struct NoopTask;

impl WorkerTask for NoopTask {
    fn tick(&mut self) {}
}

/// How the worker loop paces its polling when there is nothing else to do.
///
/// `Yield` is the default: it keeps phase-change observation latency at one
/// scheduler quantum without burning a core the way `Spin` does. `Sleep`
/// trades observation latency for idle cost; the loop reacts to a phase
/// change within one sleep interval plus one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPacing {
    /// Re-check the phase immediately.
    Spin,
    /// Yield the thread between iterations.
    Yield,
    /// Sleep for the given interval between iterations.
    Sleep(Duration),
}

impl Default for PollPacing {
    fn default() -> Self {
        PollPacing::Yield
    }
}

/// Runs the termination hook when dropped, so the hook fires exactly once
/// whether the loop returns normally or unwinds out of a panicking tick.
struct TerminateOnDrop<F: FnOnce()> {
    hook: Option<F>,
}

impl<F: FnOnce()> Drop for TerminateOnDrop<F> {
    fn drop(&mut self) {
        if let Some(hook) = self.hook.take() {
            hook();
        }
    }
}

/// Background poll loop that ticks a [`WorkerTask`] while the application
/// phase is `Running`.
///
/// The loop runs on its own named thread. Every iteration it loads the
/// shared [`PhaseCell`]: in `Idle` it idles (no tick), in `Running` it ticks
/// the task, and on `Exiting` it leaves the loop and invokes the
/// termination hook passed to [`start`](WorkerLoop::start). The hook fires
/// exactly once per started loop, including when the exit request lands
/// before the loop ever ticks.
///
/// # Example
///
/// ```ignore
/// let phase = Arc::new(PhaseCell::new());
/// let worker = WorkerLoop::new(Arc::clone(&phase));
/// worker.start(NoopTask, || println!("worker done"))?;
/// phase.request_run();
/// // ... later ...
/// worker.exit();
/// worker.join();
/// ```
pub struct WorkerLoop {
    phase: Arc<PhaseCell>,
    pacing: PollPacing,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerLoop {
    /// Creates a worker loop with the default [`PollPacing::Yield`] pacing.
    pub fn new(phase: Arc<PhaseCell>) -> Self {
        Self::with_pacing(phase, PollPacing::default())
    }

    /// Creates a worker loop with explicit pacing.
    pub fn with_pacing(phase: Arc<PhaseCell>, pacing: PollPacing) -> Self {
        Self {
            phase,
            pacing,
            thread: Mutex::new(None),
        }
    }

    /// Returns the phase cell this loop polls.
    pub fn phase(&self) -> &Arc<PhaseCell> {
        &self.phase
    }

    /// Returns whether a started worker thread is still alive.
    pub fn is_active(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawns the worker thread.
    ///
    /// `on_terminate` is invoked on the worker thread exactly once when the
    /// loop exits, typically to ask the host for process termination.
    ///
    /// Fails with [`LifecycleError::WorkerActive`] if a previously started
    /// thread is still alive. Once that thread has finished, `start` may be
    /// called again.
    pub fn start<T, F>(&self, task: T, on_terminate: F) -> LifecycleResult<()>
    where
        T: WorkerTask + 'static,
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self.thread.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(LifecycleError::WorkerActive);
        }

        let phase = Arc::clone(&self.phase);
        let pacing = self.pacing;
        let handle = std::thread::Builder::new()
            .name("stagehand-worker".into())
            .spawn(move || run_loop(phase, pacing, task, on_terminate))
            .map_err(|e| LifecycleError::WorkerSpawn(e.to_string()))?;

        *slot = Some(handle);
        Ok(())
    }

    /// Requests loop termination by moving the phase to `Exiting`.
    ///
    /// Idempotent, and also affects every other observer of the shared
    /// phase cell.
    pub fn exit(&self) {
        self.phase.request_exit();
    }

    /// Waits for the worker thread to finish, if one was started.
    ///
    /// Call [`exit`](WorkerLoop::exit) first, otherwise this blocks until
    /// something else moves the phase to `Exiting`.
    pub fn join(&self) {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            log::warn!("worker thread panicked");
        }
    }
}

fn run_loop<T, F>(phase: Arc<PhaseCell>, pacing: PollPacing, mut task: T, on_terminate: F)
where
    T: WorkerTask,
    F: FnOnce(),
{
    log::debug!("worker loop started");
    let _guard = TerminateOnDrop {
        hook: Some(on_terminate),
    };

    while !phase.is_exiting() {
        if phase.phase() == Phase::Running {
            task.tick();
        }
        match pacing {
            PollPacing::Spin => {}
            PollPacing::Yield => std::thread::yield_now(),
            PollPacing::Sleep(interval) => std::thread::sleep(interval),
        }
    }

    log::debug!("worker loop exiting");
}
