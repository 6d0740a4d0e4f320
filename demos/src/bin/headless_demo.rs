//! # Headless Demo
//!
//! Runs the full lifecycle against the in-memory host, with no window
//! system involved. A script thread plays the host's part: it resizes the
//! window and then suspends the application, which drives the run
//! sequence to completion without any user input or display server.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use stagehand_core::host::EventRouter;
use stagehand_core::host::dummy::{DummyControl, DummyDispatcher, DummySuspend, DummyWindow};
use stagehand_core::{
    LifecycleController, LifecycleResult, Notification, PollPacing, WindowConfig,
};

fn main() -> LifecycleResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Stagehand Headless Demo");
    log::info!("Demos version: {}", stagehand_demos::VERSION);
    stagehand_core::init();

    let control = Arc::new(DummyControl::new());
    let config = WindowConfig::new("Stagehand Headless").with_launch_size(1280, 720);
    let controller = LifecycleController::with_pacing(
        config,
        control.clone(),
        PollPacing::Sleep(Duration::from_millis(5)),
    );

    let router = Arc::new(EventRouter::new());
    controller.initialize(router.clone())?;

    let window = Arc::new(DummyWindow::new(1280, 720));
    controller.set_window(window.clone());

    let phase = Arc::clone(controller.phase_cell());
    controller.notifications().subscribe(move |n| {
        log::info!("notification: {n:?}");
        if matches!(n, Notification::Loaded) {
            phase.request_run();
        }
    });

    router.emit_activated();
    controller.load("headless");

    // Script thread playing the host's part.
    let suspend = Arc::new(DummySuspend::new());
    let script = {
        let window = window.clone();
        let router = router.clone();
        let suspend = suspend.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(250));
            window.resize(1024, 768);
            thread::sleep(Duration::from_millis(250));
            router.emit_suspending(suspend.as_ref());
        })
    };

    let ticks = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&ticks);
    controller.set_worker_task(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let mut dispatcher = DummyDispatcher::new(control.clone());
    controller.run(&mut dispatcher)?;

    let _ = script.join();
    log::info!(
        "lifecycle complete after {} worker ticks, {} suspend completion(s)",
        ticks.load(Ordering::Relaxed),
        suspend.completions()
    );
    Ok(())
}
