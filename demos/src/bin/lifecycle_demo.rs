//! # Lifecycle Demo
//!
//! Windowed application driven through the winit shell.
//!
//! The demo subscribes to lifecycle notifications, starts background work
//! once content is loaded, and reports worker progress every few seconds.
//! Press Escape or close the window to quit; pass `--max-ticks` to exit
//! automatically after that many worker ticks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use stagehand_app::{Shell, ShellArgs, ShellResult};
use stagehand_core::Notification;

fn main() -> ShellResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Stagehand Lifecycle Demo");
    log::info!("Demos version: {}", stagehand_demos::VERSION);

    let args = ShellArgs::parse();
    let max_ticks = args.max_ticks();

    let shell = Shell::new(args)?;
    let controller = shell.controller().clone();

    // Background work begins once content is loaded.
    let phase = Arc::clone(controller.phase_cell());
    controller.notifications().subscribe(move |n| {
        log::info!("notification: {n:?}");
        if matches!(n, Notification::Loaded) && phase.request_run() {
            log::info!("content loaded, worker running");
        }
    });

    let mut ticks: u64 = 0;
    let mut last_report = Instant::now();
    shell.run(move || {
        ticks += 1;
        if last_report.elapsed() >= Duration::from_secs(5) {
            log::info!("worker ticked {ticks} times so far");
            last_report = Instant::now();
        }
        if let Some(limit) = max_ticks
            && ticks >= limit
        {
            log::info!("tick limit {limit} reached, exiting");
            controller.exit();
        }
    })
}
