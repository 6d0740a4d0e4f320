//! Event loop plumbing.
//!
//! Adapts the winit event loop to the core [`Dispatcher`] contract and
//! provides the proxy-based [`HostControl`] used to stop the loop from
//! other threads.

use std::time::Duration;

use parking_lot::Mutex;
use winit::event_loop::{EventLoop, EventLoopProxy};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;

use stagehand_core::host::{Dispatcher, HostControl};

use crate::shell::ShellAdapter;

/// Requests delivered to the event loop as winit user events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellRequest {
    /// Stop the event loop.
    Exit,
}

/// [`HostControl`] backed by a winit [`EventLoopProxy`].
///
/// Sends [`ShellRequest::Exit`] through the proxy, which wakes the loop
/// from any thread. The worker loop's termination hook and the suspend
/// path both go through here.
pub struct ProxyControl {
    proxy: Mutex<EventLoopProxy<ShellRequest>>,
}

impl ProxyControl {
    pub fn new(proxy: EventLoopProxy<ShellRequest>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }
}

impl HostControl for ProxyControl {
    fn request_exit(&self) {
        if self.proxy.lock().send_event(ShellRequest::Exit).is_err() {
            // The loop is already gone; nothing left to stop.
            log::debug!("exit requested after event loop shutdown");
        }
    }
}

/// Winit-backed [`Dispatcher`].
///
/// `drain_pending` pumps the loop with a zero timeout so already-queued
/// events are delivered without waiting for new ones; `run_until_quit`
/// parks in the OS loop until the adapter stops it.
pub struct EventPump<'a> {
    pub(crate) event_loop: &'a mut EventLoop<ShellRequest>,
    pub(crate) adapter: &'a mut ShellAdapter,
}

impl Dispatcher for EventPump<'_> {
    fn drain_pending(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), self.adapter);
        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited during startup drain (code {code})");
        }
    }

    fn run_until_quit(&mut self) {
        if let Err(e) = self.event_loop.run_app_on_demand(self.adapter) {
            log::error!("event loop error: {e}");
        }
    }
}
