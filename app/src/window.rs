//! Host window implementation over a winit window.

use std::sync::Arc;

use winit::dpi::LogicalSize;
use winit::window::Window;

use stagehand_core::Key;
use stagehand_core::host::{
    HostWindow, LifecycleEventSink, LifecycleEventSource, RegistrationToken, SinkRegistry,
};

/// Winit-backed [`HostWindow`].
///
/// The shell adapter feeds window events in through the `emit_*` methods;
/// the embedded [`SinkRegistry`] fans them out to whatever the controller
/// registered (its relay and the input gate).
pub struct ShellWindow {
    window: Window,
    registry: SinkRegistry,
}

impl ShellWindow {
    pub(crate) fn new(window: Window) -> Self {
        Self {
            window,
            registry: SinkRegistry::new(),
        }
    }

    /// The underlying winit window.
    pub fn winit_window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn emit_resized(&self, width: u32, height: u32) {
        self.registry
            .for_each(|sink| sink.on_window_size_changed(width, height));
    }

    pub(crate) fn emit_visibility(&self, visible: bool) {
        self.registry
            .for_each(|sink| sink.on_visibility_changed(visible));
    }

    pub(crate) fn emit_closed(&self) {
        self.registry.for_each(|sink| sink.on_window_closed());
    }

    pub(crate) fn emit_dpi_changed(&self, scale_factor: f64) {
        self.registry
            .for_each(|sink| sink.on_dpi_changed(scale_factor));
    }

    pub(crate) fn emit_display_contents_invalidated(&self) {
        self.registry
            .for_each(|sink| sink.on_display_contents_invalidated());
    }

    pub(crate) fn emit_key(&self, key: Key, pressed: bool) {
        self.registry.for_each(|sink| sink.on_key(key, pressed));
    }
}

impl LifecycleEventSource for ShellWindow {
    fn register(&self, sink: Arc<dyn LifecycleEventSink>) -> RegistrationToken {
        self.registry.register(sink)
    }

    fn unregister(&self, token: RegistrationToken) -> bool {
        self.registry.unregister(token)
    }
}

impl HostWindow for ShellWindow {
    fn bounds(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    fn set_min_size(&self, width: u32, height: u32) {
        self.window
            .set_min_inner_size(Some(LogicalSize::new(width, height)));
    }

    fn request_size(&self, width: u32, height: u32) {
        // A `Some` return means the platform resized synchronously and may
        // skip the Resized event. The return value does not matter here:
        // window binding publishes nothing, and sinks query `bounds` for
        // the current size.
        let _ = self.window.request_inner_size(LogicalSize::new(width, height));
    }

    fn activate(&self) {
        self.window.focus_window();
    }
}
