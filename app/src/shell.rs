//! Shell: event loop ownership and the winit-to-lifecycle adapter.

use std::sync::Arc;

use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use stagehand_core::host::{EventRouter, SuspendingOperation};
use stagehand_core::{
    DeferralGuard, DeferralToken, LifecycleController, LifecycleError, WorkerTask,
};

use crate::args::ShellArgs;
use crate::input::map_winit_key;
use crate::pump::{EventPump, ProxyControl, ShellRequest};
use crate::window::ShellWindow;

/// Errors from building or running the shell.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The winit event loop could not be created or failed while running.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// A lifecycle operation failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Suspend operation for the winit shell.
///
/// Desktop platforms don't gate suspension on us, so the deferral token
/// only acknowledges completion in the log. The suspend sequence itself
/// (publish, complete, exit) still runs in full.
struct ShellSuspend;

struct AckToken;

impl DeferralToken for AckToken {
    fn complete(self: Box<Self>) {
        log::debug!("suspend deferral acknowledged");
    }
}

impl SuspendingOperation for ShellSuspend {
    fn acquire_deferral(&self) -> DeferralGuard {
        DeferralGuard::new(Box::new(AckToken))
    }
}

/// Translates winit callbacks into host events for the controller.
///
/// The first `resumed` creates the window, binds it, activates and loads;
/// later ones are resumes from suspension. Window events are fanned out
/// through the [`ShellWindow`]'s sink registry, application events through
/// the [`EventRouter`].
pub(crate) struct ShellAdapter {
    controller: LifecycleController,
    router: Arc<EventRouter>,
    window: Option<Arc<ShellWindow>>,
    title: String,
    launch_size: (u32, u32),
    entry_point: String,
}

impl ApplicationHandler<ShellRequest> for ShellAdapter {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            self.router.emit_resuming();
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.launch_size.0,
                self.launch_size.1,
            ));

        match event_loop.create_window(attributes) {
            Ok(window) => {
                log::info!("window created");
                let shell_window = Arc::new(ShellWindow::new(window));
                self.controller.set_window(shell_window.clone());
                self.window = Some(shell_window);

                self.router.emit_activated();
                self.controller.load(&self.entry_point);
            }
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                window.emit_closed();
                self.controller.exit();
            }

            WindowEvent::Resized(size) => {
                window.emit_resized(size.width, size.height);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                window.emit_dpi_changed(scale_factor);
            }

            WindowEvent::Occluded(occluded) => {
                window.emit_visibility(!occluded);
            }

            WindowEvent::RedrawRequested => {
                window.emit_display_contents_invalidated();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = map_winit_key(&event.logical_key) {
                    window.emit_key(key, event.state == ElementState::Pressed);
                }
            }

            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, request: ShellRequest) {
        match request {
            ShellRequest::Exit => {
                log::debug!("exit request received, stopping event loop");
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("host suspended the application");
        self.router.emit_suspending(&ShellSuspend);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.router.emit_exiting();
    }
}

/// Owns the winit event loop and the lifecycle controller bound to it.
///
/// # Example
///
/// ```ignore
/// use stagehand_app::{Shell, ShellArgs};
///
/// fn main() -> stagehand_app::ShellResult<()> {
///     let shell = Shell::new(ShellArgs::parse())?;
///     shell
///         .controller()
///         .notifications()
///         .subscribe(|n| log::info!("lifecycle: {n:?}"));
///     shell.run(|| {
///         // One tick of background work.
///     })
/// }
/// ```
pub struct Shell {
    event_loop: EventLoop<ShellRequest>,
    adapter: ShellAdapter,
    controller: LifecycleController,
}

impl Shell {
    /// Builds the event loop, controller and adapter from parsed
    /// arguments.
    pub fn new(args: ShellArgs) -> ShellResult<Self> {
        // Initialize logging; tolerate an embedder that already did.
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .try_init();

        stagehand_core::init();
        crate::init();

        let event_loop = EventLoop::<ShellRequest>::with_user_event().build()?;
        let control = Arc::new(ProxyControl::new(event_loop.create_proxy()));
        let controller =
            LifecycleController::with_pacing(args.window_config(), control, args.pacing());

        let router = Arc::new(EventRouter::new());
        controller.initialize(router.clone())?;

        let entry_point = std::env::args().next().unwrap_or_default();
        let adapter = ShellAdapter {
            controller: controller.clone(),
            router,
            window: None,
            title: args.title().to_string(),
            launch_size: (args.width(), args.height()),
            entry_point,
        };

        Ok(Self {
            event_loop,
            adapter,
            controller,
        })
    }

    /// The lifecycle controller.
    ///
    /// Subscribe to notifications and tweak worker state here before
    /// calling [`run`](Shell::run).
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Runs the application until the host terminates it.
    ///
    /// Blocks on the calling thread (which must be the main thread on
    /// platforms that require it) and returns once the event loop has
    /// stopped and the worker is joined.
    pub fn run(mut self, task: impl WorkerTask + 'static) -> ShellResult<()> {
        self.controller.set_worker_task(task);
        let mut pump = EventPump {
            event_loop: &mut self.event_loop,
            adapter: &mut self.adapter,
        };
        self.controller.run(&mut pump)?;
        Ok(())
    }
}
