//! # Stagehand App
//!
//! Desktop shell for Stagehand applications built on winit.
//!
//! This crate binds the host-independent lifecycle from `stagehand-core`
//! to a real windowing system: it owns the event loop, creates the
//! window, and translates winit events into lifecycle events.
//!
//! ## Overview
//!
//! - [`Shell`] - Owns the event loop and the lifecycle controller
//! - [`ShellArgs`] - Command line arguments for window and worker setup
//! - [`ShellWindow`] - The winit window behind the `HostWindow` trait
//!
//! ## Example
//!
//! ```ignore
//! use stagehand_app::{Shell, ShellArgs};
//!
//! fn main() -> stagehand_app::ShellResult<()> {
//!     let shell = Shell::new(ShellArgs::parse())?;
//!     shell.run(|| {
//!         // One tick of background work.
//!     })
//! }
//! ```

mod args;
mod input;
mod pump;
mod shell;
mod window;

pub use args::{CliPacing, ShellArgs};
pub use input::map_winit_key;
pub use pump::{ProxyControl, ShellRequest};
pub use shell::{Shell, ShellError, ShellResult};
pub use window::ShellWindow;

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the app library version at startup.
pub fn init() {
    log::info!("Stagehand App v{} initialized", VERSION);
}
