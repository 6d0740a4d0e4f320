//! # Stagehand Demos
//!
//! Demo applications showcasing the Stagehand lifecycle host.
//!
//! ## Available Demos
//!
//! - `lifecycle_demo` - Windowed application driven through the winit shell
//! - `headless_demo` - The same lifecycle against the in-memory host

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
