//! # Stagehand Core
//!
//! Host-independent application lifecycle: the phase state machine, the
//! background worker loop, lifecycle notifications and the controller
//! that ties them to a host behind the [`host`] trait seam.

pub mod config;
pub mod controller;
pub mod deferral;
pub mod error;
pub mod host;
pub mod input;
pub mod notify;
pub mod phase;
pub mod worker;

pub use config::WindowConfig;
pub use controller::LifecycleController;
pub use deferral::{DeferralGuard, DeferralToken, SUSPEND_GRACE_PERIOD};
pub use error::{LifecycleError, LifecycleResult};
pub use input::{InputGate, Key};
pub use notify::{Notification, NotificationHub, SubscriptionId};
pub use phase::{Phase, PhaseCell};
pub use worker::{NoopTask, PollPacing, WorkerLoop, WorkerTask};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the core library version at startup.
pub fn init() {
    log::info!("Stagehand Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
