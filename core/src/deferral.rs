use std::time::Duration;

/// Grace period a host grants for suspend work after a deferral is taken.
///
/// Work that runs past this deadline risks the host tearing the process
/// down mid-flight, so suspend subscribers should stay well under it.
pub const SUSPEND_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Host-side handle behind a suspend deferral.
///
/// Implementations tell the host that deferred suspend work has finished.
/// The trait consumes the box so a token cannot be completed twice.
pub trait DeferralToken: Send {
    /// Signals completion to the host.
    fn complete(self: Box<Self>);
}

/// Owns a pending suspend deferral and guarantees it completes exactly once.
///
/// The happy path calls [`complete`](DeferralGuard::complete). If the guard
/// is dropped while still pending, for example because suspend work
/// panicked or an early return skipped it, the drop completes the token so
/// the host is never left waiting out its full grace period.
///
/// # Example
///
/// ```ignore
/// fn on_suspending(op: &dyn SuspendingOperation) {
///     let guard = op.acquire_deferral();
///     flush_state();
///     guard.complete();
/// }
/// ```
pub struct DeferralGuard {
    token: Option<Box<dyn DeferralToken>>,
}

impl DeferralGuard {
    /// Wraps a host token in a guard.
    pub fn new(token: Box<dyn DeferralToken>) -> Self {
        Self { token: Some(token) }
    }

    /// Returns whether the deferral has not completed yet.
    pub fn is_pending(&self) -> bool {
        self.token.is_some()
    }

    /// Completes the deferral.
    ///
    /// Consumes the guard; the token cannot fire again through the `Drop`
    /// path afterwards.
    pub fn complete(mut self) {
        if let Some(token) = self.token.take() {
            token.complete();
        }
    }
}

impl Drop for DeferralGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            log::warn!("suspend deferral dropped while pending, completing it");
            token.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingToken {
        completions: Arc<AtomicUsize>,
    }

    impl DeferralToken for CountingToken {
        fn complete(self: Box<Self>) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_guard() -> (DeferralGuard, Arc<AtomicUsize>) {
        let completions = Arc::new(AtomicUsize::new(0));
        let guard = DeferralGuard::new(Box::new(CountingToken {
            completions: Arc::clone(&completions),
        }));
        (guard, completions)
    }

    #[test]
    fn complete_fires_token_once() {
        let (guard, completions) = counting_guard();
        assert!(guard.is_pending());
        guard.complete();
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_completes_pending_deferral() {
        let (guard, completions) = counting_guard();
        drop(guard);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_after_complete_does_not_fire_again() {
        let (guard, completions) = counting_guard();
        guard.complete();
        // `complete` consumed the guard; its drop already ran.
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panic_unwinds_through_guard_and_completes() {
        let (guard, completions) = counting_guard();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = guard;
            panic!("suspend work failed");
        }));

        assert!(result.is_err());
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }
}
