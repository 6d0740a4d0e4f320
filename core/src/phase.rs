use std::sync::atomic::{AtomicU8, Ordering};

/// Coarse execution phase of the application.
///
/// The phase moves in one direction only: `Idle` to `Running` to `Exiting`
/// (skipping `Running` is allowed). `Exiting` is terminal. There is no way
/// back out of it, which is what lets the worker loop and the host teardown
/// path trust a single load of the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Started but not yet ticking application work.
    Idle = 0,
    /// Application work is being ticked by the worker loop.
    Running = 1,
    /// Shutdown has been requested. Terminal.
    Exiting = 2,
}

fn phase_from_raw(raw: u8) -> Phase {
    match raw {
        0 => Phase::Idle,
        1 => Phase::Running,
        _ => Phase::Exiting,
    }
}

/// Shared, lock-free cell holding the current [`Phase`].
///
/// The cell is the single authority on the application phase. It is shared
/// between the dispatch thread, the worker loop and any input or host
/// callback that wants to request shutdown. Writers publish with `Release`,
/// readers observe with `Acquire`, so work performed before a transition is
/// visible to whoever observes the new phase.
///
/// Exit requests always win: [`request_exit`](PhaseCell::request_exit)
/// stores `Exiting` unconditionally, and [`request_run`](PhaseCell::request_run)
/// only succeeds from `Idle`, so no interleaving can leave `Exiting`.
///
/// # Example
///
/// ```ignore
/// let phase = Arc::new(PhaseCell::new());
/// assert!(phase.request_run());
/// phase.request_exit();
/// assert!(phase.is_exiting());
/// ```
#[derive(Debug)]
pub struct PhaseCell {
    state: AtomicU8,
}

impl PhaseCell {
    /// Creates a cell in the `Idle` phase.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(Phase::Idle as u8),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        phase_from_raw(self.state.load(Ordering::Acquire))
    }

    /// Attempts the `Idle` to `Running` transition.
    ///
    /// Returns `true` if this call performed the transition. Returns `false`
    /// if the cell was already `Running` or `Exiting`; in particular a
    /// concurrent exit request cannot be overwritten.
    pub fn request_run(&self) -> bool {
        self.state
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves the cell to `Exiting`.
    ///
    /// Valid from any phase and idempotent. Deliberately returns nothing:
    /// callers cannot tell whether they won a race with another exit
    /// request, and should not care.
    pub fn request_exit(&self) {
        self.state.store(Phase::Exiting as u8, Ordering::Release);
    }

    /// Returns whether the cell has reached `Exiting`.
    pub fn is_exiting(&self) -> bool {
        self.phase() == Phase::Exiting
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_idle() {
        let cell = PhaseCell::new();
        assert_eq!(cell.phase(), Phase::Idle);
        assert!(!cell.is_exiting());
    }

    #[test]
    fn request_run_transitions_once() {
        let cell = PhaseCell::new();
        assert!(cell.request_run());
        assert_eq!(cell.phase(), Phase::Running);
        // Second attempt is a no-op that reports failure.
        assert!(!cell.request_run());
        assert_eq!(cell.phase(), Phase::Running);
    }

    #[test]
    fn request_exit_is_terminal() {
        let cell = PhaseCell::new();
        cell.request_exit();
        assert_eq!(cell.phase(), Phase::Exiting);

        assert!(!cell.request_run());
        assert_eq!(cell.phase(), Phase::Exiting);

        cell.request_exit();
        assert_eq!(cell.phase(), Phase::Exiting);
    }

    #[test]
    fn exit_skips_running() {
        let cell = PhaseCell::new();
        cell.request_exit();
        assert!(cell.is_exiting());
    }

    #[test]
    fn concurrent_exit_requests_settle_on_exiting() {
        let cell = Arc::new(PhaseCell::new());
        cell.request_run();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.request_exit())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cell.phase(), Phase::Exiting);
    }

    #[test]
    fn run_request_never_overwrites_exit() {
        // Race request_run against request_exit many times; whatever the
        // interleaving, an observed Exiting must stay Exiting.
        for _ in 0..64 {
            let cell = Arc::new(PhaseCell::new());
            let runner = {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    cell.request_run();
                })
            };
            let exiter = {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    cell.request_exit();
                })
            };
            runner.join().unwrap();
            exiter.join().unwrap();
            assert_eq!(cell.phase(), Phase::Exiting);
        }
    }
}
