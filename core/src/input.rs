//! Platform-agnostic input types.
//!
//! Provides a [`Key`] enum that identifies keyboard input without depending
//! on any windowing crate, and the [`InputGate`] that turns a cancel key
//! into an application exit request.

use std::sync::Arc;

use crate::host::LifecycleEventSink;
use crate::phase::PhaseCell;

/// Logical keyboard key.
///
/// Platform layers (e.g. winit) map their native key events to this enum.
/// Printable keys arrive as [`Key::Character`]; everything else uses the
/// named variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Key {
    // Arrows
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Common keys
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    /// A printable character, lowercased where the platform reports case.
    Character(char),
}

/// Keyboard sink that requests application exit when the cancel key goes
/// down.
///
/// Register the gate on a window event source; when its cancel key
/// (Escape unless overridden) is pressed, it moves the shared phase to
/// `Exiting`. The worker loop observes that and drives the rest of the
/// shutdown sequence, so the gate itself never touches the host.
///
/// Key releases and other keys are ignored. Repeated presses are harmless
/// because the exit request is idempotent.
pub struct InputGate {
    phase: Arc<PhaseCell>,
    cancel_key: Key,
}

impl InputGate {
    /// Creates a gate with Escape as the cancel key.
    pub fn new(phase: Arc<PhaseCell>) -> Self {
        Self::with_cancel_key(phase, Key::Escape)
    }

    /// Creates a gate with an explicit cancel key.
    pub fn with_cancel_key(phase: Arc<PhaseCell>, cancel_key: Key) -> Self {
        Self { phase, cancel_key }
    }

    /// The key that triggers an exit request.
    pub fn cancel_key(&self) -> Key {
        self.cancel_key
    }
}

impl LifecycleEventSink for InputGate {
    fn on_key(&self, key: Key, pressed: bool) {
        if pressed && key == self.cancel_key {
            log::debug!("cancel key {key:?} pressed, requesting exit");
            self.phase.request_exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    #[test]
    fn cancel_key_press_requests_exit() {
        let phase = Arc::new(PhaseCell::new());
        let gate = InputGate::new(Arc::clone(&phase));

        gate.on_key(Key::Escape, true);
        assert_eq!(phase.phase(), Phase::Exiting);
    }

    #[test]
    fn other_keys_are_ignored() {
        let phase = Arc::new(PhaseCell::new());
        let gate = InputGate::new(Arc::clone(&phase));

        gate.on_key(Key::Enter, true);
        gate.on_key(Key::Character('q'), true);
        assert_eq!(phase.phase(), Phase::Idle);
    }

    #[test]
    fn release_does_not_trigger() {
        let phase = Arc::new(PhaseCell::new());
        let gate = InputGate::new(Arc::clone(&phase));

        gate.on_key(Key::Escape, false);
        assert_eq!(phase.phase(), Phase::Idle);
    }

    #[test]
    fn custom_cancel_key() {
        let phase = Arc::new(PhaseCell::new());
        let gate = InputGate::with_cancel_key(Arc::clone(&phase), Key::Character('q'));
        assert_eq!(gate.cancel_key(), Key::Character('q'));

        gate.on_key(Key::Escape, true);
        assert_eq!(phase.phase(), Phase::Idle);

        gate.on_key(Key::Character('q'), true);
        assert_eq!(phase.phase(), Phase::Exiting);
    }

    #[test]
    fn repeated_presses_are_idempotent() {
        let phase = Arc::new(PhaseCell::new());
        phase.request_run();
        let gate = InputGate::new(Arc::clone(&phase));

        gate.on_key(Key::Escape, true);
        gate.on_key(Key::Escape, true);
        assert_eq!(phase.phase(), Phase::Exiting);
    }
}
