//! Input conversion utilities.
//!
//! Maps platform-specific (winit) key events to host-agnostic
//! [`stagehand_core::Key`] values.

use stagehand_core::Key;
use winit::keyboard;
use winit::keyboard::NamedKey;

/// Convert a winit logical [`keyboard::Key`] to a lifecycle [`Key`], if a
/// mapping exists.
///
/// Single printable characters map to [`Key::Character`] (lowercased);
/// unmapped named keys, dead keys and unidentified keys return `None`.
pub fn map_winit_key(key: &keyboard::Key) -> Option<Key> {
    Some(match key {
        keyboard::Key::Named(named) => match named {
            // Arrows
            NamedKey::ArrowUp => Key::ArrowUp,
            NamedKey::ArrowDown => Key::ArrowDown,
            NamedKey::ArrowLeft => Key::ArrowLeft,
            NamedKey::ArrowRight => Key::ArrowRight,

            // Common
            NamedKey::Space => Key::Space,
            NamedKey::Enter => Key::Enter,
            NamedKey::Escape => Key::Escape,
            NamedKey::Tab => Key::Tab,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Delete => Key::Delete,
            NamedKey::Insert => Key::Insert,
            NamedKey::Home => Key::Home,
            NamedKey::End => Key::End,
            NamedKey::PageUp => Key::PageUp,
            NamedKey::PageDown => Key::PageDown,

            // Function keys
            NamedKey::F1 => Key::F1,
            NamedKey::F2 => Key::F2,
            NamedKey::F3 => Key::F3,
            NamedKey::F4 => Key::F4,
            NamedKey::F5 => Key::F5,
            NamedKey::F6 => Key::F6,
            NamedKey::F7 => Key::F7,
            NamedKey::F8 => Key::F8,
            NamedKey::F9 => Key::F9,
            NamedKey::F10 => Key::F10,
            NamedKey::F11 => Key::F11,
            NamedKey::F12 => Key::F12,

            _ => return None,
        },

        keyboard::Key::Character(text) => {
            let mut chars = text.chars();
            let first = chars.next()?;
            // Multi-character sequences (IME output) have no single-key
            // equivalent.
            if chars.next().is_some() {
                return None;
            }
            Key::Character(first.to_ascii_lowercase())
        }

        _ => return None,
    })
}
