//! [`KeyCode`] to macOS `CGKeyCode` translation.
//!
//! Reference: `HIToolbox/Events.h` (`kVK_ANSI_*` constants).  CGKeyCodes are
//! physical positions on an ANSI keyboard and do not follow any alphabetical
//! order, hence the explicit table.

use super::key::{KeyCode, Modifier};

/// Translates a key to its macOS virtual keycode.
pub fn key_to_cgkeycode(key: KeyCode) -> u16 {
    match key {
        KeyCode::A => 0x00,
        KeyCode::S => 0x01,
        KeyCode::D => 0x02,
        KeyCode::F => 0x03,
        KeyCode::H => 0x04,
        KeyCode::G => 0x05,
        KeyCode::Z => 0x06,
        KeyCode::X => 0x07,
        KeyCode::C => 0x08,
        KeyCode::V => 0x09,
        KeyCode::B => 0x0B,
        KeyCode::Q => 0x0C,
        KeyCode::W => 0x0D,
        KeyCode::E => 0x0E,
        KeyCode::R => 0x0F,
        KeyCode::Y => 0x10,
        KeyCode::T => 0x11,
        KeyCode::O => 0x1F,
        KeyCode::U => 0x20,
        KeyCode::I => 0x22,
        KeyCode::P => 0x23,
        KeyCode::L => 0x25,
        KeyCode::J => 0x26,
        KeyCode::K => 0x28,
        KeyCode::N => 0x2D,
        KeyCode::M => 0x2E,
        KeyCode::Digit1 => 0x12,
        KeyCode::Digit2 => 0x13,
        KeyCode::Digit3 => 0x14,
        KeyCode::Digit4 => 0x15,
        KeyCode::Digit6 => 0x16,
        KeyCode::Digit5 => 0x17,
        KeyCode::Digit9 => 0x19,
        KeyCode::Digit7 => 0x1A,
        KeyCode::Digit8 => 0x1C,
        KeyCode::Digit0 => 0x1D,
        KeyCode::Equal => 0x18,
        KeyCode::Minus => 0x1B,
        KeyCode::BracketRight => 0x1E,
        KeyCode::BracketLeft => 0x21,
        KeyCode::Quote => 0x27,
        KeyCode::Semicolon => 0x29,
        KeyCode::Backslash => 0x2A,
        KeyCode::Comma => 0x2B,
        KeyCode::Slash => 0x2C,
        KeyCode::Period => 0x2F,
        KeyCode::Backquote => 0x32,
        KeyCode::Enter => 0x24,
        KeyCode::Tab => 0x30,
        KeyCode::Space => 0x31,
        KeyCode::Backspace => 0x33,
        KeyCode::Escape => 0x35,
        KeyCode::F5 => 0x60,
        KeyCode::F6 => 0x61,
        KeyCode::F7 => 0x62,
        KeyCode::F3 => 0x63,
        KeyCode::F8 => 0x64,
        KeyCode::F9 => 0x65,
        KeyCode::F11 => 0x67,
        KeyCode::F10 => 0x6D,
        KeyCode::F12 => 0x6F,
        KeyCode::F4 => 0x76,
        KeyCode::F2 => 0x78,
        KeyCode::F1 => 0x7A,
        // kVK_Help sits where PC keyboards put Insert
        KeyCode::Insert => 0x72,
        KeyCode::Home => 0x73,
        KeyCode::PageUp => 0x74,
        KeyCode::Delete => 0x75, // kVK_ForwardDelete
        KeyCode::End => 0x77,
        KeyCode::PageDown => 0x79,
        KeyCode::ArrowLeft => 0x7B,
        KeyCode::ArrowRight => 0x7C,
        KeyCode::ArrowDown => 0x7D,
        KeyCode::ArrowUp => 0x7E,
    }
}

/// Translates a modifier to the keycode of its left-hand key.
///
/// [`Modifier::Meta`] is the Command key.
pub fn modifier_to_cgkeycode(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Ctrl => 0x3B,
        Modifier::Shift => 0x38,
        Modifier::Alt => 0x3A,
        Modifier::Meta => 0x37,
    }
}
