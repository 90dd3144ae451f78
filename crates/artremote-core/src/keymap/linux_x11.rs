//! [`KeyCode`] to X11 KeySym translation.
//!
//! Reference: X11 `keysymdef.h`.  The injector turns a KeySym into a server
//! keycode with `XKeysymToKeycode`, so these values are layout-independent.

use super::key::{KeyCode, Modifier};

/// Translates a key to its X11 KeySym.
pub fn key_to_keysym(key: KeyCode) -> u32 {
    match key {
        KeyCode::A => 0x61,
        KeyCode::B => 0x62,
        KeyCode::C => 0x63,
        KeyCode::D => 0x64,
        KeyCode::E => 0x65,
        KeyCode::F => 0x66,
        KeyCode::G => 0x67,
        KeyCode::H => 0x68,
        KeyCode::I => 0x69,
        KeyCode::J => 0x6A,
        KeyCode::K => 0x6B,
        KeyCode::L => 0x6C,
        KeyCode::M => 0x6D,
        KeyCode::N => 0x6E,
        KeyCode::O => 0x6F,
        KeyCode::P => 0x70,
        KeyCode::Q => 0x71,
        KeyCode::R => 0x72,
        KeyCode::S => 0x73,
        KeyCode::T => 0x74,
        KeyCode::U => 0x75,
        KeyCode::V => 0x76,
        KeyCode::W => 0x77,
        KeyCode::X => 0x78,
        KeyCode::Y => 0x79,
        KeyCode::Z => 0x7A,
        KeyCode::Digit0 => 0x30,
        KeyCode::Digit1 => 0x31,
        KeyCode::Digit2 => 0x32,
        KeyCode::Digit3 => 0x33,
        KeyCode::Digit4 => 0x34,
        KeyCode::Digit5 => 0x35,
        KeyCode::Digit6 => 0x36,
        KeyCode::Digit7 => 0x37,
        KeyCode::Digit8 => 0x38,
        KeyCode::Digit9 => 0x39,
        KeyCode::Enter => 0xFF0D,
        KeyCode::Escape => 0xFF1B,
        KeyCode::Backspace => 0xFF08,
        KeyCode::Tab => 0xFF09,
        KeyCode::Space => 0x20,
        KeyCode::Minus => 0x2D,
        KeyCode::Equal => 0x3D,
        KeyCode::BracketLeft => 0x5B,
        KeyCode::BracketRight => 0x5D,
        KeyCode::Backslash => 0x5C,
        KeyCode::Semicolon => 0x3B,
        KeyCode::Quote => 0x27,
        KeyCode::Backquote => 0x60,
        KeyCode::Comma => 0x2C,
        KeyCode::Period => 0x2E,
        KeyCode::Slash => 0x2F,
        KeyCode::F1 => 0xFFBE,
        KeyCode::F2 => 0xFFBF,
        KeyCode::F3 => 0xFFC0,
        KeyCode::F4 => 0xFFC1,
        KeyCode::F5 => 0xFFC2,
        KeyCode::F6 => 0xFFC3,
        KeyCode::F7 => 0xFFC4,
        KeyCode::F8 => 0xFFC5,
        KeyCode::F9 => 0xFFC6,
        KeyCode::F10 => 0xFFC7,
        KeyCode::F11 => 0xFFC8,
        KeyCode::F12 => 0xFFC9,
        KeyCode::Home => 0xFF50,
        KeyCode::ArrowLeft => 0xFF51,
        KeyCode::ArrowUp => 0xFF52,
        KeyCode::ArrowRight => 0xFF53,
        KeyCode::ArrowDown => 0xFF54,
        KeyCode::PageUp => 0xFF55,
        KeyCode::PageDown => 0xFF56,
        KeyCode::End => 0xFF57,
        KeyCode::Insert => 0xFF63,
        KeyCode::Delete => 0xFFFF,
    }
}

/// Translates a modifier to the KeySym of its left-hand key.
pub fn modifier_to_keysym(modifier: Modifier) -> u32 {
    match modifier {
        Modifier::Ctrl => 0xFFE3,  // Control_L
        Modifier::Shift => 0xFFE1, // Shift_L
        Modifier::Alt => 0xFFE9,   // Alt_L
        Modifier::Meta => 0xFFEB,  // Super_L
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_map_to_lowercase_latin1_keysyms() {
        assert_eq!(key_to_keysym(KeyCode::A), 0x61);
        assert_eq!(key_to_keysym(KeyCode::Z), 0x7A);
    }

    #[test]
    fn test_function_keys_are_contiguous() {
        assert_eq!(key_to_keysym(KeyCode::F1), 0xFFBE);
        assert_eq!(key_to_keysym(KeyCode::F12), 0xFFC9);
    }

    #[test]
    fn test_modifiers_map_to_left_hand_keysyms() {
        assert_eq!(modifier_to_keysym(Modifier::Ctrl), 0xFFE3);
        assert_eq!(modifier_to_keysym(Modifier::Meta), 0xFFEB);
    }
}
