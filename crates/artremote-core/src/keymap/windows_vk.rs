//! [`KeyCode`] to Windows Virtual-Key code translation.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).  Letters and digits use
//! their ASCII upper-case values; punctuation uses the `VK_OEM_*` codes of a
//! US layout.

use super::key::{KeyCode, Modifier};

/// Translates a key to its Windows Virtual-Key code.
pub fn key_to_vk(key: KeyCode) -> u16 {
    match key {
        KeyCode::A => 0x41,
        KeyCode::B => 0x42,
        KeyCode::C => 0x43,
        KeyCode::D => 0x44,
        KeyCode::E => 0x45,
        KeyCode::F => 0x46,
        KeyCode::G => 0x47,
        KeyCode::H => 0x48,
        KeyCode::I => 0x49,
        KeyCode::J => 0x4A,
        KeyCode::K => 0x4B,
        KeyCode::L => 0x4C,
        KeyCode::M => 0x4D,
        KeyCode::N => 0x4E,
        KeyCode::O => 0x4F,
        KeyCode::P => 0x50,
        KeyCode::Q => 0x51,
        KeyCode::R => 0x52,
        KeyCode::S => 0x53,
        KeyCode::T => 0x54,
        KeyCode::U => 0x55,
        KeyCode::V => 0x56,
        KeyCode::W => 0x57,
        KeyCode::X => 0x58,
        KeyCode::Y => 0x59,
        KeyCode::Z => 0x5A,
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
        KeyCode::Enter => 0x0D,
        KeyCode::Escape => 0x1B,
        KeyCode::Backspace => 0x08,
        KeyCode::Tab => 0x09,
        KeyCode::Space => 0x20,
        KeyCode::Minus => 0xBD,        // VK_OEM_MINUS
        KeyCode::Equal => 0xBB,        // VK_OEM_PLUS
        KeyCode::BracketLeft => 0xDB,  // VK_OEM_4
        KeyCode::BracketRight => 0xDD, // VK_OEM_6
        KeyCode::Backslash => 0xDC,    // VK_OEM_5
        KeyCode::Semicolon => 0xBA,    // VK_OEM_1
        KeyCode::Quote => 0xDE,        // VK_OEM_7
        KeyCode::Backquote => 0xC0,    // VK_OEM_3
        KeyCode::Comma => 0xBC,        // VK_OEM_COMMA
        KeyCode::Period => 0xBE,       // VK_OEM_PERIOD
        KeyCode::Slash => 0xBF,        // VK_OEM_2
        KeyCode::F1 => 0x70,
        KeyCode::F2 => 0x71,
        KeyCode::F3 => 0x72,
        KeyCode::F4 => 0x73,
        KeyCode::F5 => 0x74,
        KeyCode::F6 => 0x75,
        KeyCode::F7 => 0x76,
        KeyCode::F8 => 0x77,
        KeyCode::F9 => 0x78,
        KeyCode::F10 => 0x79,
        KeyCode::F11 => 0x7A,
        KeyCode::F12 => 0x7B,
        KeyCode::PageUp => 0x21,
        KeyCode::PageDown => 0x22,
        KeyCode::End => 0x23,
        KeyCode::Home => 0x24,
        KeyCode::ArrowLeft => 0x25,
        KeyCode::ArrowUp => 0x26,
        KeyCode::ArrowRight => 0x27,
        KeyCode::ArrowDown => 0x28,
        KeyCode::Insert => 0x2D,
        KeyCode::Delete => 0x2E,
    }
}

/// Translates a modifier to the Virtual-Key code of its left-hand key.
pub fn modifier_to_vk(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Ctrl => 0xA2,  // VK_LCONTROL
        Modifier::Shift => 0xA0, // VK_LSHIFT
        Modifier::Alt => 0xA4,   // VK_LMENU
        Modifier::Meta => 0x5B,  // VK_LWIN
    }
}

/// Returns `true` for keys that need `KEYEVENTF_EXTENDEDKEY` in `SendInput`.
///
/// Navigation keys and the Windows keys live on the extended scan-code page;
/// without the flag Windows treats them as their numpad equivalents.
pub fn is_extended_vk(vk: u16) -> bool {
    matches!(vk, 0x21..=0x28 | 0x2D | 0x2E | 0x5B | 0x5C | 0xA3 | 0xA5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_digits_use_ascii_values() {
        assert_eq!(key_to_vk(KeyCode::A), 0x41);
        assert_eq!(key_to_vk(KeyCode::Z), 0x5A);
        assert_eq!(key_to_vk(KeyCode::Digit0), 0x30);
        assert_eq!(key_to_vk(KeyCode::Digit6), 0x36);
    }

    #[test]
    fn test_punctuation_uses_oem_codes() {
        assert_eq!(key_to_vk(KeyCode::Equal), 0xBB);
        assert_eq!(key_to_vk(KeyCode::BracketLeft), 0xDB);
        assert_eq!(key_to_vk(KeyCode::BracketRight), 0xDD);
    }

    #[test]
    fn test_navigation_keys_are_extended() {
        assert!(is_extended_vk(key_to_vk(KeyCode::Delete)));
        assert!(is_extended_vk(key_to_vk(KeyCode::PageUp)));
        assert!(is_extended_vk(modifier_to_vk(Modifier::Meta)));
        assert!(!is_extended_vk(key_to_vk(KeyCode::A)));
        assert!(!is_extended_vk(modifier_to_vk(Modifier::Ctrl)));
    }
}
