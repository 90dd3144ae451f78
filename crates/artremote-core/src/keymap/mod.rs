//! Key vocabulary, key combinations, and per-OS translation tables.
//!
//! Everything above the platform injector talks in [`KeyCode`] / [`KeyCombo`].
//! The injector asks [`KeyMapper`] for the native code at the last moment.

pub mod combo;
pub mod key;
pub mod linux_x11;
pub mod macos_cg;
pub mod windows_vk;

pub use combo::{KeyCombo, KeyComboError, Modifiers};
pub use key::{KeyCode, Modifier};

/// Unified key mapper over the per-OS tables.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a key to a Windows Virtual-Key code.
    pub fn key_to_windows_vk(key: KeyCode) -> u16 {
        windows_vk::key_to_vk(key)
    }

    /// Translates a modifier to a Windows Virtual-Key code.
    pub fn modifier_to_windows_vk(modifier: Modifier) -> u16 {
        windows_vk::modifier_to_vk(modifier)
    }

    /// Translates a key to an X11 KeySym.
    pub fn key_to_x11_keysym(key: KeyCode) -> u32 {
        linux_x11::key_to_keysym(key)
    }

    /// Translates a modifier to an X11 KeySym.
    pub fn modifier_to_x11_keysym(modifier: Modifier) -> u32 {
        linux_x11::modifier_to_keysym(modifier)
    }

    /// Translates a key to a macOS `CGKeyCode`.
    pub fn key_to_macos_cgkeycode(key: KeyCode) -> u16 {
        macos_cg::key_to_cgkeycode(key)
    }

    /// Translates a modifier to a macOS `CGKeyCode`.
    pub fn modifier_to_macos_cgkeycode(modifier: Modifier) -> u16 {
        macos_cg::modifier_to_cgkeycode(modifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn every_key() -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = KeyCode::letters().to_vec();
        keys.extend_from_slice(KeyCode::digits());
        keys.extend((1..=12).filter_map(KeyCode::function));
        keys.extend([
            KeyCode::Enter,
            KeyCode::Escape,
            KeyCode::Backspace,
            KeyCode::Tab,
            KeyCode::Space,
            KeyCode::Minus,
            KeyCode::Equal,
            KeyCode::BracketLeft,
            KeyCode::BracketRight,
            KeyCode::Backslash,
            KeyCode::Semicolon,
            KeyCode::Quote,
            KeyCode::Backquote,
            KeyCode::Comma,
            KeyCode::Period,
            KeyCode::Slash,
            KeyCode::Insert,
            KeyCode::Home,
            KeyCode::PageUp,
            KeyCode::Delete,
            KeyCode::End,
            KeyCode::PageDown,
            KeyCode::ArrowRight,
            KeyCode::ArrowLeft,
            KeyCode::ArrowDown,
            KeyCode::ArrowUp,
        ]);
        keys
    }

    #[test]
    fn test_windows_table_is_injective() {
        let keys = every_key();
        let codes: HashSet<u16> = keys.iter().map(|&k| KeyMapper::key_to_windows_vk(k)).collect();
        assert_eq!(codes.len(), keys.len());
    }

    #[test]
    fn test_x11_table_is_injective() {
        let keys = every_key();
        let codes: HashSet<u32> = keys.iter().map(|&k| KeyMapper::key_to_x11_keysym(k)).collect();
        assert_eq!(codes.len(), keys.len());
    }

    #[test]
    fn test_macos_table_is_injective() {
        let keys = every_key();
        let codes: HashSet<u16> = keys
            .iter()
            .map(|&k| KeyMapper::key_to_macos_cgkeycode(k))
            .collect();
        assert_eq!(codes.len(), keys.len());
    }

    #[test]
    fn test_modifiers_never_collide_with_keys() {
        let keys = every_key();
        for m in [Modifier::Ctrl, Modifier::Shift, Modifier::Alt, Modifier::Meta] {
            let vk = KeyMapper::modifier_to_windows_vk(m);
            assert!(keys.iter().all(|&k| KeyMapper::key_to_windows_vk(k) != vk));
            let sym = KeyMapper::modifier_to_x11_keysym(m);
            assert!(keys.iter().all(|&k| KeyMapper::key_to_x11_keysym(k) != sym));
            let cg = KeyMapper::modifier_to_macos_cgkeycode(m);
            assert!(keys.iter().all(|&k| KeyMapper::key_to_macos_cgkeycode(k) != cg));
        }
    }
}
