//! Platform-neutral key vocabulary.
//!
//! Each [`KeyCode`] variant carries its USB HID Usage ID (page 0x07) as the
//! discriminant, so the per-OS tables in the sibling modules translate from a
//! single well-known numbering.  Only the keys an art application shortcut can
//! reasonably use are represented: letters, digits, the US-layout punctuation
//! row, function keys and the navigation block.
//!
//! # Names
//!
//! Shortcut tables and the wire protocol spell keys as short lowercase names
//! (`"z"`, `"f5"`, `"pageup"`, `"["`).  [`KeyCode::from_name`] accepts those
//! plus the common aliases (`"return"`, `"esc"`, `"del"`, `"pgdn"` …).
//! [`KeyCode::portable_name`] produces the spelling Qt uses in
//! `QKeySequence::PortableText`, which is what Krita writes in its shortcut file.

use serde::{Deserialize, Serialize};

/// A physical key, identified by its HID Usage ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum KeyCode {
    // Letters (HID 0x04–0x1D)
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Digit row (HID 0x1E–0x27); HID orders 1..9 then 0
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Punctuation (US layout positions)
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation block
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,
}

const LETTERS: [KeyCode; 26] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Digit0,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

const FUNCTION_KEYS: [KeyCode; 12] = [
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
    KeyCode::F6,
    KeyCode::F7,
    KeyCode::F8,
    KeyCode::F9,
    KeyCode::F10,
    KeyCode::F11,
    KeyCode::F12,
];

impl KeyCode {
    /// The letter keys `A` through `Z`, in alphabetical order.
    pub fn letters() -> &'static [KeyCode] {
        &LETTERS
    }

    /// The digit keys `0` through `9`, in numeric order.
    pub fn digits() -> &'static [KeyCode] {
        &DIGITS
    }

    /// Returns the function key `F{n}` for `n` in `1..=12`.
    pub fn function(n: u8) -> Option<KeyCode> {
        match n {
            1..=12 => Some(FUNCTION_KEYS[usize::from(n - 1)]),
            _ => None,
        }
    }

    /// Returns the HID Usage ID of this key.
    pub fn hid_usage(self) -> u16 {
        self as u16
    }

    /// Parses a key name (case-insensitive).
    ///
    /// Returns `None` for names that are not in the vocabulary.  Shifted
    /// symbols such as `"+"` are not keys; see [`KeyCode::from_shifted_symbol`].
    pub fn from_name(name: &str) -> Option<KeyCode> {
        let lower = name.trim().to_ascii_lowercase();
        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::from_char(c);
        }

        if let Some(rest) = lower.strip_prefix('f') {
            if let Ok(n) = rest.parse::<u8>() {
                return Self::function(n);
            }
        }

        let key = match lower.as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Escape,
            "backspace" => KeyCode::Backspace,
            "tab" => KeyCode::Tab,
            "space" | "spacebar" => KeyCode::Space,
            "minus" => KeyCode::Minus,
            "equal" | "equals" => KeyCode::Equal,
            "bracketleft" => KeyCode::BracketLeft,
            "bracketright" => KeyCode::BracketRight,
            "backslash" => KeyCode::Backslash,
            "semicolon" => KeyCode::Semicolon,
            "quote" | "apostrophe" => KeyCode::Quote,
            "backquote" | "grave" => KeyCode::Backquote,
            "comma" => KeyCode::Comma,
            "period" => KeyCode::Period,
            "slash" => KeyCode::Slash,
            "insert" | "ins" => KeyCode::Insert,
            "home" => KeyCode::Home,
            "pageup" | "pgup" => KeyCode::PageUp,
            "delete" | "del" => KeyCode::Delete,
            "end" => KeyCode::End,
            "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
            "right" | "arrowright" => KeyCode::ArrowRight,
            "left" | "arrowleft" => KeyCode::ArrowLeft,
            "down" | "arrowdown" => KeyCode::ArrowDown,
            "up" | "arrowup" => KeyCode::ArrowUp,
            _ => return None,
        };
        Some(key)
    }

    /// Maps an unshifted character on a US layout to its key.
    pub fn from_char(c: char) -> Option<KeyCode> {
        let c = c.to_ascii_lowercase();
        match c {
            'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
            '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
            '-' => Some(KeyCode::Minus),
            '=' => Some(KeyCode::Equal),
            '[' => Some(KeyCode::BracketLeft),
            ']' => Some(KeyCode::BracketRight),
            '\\' => Some(KeyCode::Backslash),
            ';' => Some(KeyCode::Semicolon),
            '\'' => Some(KeyCode::Quote),
            '`' => Some(KeyCode::Backquote),
            ',' => Some(KeyCode::Comma),
            '.' => Some(KeyCode::Period),
            '/' => Some(KeyCode::Slash),
            ' ' => Some(KeyCode::Space),
            _ => None,
        }
    }

    /// Maps a character that needs Shift on a US layout to its base key.
    ///
    /// `'+'` is `Shift+=`, `'^'` is `Shift+6`, `'?'` is `Shift+/` and so on.
    pub fn from_shifted_symbol(c: char) -> Option<KeyCode> {
        let key = match c {
            '!' => KeyCode::Digit1,
            '@' => KeyCode::Digit2,
            '#' => KeyCode::Digit3,
            '$' => KeyCode::Digit4,
            '%' => KeyCode::Digit5,
            '^' => KeyCode::Digit6,
            '&' => KeyCode::Digit7,
            '*' => KeyCode::Digit8,
            '(' => KeyCode::Digit9,
            ')' => KeyCode::Digit0,
            '_' => KeyCode::Minus,
            '+' => KeyCode::Equal,
            '{' => KeyCode::BracketLeft,
            '}' => KeyCode::BracketRight,
            '|' => KeyCode::Backslash,
            ':' => KeyCode::Semicolon,
            '"' => KeyCode::Quote,
            '~' => KeyCode::Backquote,
            '<' => KeyCode::Comma,
            '>' => KeyCode::Period,
            '?' => KeyCode::Slash,
            _ => return None,
        };
        Some(key)
    }

    /// Returns the Qt portable-text spelling of this key (`"A"`, `"F5"`, `"PgUp"`, `"["`).
    pub fn portable_name(self) -> &'static str {
        match self {
            KeyCode::A => "A",
            KeyCode::B => "B",
            KeyCode::C => "C",
            KeyCode::D => "D",
            KeyCode::E => "E",
            KeyCode::F => "F",
            KeyCode::G => "G",
            KeyCode::H => "H",
            KeyCode::I => "I",
            KeyCode::J => "J",
            KeyCode::K => "K",
            KeyCode::L => "L",
            KeyCode::M => "M",
            KeyCode::N => "N",
            KeyCode::O => "O",
            KeyCode::P => "P",
            KeyCode::Q => "Q",
            KeyCode::R => "R",
            KeyCode::S => "S",
            KeyCode::T => "T",
            KeyCode::U => "U",
            KeyCode::V => "V",
            KeyCode::W => "W",
            KeyCode::X => "X",
            KeyCode::Y => "Y",
            KeyCode::Z => "Z",
            KeyCode::Digit0 => "0",
            KeyCode::Digit1 => "1",
            KeyCode::Digit2 => "2",
            KeyCode::Digit3 => "3",
            KeyCode::Digit4 => "4",
            KeyCode::Digit5 => "5",
            KeyCode::Digit6 => "6",
            KeyCode::Digit7 => "7",
            KeyCode::Digit8 => "8",
            KeyCode::Digit9 => "9",
            KeyCode::Enter => "Return",
            KeyCode::Escape => "Esc",
            KeyCode::Backspace => "Backspace",
            KeyCode::Tab => "Tab",
            KeyCode::Space => "Space",
            KeyCode::Minus => "-",
            KeyCode::Equal => "=",
            KeyCode::BracketLeft => "[",
            KeyCode::BracketRight => "]",
            KeyCode::Backslash => "\\",
            KeyCode::Semicolon => ";",
            KeyCode::Quote => "'",
            KeyCode::Backquote => "`",
            KeyCode::Comma => ",",
            KeyCode::Period => ".",
            KeyCode::Slash => "/",
            KeyCode::F1 => "F1",
            KeyCode::F2 => "F2",
            KeyCode::F3 => "F3",
            KeyCode::F4 => "F4",
            KeyCode::F5 => "F5",
            KeyCode::F6 => "F6",
            KeyCode::F7 => "F7",
            KeyCode::F8 => "F8",
            KeyCode::F9 => "F9",
            KeyCode::F10 => "F10",
            KeyCode::F11 => "F11",
            KeyCode::F12 => "F12",
            KeyCode::Insert => "Ins",
            KeyCode::Home => "Home",
            KeyCode::PageUp => "PgUp",
            KeyCode::Delete => "Del",
            KeyCode::End => "End",
            KeyCode::PageDown => "PgDown",
            KeyCode::ArrowRight => "Right",
            KeyCode::ArrowLeft => "Left",
            KeyCode::ArrowDown => "Down",
            KeyCode::ArrowUp => "Up",
        }
    }

    /// Returns the lowercase name accepted by [`KeyCode::from_name`].
    pub fn name(self) -> String {
        match self {
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Escape => "esc".to_string(),
            KeyCode::PageUp => "pageup".to_string(),
            KeyCode::PageDown => "pagedown".to_string(),
            KeyCode::Insert => "insert".to_string(),
            KeyCode::Delete => "delete".to_string(),
            _ => self.portable_name().to_ascii_lowercase(),
        }
    }
}

/// A modifier key.  Declaration order is the press order used for injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Modifier {
    Ctrl = 0xE0,
    Shift = 0xE1,
    Alt = 0xE2,
    /// Windows key / Command key / Super.
    Meta = 0xE3,
}
