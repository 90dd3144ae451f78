//! Key combinations: a set of modifiers plus one key.
//!
//! Combos are written by humans (`"ctrl+shift+z"`, `"primary+="`, `"F5"`),
//! read from Clip Studio Paint's shortcut store, generated for Krita presets
//! and finally injected by the platform layer.  This module owns the one
//! parser and the two renderings:
//!
//! - [`std::fmt::Display`]: lowercase, platform-neutral (`ctrl+shift+z`), used in
//!   logs and on the wire.
//! - [`KeyCombo::to_portable_string`]: Qt `PortableText` (`Ctrl+Shift+Z`), used
//!   in `kritashortcutsrc`.
//!
//! # The `primary` modifier
//!
//! Shortcut tables are shared between operating systems.  The token
//! `primary` resolves to Ctrl on Windows/Linux and to Command ([`Modifier::Meta`])
//! on macOS when the combo is parsed.
//!
//! # Shifted symbols
//!
//! A key token that is a shifted US-layout symbol adds Shift and uses the
//! base key: `"^"` is `shift+6`, `"ctrl++"` is `ctrl+shift+=`.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::key::{KeyCode, Modifier};
use crate::domain::platform::Platform;

/// Errors produced while parsing a key combination.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyComboError {
    #[error("empty key combination")]
    Empty,
    #[error("key combination \"{0}\" has modifiers but no key")]
    MissingKey(String),
    #[error("unknown modifier \"{0}\"")]
    UnknownModifier(String),
    #[error("unknown key \"{0}\"")]
    UnknownKey(String),
}

/// The modifier half of a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// The platform's primary shortcut modifier (Ctrl, or Command on macOS).
    pub fn primary(platform: Platform) -> Modifiers {
        Modifiers::NONE.with(platform.primary_modifier())
    }

    /// Returns a copy with `modifier` added.
    pub fn with(mut self, modifier: Modifier) -> Modifiers {
        match modifier {
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Alt => self.alt = true,
            Modifier::Shift => self.shift = true,
            Modifier::Meta => self.meta = true,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Modifiers::NONE
    }

    /// Held modifiers in press order (Ctrl, Shift, Alt, Meta).
    pub fn pressed(&self) -> Vec<Modifier> {
        let mut out = Vec::with_capacity(4);
        if self.ctrl {
            out.push(Modifier::Ctrl);
        }
        if self.shift {
            out.push(Modifier::Shift);
        }
        if self.alt {
            out.push(Modifier::Alt);
        }
        if self.meta {
            out.push(Modifier::Meta);
        }
        out
    }
}

/// A set of modifiers plus one non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl KeyCombo {
    pub fn new(modifiers: Modifiers, key: KeyCode) -> Self {
        Self { modifiers, key }
    }

    /// A bare key with no modifiers.
    pub fn key(key: KeyCode) -> Self {
        Self::new(Modifiers::NONE, key)
    }

    /// Parses a human-written combo such as `"primary+shift+z"` or `"^"`.
    ///
    /// Tokens are separated by `+` and are case-insensitive.  The last token is
    /// the key; a trailing `++` means the key is `+` itself.
    pub fn parse(text: &str, platform: Platform) -> Result<KeyCombo, KeyComboError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KeyComboError::Empty);
        }

        let (modifier_part, key_token) = if text == "+" {
            ("", "+")
        } else if let Some(prefix) = text.strip_suffix("++") {
            (prefix, "+")
        } else {
            match text.rfind('+') {
                Some(idx) => (&text[..idx], &text[idx + 1..]),
                None => ("", text),
            }
        };

        let key_token = key_token.trim();
        if key_token.is_empty() {
            return Err(KeyComboError::MissingKey(text.to_string()));
        }

        let mut modifiers = Modifiers::NONE;
        for token in modifier_part.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            modifiers = modifiers.with(parse_modifier(token, platform)?);
        }

        let key = resolve_key_token(key_token, &mut modifiers)?;
        Ok(KeyCombo { modifiers, key })
    }

    /// Renders the combo in Qt `PortableText` form, modifiers ordered
    /// `Ctrl+Alt+Shift+Meta+A`.
    ///
    /// Qt on macOS calls the Command key "Ctrl" and the Control key "Meta", so
    /// the two are swapped when `platform` is macOS.
    pub fn to_portable_string(&self, platform: Platform) -> String {
        let (qt_ctrl, qt_meta) = if platform == Platform::MacOs {
            (self.modifiers.meta, self.modifiers.ctrl)
        } else {
            (self.modifiers.ctrl, self.modifiers.meta)
        };

        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if qt_ctrl {
            parts.push("Ctrl");
        }
        if self.modifiers.alt {
            parts.push("Alt");
        }
        if self.modifiers.shift {
            parts.push("Shift");
        }
        if qt_meta {
            parts.push("Meta");
        }
        parts.push(self.key.portable_name());
        parts.join("+")
    }

    /// Parses a Qt `PortableText` combo as written by [`KeyCombo::to_portable_string`].
    pub fn parse_portable(text: &str, platform: Platform) -> Result<KeyCombo, KeyComboError> {
        let parsed = KeyCombo::parse(text, Platform::Windows)?;
        if platform == Platform::MacOs {
            let mut modifiers = parsed.modifiers;
            std::mem::swap(&mut modifiers.ctrl, &mut modifiers.meta);
            return Ok(KeyCombo::new(modifiers, parsed.key));
        }
        Ok(parsed)
    }
}

fn parse_modifier(token: &str, platform: Platform) -> Result<Modifier, KeyComboError> {
    match token.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Ok(Modifier::Ctrl),
        "alt" | "option" | "opt" => Ok(Modifier::Alt),
        "shift" => Ok(Modifier::Shift),
        "meta" | "cmd" | "command" | "super" | "win" => Ok(Modifier::Meta),
        "primary" => Ok(platform.primary_modifier()),
        _ => Err(KeyComboError::UnknownModifier(token.to_string())),
    }
}

fn resolve_key_token(token: &str, modifiers: &mut Modifiers) -> Result<KeyCode, KeyComboError> {
    if let Some(key) = KeyCode::from_name(token) {
        return Ok(key);
    }

    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(key) = KeyCode::from_shifted_symbol(c) {
            *modifiers = modifiers.with(Modifier::Shift);
            return Ok(key);
        }
    }

    if token.eq_ignore_ascii_case("plus") {
        *modifiers = modifiers.with(Modifier::Shift);
        return Ok(KeyCode::Equal);
    }

    Err(KeyComboError::UnknownKey(token.to_string()))
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("shift+")?;
        }
        if self.modifiers.meta {
            f.write_str("meta+")?;
        }
        f.write_str(&self.key.name())
    }
}

impl Serialize for KeyCombo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
