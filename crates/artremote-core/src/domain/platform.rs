//! Host operating system identification.

use serde::{Deserialize, Serialize};

use crate::keymap::Modifier;

/// The desktop operating systems the companion runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    ///
    /// Anything that is neither Windows nor macOS is treated as an X11 desktop.
    pub fn current() -> Platform {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// The modifier application shortcuts conventionally use (Ctrl, or Command on macOS).
    pub fn primary_modifier(self) -> Modifier {
        match self {
            Platform::MacOs => Modifier::Meta,
            Platform::Windows | Platform::Linux => Modifier::Ctrl,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        }
    }
}
