//! Runtime configuration.
//!
//! [`CompanionConfig`] is the single source of truth for runtime settings.
//! It is assembled in `main.rs` from the settings file and the command line,
//! then shared read-only with the server and background tasks.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default WebSocket port the control surface connects to.
pub const DEFAULT_PORT: u16 = 8765;

/// Authentication rules applied to every new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// When `false`, sessions are authenticated on connect.
    pub enabled: bool,
    /// Time a session has to authenticate before it is closed.
    pub timeout: Duration,
    /// Failed attempts allowed before the session is closed.
    pub max_attempts: u8,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

/// All runtime configuration for the companion.
#[derive(Debug, Clone)]
pub struct CompanionConfig {
    /// Address the WebSocket server binds to.
    ///
    /// `0.0.0.0` lets a phone on the LAN connect; `127.0.0.1` restricts the
    /// server to local clients.
    pub bind_addr: SocketAddr,

    pub auth: AuthPolicy,

    /// How often the foreground application is re-checked.
    pub detect_interval: Duration,

    /// Capacity of the bounded queue in front of the injection thread.
    pub injection_queue_depth: usize,

    /// Directory holding `auth.json`; `None` means `~/.artremote`.
    pub credential_dir: Option<PathBuf>,

    /// Clip Studio Paint data directory; `None` means the platform default.
    pub csp_data_dir: Option<PathBuf>,

    /// Krita resource directory (presets); `None` means the platform default.
    pub krita_resource_dir: Option<PathBuf>,

    /// Directory holding `kritashortcutsrc`; `None` means the platform default.
    pub krita_config_dir: Option<PathBuf>,
}

impl Default for CompanionConfig {
    /// | Field                 | Default          |
    /// |-----------------------|------------------|
    /// | bind_addr             | `0.0.0.0:8765`   |
    /// | auth                  | on, 30 s, 3 tries|
    /// | detect_interval       | 2 seconds        |
    /// | injection_queue_depth | 64               |
    /// | directories           | platform default |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            auth: AuthPolicy::default(),
            detect_interval: Duration::from_secs(2),
            injection_queue_depth: 64,
            credential_dir: None,
            csp_data_dir: None,
            krita_resource_dir: None,
            krita_config_dir: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
