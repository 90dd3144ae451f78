//! TOML settings file for the companion.
//!
//! Location (from [`dirs::config_dir`]):
//! - Windows:  `%APPDATA%\ArtRemote\config.toml`
//! - Linux:    `~/.config/ArtRemote/config.toml`
//! - macOS:    `~/Library/Application Support/ArtRemote/config.toml`
//!
//! Every field has a serde default, so a missing file, an empty file and a
//! file written by an older version all load:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [server]
//! port = 8765
//! bind_scope = "local"
//!
//! [auth]
//! enabled = true
//! timeout_secs = 30
//! max_attempts = 3
//!
//! [detection]
//! interval_ms = 2000
//!
//! [paths]
//! krita_resource_dir = "/home/me/.local/share/krita"
//! ```
//!
//! Command-line flags override whatever this file says; see `main.rs`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{AuthPolicy, CompanionConfig, DEFAULT_PORT};

/// Upper bound applied to `[auth] timeout_secs`.
pub const MAX_AUTH_TIMEOUT_SECS: u64 = 3600;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanionSettings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which interfaces the WebSocket listener binds to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BindScope {
    /// Loopback only.
    Local,
    /// All interfaces, so a phone on the same network can connect.
    #[default]
    Network,
}

impl BindScope {
    pub fn ip(self) -> IpAddr {
        match self {
            BindScope::Local => IpAddr::V4(Ipv4Addr::LOCALHOST),
            BindScope::Network => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind_scope: BindScope,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_auth_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionSettings {
    #[serde(default = "default_detect_interval_ms")]
    pub interval_ms: u64,
}

/// Overrides for where the target applications keep their data.
///
/// `None` means "use the platform default location".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PathSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csp_data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub krita_resource_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub krita_config_dir: Option<PathBuf>,
}

// ── Serde default helpers ─────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_true() -> bool {
    true
}
fn default_auth_timeout_secs() -> u64 {
    30
}
fn default_max_attempts() -> u8 {
    3
}
fn default_detect_interval_ms() -> u64 {
    2000
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_scope: BindScope::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            timeout_secs: default_auth_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_detect_interval_ms(),
        }
    }
}

impl CompanionSettings {
    /// Converts the file view into the runtime configuration.
    ///
    /// Directory fields left unset here are filled with platform defaults by
    /// the infrastructure that uses them.
    pub fn to_config(&self) -> CompanionConfig {
        CompanionConfig {
            bind_addr: SocketAddr::new(self.server.bind_scope.ip(), self.server.port),
            auth: AuthPolicy {
                enabled: self.auth.enabled,
                timeout: Duration::from_secs(
                    self.auth.timeout_secs.clamp(1, MAX_AUTH_TIMEOUT_SECS),
                ),
                max_attempts: self.auth.max_attempts.max(1),
            },
            detect_interval: Duration::from_millis(self.detection.interval_ms.max(100)),
            credential_dir: self.paths.credential_dir.clone(),
            csp_data_dir: self.paths.csp_data_dir.clone(),
            krita_resource_dir: self.paths.krita_resource_dir.clone(),
            krita_config_dir: self.paths.krita_config_dir.clone(),
            ..CompanionConfig::default()
        }
    }
}

// ── File access ───────────────────────────────────────────────────────────────

/// Resolves the `ArtRemote` directory under the platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join("ArtRemote"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default settings file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads settings from `path`, returning the defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<CompanionSettings, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CompanionSettings::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `settings` to `path`, creating the parent directory if needed.
pub fn save_settings(path: &Path, settings: &CompanionSettings) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
