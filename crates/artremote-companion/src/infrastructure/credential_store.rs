//! Persistence of the pairing [`Credential`] in `auth.json`.
//!
//! The file lives in `~/.artremote/` unless a directory is configured, and is
//! written owner-only (`0600`) on Unix.  Writes go to a temporary file that is
//! renamed over the old one, so a crash never leaves a half-written credential.
//!
//! A missing, unreadable-as-JSON or malformed file is replaced by a freshly
//! generated credential; any previously paired surface then has to pair again.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::credential::Credential;

/// File name of the credential inside the store directory.
pub const CREDENTIAL_FILE: &str = "auth.json";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("I/O error on credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.artremote`
    pub fn default_dir() -> Result<PathBuf, CredentialError> {
        dirs::home_dir()
            .map(|home| home.join(".artremote"))
            .ok_or(CredentialError::NoHomeDir)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }

    /// Loads the stored credential, creating and saving a new one when there is
    /// no usable file.
    pub fn load_or_create(&self) -> Result<Credential, CredentialError> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Credential>(&content) {
                Ok(credential) if credential.is_well_formed() => {
                    info!("loaded credential from {}", path.display());
                    return Ok(credential);
                }
                Ok(_) => warn!("credential in {} is malformed, regenerating", path.display()),
                Err(e) => warn!("credential file {} is corrupt ({e}), regenerating", path.display()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no credential at {}, generating one", path.display());
            }
            Err(source) => return Err(CredentialError::Io { path, source }),
        }
        self.regenerate()
    }

    /// Replaces the stored credential with a new one.
    pub fn regenerate(&self) -> Result<Credential, CredentialError> {
        let credential = Credential::generate();
        self.save(&credential)?;
        info!(
            "generated new credential (token {}) in {}",
            credential.token_preview(),
            self.path().display()
        );
        Ok(credential)
    }

    pub fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        fs::create_dir_all(&self.dir).map_err(|source| CredentialError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path();
        let tmp = self.dir.join(format!("{CREDENTIAL_FILE}.tmp"));
        let json = serde_json::to_string_pretty(credential)?;
        write_private(&tmp, json.as_bytes()).map_err(|source| CredentialError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| CredentialError::Io { path, source })
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a leftover temp file keeps its bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_create_generates_then_reloads_same_credential() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested"));

        // Act
        let first = store.load_or_create().unwrap();
        let second = store.load_or_create().unwrap();

        // Assert
        assert_eq!(first, second);
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_regenerated() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        // Act
        let credential = store.load_or_create().unwrap();

        // Assert
        assert!(credential.is_well_formed());
        let reread: Credential =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(reread, credential);
    }

    #[test]
    fn test_malformed_pin_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        let mut bad = Credential::generate();
        bad.pin = "12".to_string();
        store.save(&bad).unwrap();

        let credential = store.load_or_create().unwrap();

        assert_ne!(credential.pin, "12");
    }

    #[test]
    fn test_regenerate_replaces_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        let first = store.load_or_create().unwrap();

        let second = store.regenerate().unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(store.load_or_create().unwrap(), second);
    }

    #[test]
    fn test_file_has_expected_json_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.load_or_create().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();

        assert_eq!(value["version"], "1.0");
        assert!(value["token"].is_string());
        assert!(value["pin"].is_string());
        assert!(value["created_at"].is_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.load_or_create().unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
