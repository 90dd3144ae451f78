//! Krita brush preset catalog.
//!
//! Krita 5 indexes every resource in `resourcecache.sqlite` in its resource
//! directory; that is the primary source.  When the cache is missing or cannot
//! be queried the scanner falls back to the `.kpp` files in `paintoppresets/`,
//! naming each preset after its file stem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use artremote_core::{Platform, PresetCategory, PresetEntry};

use crate::application::resolver::{PresetSource, ScanError};

const RESOURCE_CACHE: &str = "resourcecache.sqlite";
const PRESET_DIR: &str = "paintoppresets";
const PRESET_EXTENSION: &str = "kpp";

const PRESET_QUERY: &str = "\
    SELECT r.name, r.filename, GROUP_CONCAT(t.name, ',') \
    FROM resources r \
    JOIN resource_types rt ON r.resource_type_id = rt.id \
    LEFT JOIN resource_tags rtg ON r.id = rtg.resource_id \
    LEFT JOIN tags t ON rtg.tag_id = t.id \
    WHERE rt.name = 'paintoppresets' AND r.status = 1 \
    GROUP BY r.id, r.name, r.filename";

/// [`PresetSource`] over a Krita resource directory.
pub struct KritaPresetScanner {
    resource_dir: Option<PathBuf>,
}

impl KritaPresetScanner {
    /// Uses `resource_dir`, or the platform default location when `None`.
    pub fn new(resource_dir: Option<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.or_else(|| default_resource_dir(Platform::current())),
        }
    }
}

/// Default Krita resource directory.
pub fn default_resource_dir(platform: Platform) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(match platform {
        Platform::Windows => home.join("AppData/Roaming/krita"),
        Platform::MacOs => home.join("Library/Application Support/krita"),
        Platform::Linux => home.join(".local/share/krita"),
    })
}

#[async_trait]
impl PresetSource for KritaPresetScanner {
    async fn scan(&self) -> Result<Vec<PresetEntry>, ScanError> {
        let dir = self.resource_dir.clone().ok_or(ScanError::NoResourceDir)?;
        tokio::task::spawn_blocking(move || scan_presets(&dir))
            .await
            .map_err(|e| ScanError::Task(e.to_string()))?
    }
}

/// Scans synchronously, preferring the resource cache.
pub fn scan_presets(resource_dir: &Path) -> Result<Vec<PresetEntry>, ScanError> {
    let cache = resource_dir.join(RESOURCE_CACHE);
    if cache.exists() {
        match read_resource_cache(&cache, resource_dir) {
            Ok(entries) => {
                debug!("{} presets from {}", entries.len(), cache.display());
                return Ok(entries);
            }
            Err(e) => warn!("{e}; falling back to preset files"),
        }
    }
    scan_preset_files(&resource_dir.join(PRESET_DIR))
}

fn read_resource_cache(cache: &Path, resource_dir: &Path) -> Result<Vec<PresetEntry>, ScanError> {
    let db_err = |e: rusqlite::Error| ScanError::Database {
        path: cache.to_path_buf(),
        message: e.to_string(),
    };

    let conn = Connection::open_with_flags(
        cache,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(db_err)?;

    let mut stmt = conn.prepare(PRESET_QUERY).map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(db_err)?;

    let preset_dir = resource_dir.join(PRESET_DIR);
    let mut entries = Vec::new();
    for row in rows {
        let (name, filename, tags) = row.map_err(db_err)?;
        let tags = tags.unwrap_or_default();
        let category = PresetCategory::classify(&name, tags.split(',').filter(|t| !t.is_empty()));
        let source_path = preset_dir.join(filename.unwrap_or_default());
        entries.push(PresetEntry::new(name, category, source_path));
    }
    Ok(entries)
}

fn scan_preset_files(dir: &Path) -> Result<Vec<PresetEntry>, ScanError> {
    let io_err = |e: std::io::Error| ScanError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir).map_err(io_err)? {
        let path = item.map_err(io_err)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(PRESET_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let name = stem.replace('_', " ");
        let category = PresetCategory::classify(&name, std::iter::empty());
        entries.push(PresetEntry::new(name, category, path));
    }
    debug!("{} presets from {}", entries.len(), dir.display());
    Ok(entries)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
