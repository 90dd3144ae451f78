//! Read-only access to Clip Studio Paint's shortcut stores.
//!
//! Layout under the data directory (`CLIPStudioPaintVer1_5_0`):
//!
//! ```text
//! Shortcut/default.khc      menu shortcuts   (table shortcutmenu)
//! Tool/EditImageTool.todb   sub-tool tree    (table Node)
//! ```
//!
//! Both files are SQLite databases owned by the application.  They are opened
//! with `SQLITE_OPEN_READ_ONLY` and never written.  The menu store is
//! required; the tool store is optional because a fresh install may not have
//! written it yet.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, warn};

use artremote_core::Platform;

use crate::application::favorites::{
    CspShortcutRows, MenuShortcutRow, ToolShortcutRow, CSP_FUNCTION_KEY_OFFSET,
};
use crate::application::resolver::{FavoritesSource, StoreError};

const DATA_DIR_NAME: &str = "CLIPStudioPaintVer1_5_0";
const MENU_STORE: &str = "Shortcut/default.khc";
const TOOL_STORE: &str = "Tool/EditImageTool.todb";

const MENU_QUERY: &str = "SELECT menucommandtype, menucommand, shortcut, modifier \
                          FROM shortcutmenu WHERE shortcut LIKE 'F%'";
const TOOL_QUERY: &str = "SELECT NodeName, NodeShortCutKey FROM Node \
                          WHERE NodeShortCutKey BETWEEN ?1 AND ?2";

/// [`FavoritesSource`] backed by the application's SQLite stores.
pub struct CspStore {
    data_dir: Option<PathBuf>,
}

impl CspStore {
    /// Uses `data_dir`, or the platform default location when `None`.
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.or_else(|| default_data_dir(Platform::current())),
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

/// Default data directory; Clip Studio Paint only ships for Windows and macOS.
pub fn default_data_dir(platform: Platform) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    match platform {
        Platform::Windows => Some(home.join("AppData/Roaming/CELSys").join(DATA_DIR_NAME)),
        Platform::MacOs => Some(home.join("Library/CELSYS").join(DATA_DIR_NAME)),
        Platform::Linux => None,
    }
}

#[async_trait]
impl FavoritesSource for CspStore {
    async fn load(&self) -> Result<CspShortcutRows, StoreError> {
        let dir = self.data_dir.clone().ok_or(StoreError::NoDataDir)?;
        tokio::task::spawn_blocking(move || read_rows(&dir))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Reads both stores synchronously.
pub fn read_rows(data_dir: &Path) -> Result<CspShortcutRows, StoreError> {
    let menu_path = data_dir.join(MENU_STORE);
    let menu = read_menu_rows(&menu_path)?;

    let tool_path = data_dir.join(TOOL_STORE);
    let tools = if tool_path.exists() {
        match read_tool_rows(&tool_path) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("ignoring tool shortcuts: {e}");
                Vec::new()
            }
        }
    } else {
        debug!("no tool store at {}", tool_path.display());
        Vec::new()
    };

    debug!("read {} menu and {} tool shortcut rows", menu.len(), tools.len());
    Ok(CspShortcutRows { menu, tools })
}

fn open_read_only(path: &Path) -> Result<Connection, StoreError> {
    if !path.exists() {
        return Err(StoreError::Missing {
            path: path.to_path_buf(),
        });
    }
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| StoreError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_menu_rows(path: &Path) -> Result<Vec<MenuShortcutRow>, StoreError> {
    let conn = open_read_only(path)?;
    let query_err = |e: rusqlite::Error| StoreError::Query {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut stmt = conn.prepare(MENU_QUERY).map_err(query_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MenuShortcutRow {
                command_type: text_column(row, 0)?,
                command: text_column(row, 1)?.unwrap_or_default(),
                shortcut: text_column(row, 2)?.unwrap_or_default(),
                modifier: integer_column(row, 3)?.unwrap_or(0),
            })
        })
        .map_err(query_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
}

fn read_tool_rows(path: &Path) -> Result<Vec<ToolShortcutRow>, StoreError> {
    let conn = open_read_only(path)?;
    let query_err = |e: rusqlite::Error| StoreError::Query {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut stmt = conn.prepare(TOOL_QUERY).map_err(query_err)?;
    let rows = stmt
        .query_map(
            [CSP_FUNCTION_KEY_OFFSET + 1, CSP_FUNCTION_KEY_OFFSET + 12],
            |row| {
                Ok(ToolShortcutRow {
                    node_name: text_column(row, 0)?.unwrap_or_default(),
                    shortcut_key: integer_column(row, 1)?.unwrap_or(0),
                })
            },
        )
        .map_err(query_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
}

/// Reads a column as text whatever its storage class.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

/// Reads a column as an integer; text that does not parse becomes `-1` so the
/// caller treats it as an unknown code.
fn integer_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(
            std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(-1),
        ),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
