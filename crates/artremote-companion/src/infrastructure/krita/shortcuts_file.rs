//! The managed range of Krita's `kritashortcutsrc`.
//!
//! The file is a KConfig INI file.  Two parts of it belong to this program:
//!
//! - keys starting with `artremote_preset_` inside the `[Shortcuts]` group;
//! - the whole `[ArtRemote Presets]` group, recording which preset owns each
//!   of those keys so ids stay attached to their presets across catalog
//!   changes.
//!
//! Every other line, including comments and other groups, is written back
//! untouched.  Managed keys are emitted sorted by action id, so writing the
//! same table twice yields byte-identical files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use artremote_core::domain::presets::MANAGED_ACTION_PREFIX;
use artremote_core::{KeyCombo, ManagedShortcut, Platform};

use crate::application::resolver::{InstallError, InstallOutcome, ShortcutInstaller};

pub const SHORTCUT_FILE: &str = "kritashortcutsrc";
pub const BACKUP_SUFFIX: &str = ".artremote-backup";
const SHORTCUT_GROUP: &str = "[Shortcuts]";
const OWNER_GROUP: &str = "[ArtRemote Presets]";

/// Default directory holding `kritashortcutsrc`.
pub fn default_config_dir(platform: Platform) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(match platform {
        Platform::Windows => home.join("AppData/Roaming/krita"),
        Platform::MacOs => home.join("Library/Application Support/krita"),
        Platform::Linux => home.join(".config/krita"),
    })
}

// ── Pure rewriting ────────────────────────────────────────────────────────────

fn is_group_header(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']')
}

fn managed_key(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    key.starts_with(MANAGED_ACTION_PREFIX).then_some((key, value.trim()))
}

/// KConfig value escaping; edge spaces become `\s` so trimming keeps them.
fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' if i == 0 || i == last => out.push_str("\\s"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('s') => out.push(' '),
            Some('\\') | None => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Reads the managed bindings from file content, sorted by action id.
///
/// Values Krita wrote with several alternatives (`A; B`) yield the first one;
/// values that do not parse are skipped.
pub fn read_managed(content: &str, platform: Platform) -> Vec<ManagedShortcut> {
    let mut combos: HashMap<String, KeyCombo> = HashMap::new();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut group = "";
    for line in content.lines() {
        let line = line.trim();
        if is_group_header(line) {
            group = line;
            continue;
        }
        let Some((key, value)) = managed_key(line) else {
            continue;
        };
        if group == SHORTCUT_GROUP {
            let first = value.split(';').next().unwrap_or_default().trim();
            match KeyCombo::parse_portable(first, platform) {
                Ok(combo) => {
                    combos.insert(key.to_string(), combo);
                }
                Err(e) => debug!("skipping unreadable shortcut {key}={value}: {e}"),
            }
        } else if group == OWNER_GROUP {
            owners.insert(key.to_string(), unescape_value(value));
        }
    }

    let mut table: Vec<ManagedShortcut> = combos
        .into_iter()
        .map(|(action_id, combo)| ManagedShortcut {
            preset: owners.remove(&action_id),
            action_id,
            combo,
        })
        .collect();
    table.sort_by(|a, b| a.action_id.cmp(&b.action_id));
    table
}

/// Returns `content` with the managed range replaced by `table`.
pub fn rewrite_managed_range(content: &str, table: &[ManagedShortcut], platform: Platform) -> String {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };

    let mut sorted: Vec<&ManagedShortcut> = table.iter().collect();
    sorted.sort_by(|a, b| a.action_id.cmp(&b.action_id));
    let managed: Vec<String> = sorted
        .iter()
        .map(|s| format!("{}={}", s.action_id, s.combo.to_portable_string(platform)))
        .collect();
    let owned: Vec<String> = sorted
        .iter()
        .filter_map(|s| Some(format!("{}={}", s.action_id, escape_value(s.preset.as_deref()?))))
        .collect();

    let mut out: Vec<String> = Vec::new();
    let mut in_group = false;
    let mut in_owners = false;
    let mut inserted = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if is_group_header(trimmed) {
            if in_group && !inserted {
                insert_before_trailing_blanks(&mut out, &managed);
                inserted = true;
            }
            in_group = trimmed == SHORTCUT_GROUP;
            in_owners = trimmed == OWNER_GROUP;
        } else if in_group && managed_key(trimmed).is_some() {
            continue;
        }
        if in_owners {
            continue;
        }
        out.push(line.to_string());
    }

    if in_group && !inserted {
        insert_before_trailing_blanks(&mut out, &managed);
        inserted = true;
    }
    if !inserted && !managed.is_empty() {
        push_group(&mut out, SHORTCUT_GROUP, managed);
    }
    if !owned.is_empty() {
        push_group(&mut out, OWNER_GROUP, owned);
    }

    let mut result = out.join(newline);
    if !result.is_empty() {
        result.push_str(newline);
    }
    result
}

fn push_group(out: &mut Vec<String>, header: &str, lines: Vec<String>) {
    if out.last().is_some_and(|l| !l.trim().is_empty()) {
        out.push(String::new());
    }
    out.push(header.to_string());
    out.extend(lines);
}

fn insert_before_trailing_blanks(out: &mut Vec<String>, managed: &[String]) {
    let blanks = out.iter().rev().take_while(|l| l.trim().is_empty()).count();
    let at = out.len() - blanks;
    out.splice(at..at, managed.iter().cloned());
}

// ── File access ───────────────────────────────────────────────────────────────

/// [`ShortcutInstaller`] writing Krita's shortcut file.
pub struct KritaShortcutFile {
    config_dir: Option<PathBuf>,
    platform: Platform,
}

impl KritaShortcutFile {
    /// Uses `config_dir`, or the platform default location when `None`.
    pub fn new(config_dir: Option<PathBuf>, platform: Platform) -> Self {
        Self {
            config_dir: config_dir.or_else(|| default_config_dir(platform)),
            platform,
        }
    }

    fn path(&self) -> Result<PathBuf, InstallError> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(SHORTCUT_FILE))
            .ok_or(InstallError::NoConfigDir)
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> InstallError + '_ {
    move |e| InstallError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn read_existing(path: &Path) -> Result<Option<String>, InstallError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path)(e)),
    }
}

/// Synchronous install used by [`KritaShortcutFile`].
pub fn install_table(
    path: &Path,
    table: &[ManagedShortcut],
    platform: Platform,
) -> Result<InstallOutcome, InstallError> {
    let existing = read_existing(path)?;
    let old = existing.as_deref().unwrap_or_default();
    let new = rewrite_managed_range(old, table, platform);

    if existing.is_some() && new == old {
        debug!("{} already up to date", path.display());
        return Ok(InstallOutcome {
            path: path.to_path_buf(),
            changed: false,
            backup_created: false,
        });
    }

    let mut backup_created = false;
    if existing.is_some() {
        let mut backup = path.as_os_str().to_owned();
        backup.push(BACKUP_SUFFIX);
        let backup = PathBuf::from(backup);
        if !backup.exists() {
            fs::copy(path, &backup).map_err(io_err(&backup))?;
            info!("backed up {} to {}", path.display(), backup.display());
            backup_created = true;
        }
    } else if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, new.as_bytes()).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))?;
    info!("wrote {} managed shortcuts to {}", table.len(), path.display());

    Ok(InstallOutcome {
        path: path.to_path_buf(),
        changed: true,
        backup_created,
    })
}

#[async_trait]
impl ShortcutInstaller for KritaShortcutFile {
    async fn installed(&self) -> Result<Vec<ManagedShortcut>, InstallError> {
        let path = self.path()?;
        let platform = self.platform;
        tokio::task::spawn_blocking(move || {
            Ok(read_existing(&path)?
                .map(|content| read_managed(&content, platform))
                .unwrap_or_default())
        })
        .await
        .map_err(|e| InstallError::Task(e.to_string()))?
    }

    async fn install(&self, table: Vec<ManagedShortcut>) -> Result<InstallOutcome, InstallError> {
        let path = self.path()?;
        let platform = self.platform;
        tokio::task::spawn_blocking(move || install_table(&path, &table, platform))
            .await
            .map_err(|e| InstallError::Task(e.to_string()))?
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
