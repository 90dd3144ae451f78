//! Shortcut resolution for the two target applications.
//!
//! [`ShortcutResolver`] hides where application shortcuts come from:
//!
//! - **Clip Studio Paint** favorites are read from the application's own
//!   SQLite stores through a [`FavoritesSource`] and never written.
//! - **Krita** presets are scanned through a [`PresetSource`]; on demand a
//!   generation pass allocates shortcuts for them and writes them through a
//!   [`ShortcutInstaller`].
//!
//! Reads may run concurrently with each other and with input injection.
//! Generation passes are serialized by an internal async mutex so two passes
//! never interleave their scan → allocate → write sequence over the same
//! shortcut file.
//!
//! The source traits are implemented in the infrastructure layer and mocked in
//! tests, so this module carries no database or file-system dependency.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use artremote_core::domain::presets::{assign_action_ids, normalize_catalog, owners_of};
use artremote_core::protocol::PresetFailure;
use artremote_core::{FavoriteCatalog, ManagedShortcut, Platform, PresetEntry};

use super::favorites::{build_favorites, CspShortcutRows};
use super::preset_allocator::PresetAllocator;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Reading the Clip Studio Paint stores failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("cannot open store {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    #[error("query failed on {}: {message}", path.display())]
    Query { path: PathBuf, message: String },

    #[error("could not determine the Clip Studio Paint data directory")]
    NoDataDir,

    #[error("store reader task failed: {0}")]
    Task(String),
}

/// Scanning the Krita preset catalog failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("could not determine the Krita resource directory")]
    NoResourceDir,

    #[error("I/O error scanning {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("resource cache error in {}: {message}", path.display())]
    Database { path: PathBuf, message: String },

    #[error("preset scanner task failed: {0}")]
    Task(String),
}

/// Reading or writing the Krita shortcut file failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("could not determine the Krita configuration directory")]
    NoConfigDir,

    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("installer task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Install(#[from] InstallError),
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// Raw favorite rows from Clip Studio Paint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesSource: Send + Sync {
    async fn load(&self) -> Result<CspShortcutRows, StoreError>;
}

/// The Krita preset catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresetSource: Send + Sync {
    /// Returns the catalog in any order; the resolver normalizes it.
    async fn scan(&self) -> Result<Vec<PresetEntry>, ScanError>;
}

/// What an install wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub path: PathBuf,
    /// `false` when the file already held exactly this table.
    pub changed: bool,
    /// `true` when this install made the first backup of the pristine file.
    pub backup_created: bool,
}

/// The managed range of Krita's shortcut file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortcutInstaller: Send + Sync {
    /// The managed bindings currently installed.
    async fn installed(&self) -> Result<Vec<ManagedShortcut>, InstallError>;

    /// Replaces the whole managed range with `table`.
    async fn install(&self, table: Vec<ManagedShortcut>) -> Result<InstallOutcome, InstallError>;
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Result of one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub installed: usize,
    pub failed: Vec<PresetFailure>,
    /// Krita only reads its shortcut file at startup.
    pub restart_required: bool,
    pub outcome: InstallOutcome,
}

pub struct ShortcutResolver {
    favorites: Arc<dyn FavoritesSource>,
    presets: Arc<dyn PresetSource>,
    installer: Arc<dyn ShortcutInstaller>,
    allocator: PresetAllocator,
    platform: Platform,
    generation: Mutex<()>,
}

impl ShortcutResolver {
    pub fn new(
        favorites: Arc<dyn FavoritesSource>,
        presets: Arc<dyn PresetSource>,
        installer: Arc<dyn ShortcutInstaller>,
        platform: Platform,
    ) -> Self {
        Self {
            favorites,
            presets,
            installer,
            allocator: PresetAllocator::new(platform),
            platform,
            generation: Mutex::new(()),
        }
    }

    /// Replaces the default allocator.
    pub fn with_allocator(mut self, allocator: PresetAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Current Clip Studio Paint favorites.
    ///
    /// An unreadable store degrades to twelve unassigned slots.
    pub async fn favorites(&self) -> FavoriteCatalog {
        match self.favorites.load().await {
            Ok(rows) => build_favorites(&rows, self.platform),
            Err(e) => {
                warn!("favorites unavailable, showing all slots unassigned: {e}");
                FavoriteCatalog::unassigned()
            }
        }
    }

    /// Current Krita preset catalog, annotated with installed shortcuts.
    ///
    /// Never writes.  A failed scan degrades to an empty catalog; an unreadable
    /// shortcut file degrades to presets without shortcuts.
    pub async fn presets(&self) -> Vec<PresetEntry> {
        let catalog = match self.presets.scan().await {
            Ok(entries) => normalize_catalog(entries),
            Err(e) => {
                warn!("preset catalog unavailable: {e}");
                return Vec::new();
            }
        };
        let installed = match self.installer.installed().await {
            Ok(table) => table,
            Err(e) => {
                warn!("installed preset shortcuts unavailable: {e}");
                Vec::new()
            }
        };
        annotate(catalog, &installed)
    }

    /// Runs one scan → allocate → install pass.
    pub async fn generate_and_install(&self) -> Result<GenerationReport, ResolverError> {
        let _pass = self.generation.lock().await;

        let catalog = normalize_catalog(self.presets.scan().await?);
        let previous = match self.installer.installed().await {
            Ok(table) => table,
            Err(e) => {
                warn!("could not read installed preset shortcuts, allocating fresh: {e}");
                Vec::new()
            }
        };

        let report = self.allocator.allocate(&catalog, &previous);
        for failure in &report.failures {
            warn!("{failure}");
        }
        let outcome = self.installer.install(report.table()).await?;

        info!(
            "installed {} preset shortcuts into {} ({}); restart Krita to load new shortcuts",
            report.assigned.len(),
            outcome.path.display(),
            if outcome.changed { "updated" } else { "unchanged" }
        );

        Ok(GenerationReport {
            installed: report.assigned.len(),
            failed: report
                .failures
                .iter()
                .map(|f| PresetFailure {
                    name: f.preset_name().to_string(),
                    reason: f.to_string(),
                })
                .collect(),
            restart_required: true,
            outcome,
        })
    }
}

fn annotate(catalog: Vec<PresetEntry>, installed: &[ManagedShortcut]) -> Vec<PresetEntry> {
    let ids = assign_action_ids(&catalog, &owners_of(installed));
    let combos: HashMap<&str, _> = installed
        .iter()
        .map(|s| (s.action_id.as_str(), s.combo))
        .collect();
    catalog
        .into_iter()
        .zip(ids)
        .map(|(mut entry, id)| {
            entry.assigned_shortcut = combos.get(id.as_str()).copied();
            entry
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::favorites::MenuShortcutRow;
    use artremote_core::{KeyCode, KeyCombo, PresetCategory};

    fn entries(names: &[&str]) -> Vec<PresetEntry> {
        names
            .iter()
            .map(|n| PresetEntry::new(*n, PresetCategory::Other, PathBuf::from(format!("{n}.kpp"))))
            .collect()
    }

    fn outcome() -> InstallOutcome {
        InstallOutcome {
            path: PathBuf::from("kritashortcutsrc"),
            changed: true,
            backup_created: false,
        }
    }

    fn resolver(
        favorites: MockFavoritesSource,
        presets: MockPresetSource,
        installer: MockShortcutInstaller,
    ) -> ShortcutResolver {
        ShortcutResolver::new(
            Arc::new(favorites),
            Arc::new(presets),
            Arc::new(installer),
            Platform::Windows,
        )
    }

    #[tokio::test]
    async fn test_favorites_degrade_to_unassigned_on_store_error() {
        // Arrange
        let mut favorites = MockFavoritesSource::new();
        favorites.expect_load().returning(|| {
            Err(StoreError::Missing {
                path: PathBuf::from("default.khc"),
            })
        });
        let resolver = resolver(favorites, MockPresetSource::new(), MockShortcutInstaller::new());

        // Act
        let catalog = resolver.favorites().await;

        // Assert
        assert_eq!(catalog, FavoriteCatalog::unassigned());
    }

    #[tokio::test]
    async fn test_favorites_built_from_rows() {
        let mut favorites = MockFavoritesSource::new();
        favorites.expect_load().returning(|| {
            Ok(CspShortcutRows {
                menu: vec![MenuShortcutRow {
                    command_type: None,
                    command: "copy".to_string(),
                    shortcut: "F1".to_string(),
                    modifier: 0,
                }],
                tools: Vec::new(),
            })
        });
        let resolver = resolver(favorites, MockPresetSource::new(), MockShortcutInstaller::new());

        let catalog = resolver.favorites().await;

        assert_eq!(catalog.assigned_count(), 1);
        assert_eq!(catalog.slot(1).unwrap().description, "Copy");
    }

    #[tokio::test]
    async fn test_presets_are_normalized_and_annotated_without_writing() {
        // Arrange
        let mut presets = MockPresetSource::new();
        presets
            .expect_scan()
            .returning(|| Ok(entries(&["Gamma", "Alpha", "Beta", "Alpha"])));
        let mut installer = MockShortcutInstaller::new();
        installer.expect_installed().returning(|| {
            Ok(vec![ManagedShortcut {
                action_id: "artremote_preset_beta".to_string(),
                combo: KeyCombo::parse("alt+shift+q", Platform::Windows).unwrap(),
                preset: Some("Beta".to_string()),
            }])
        });
        installer.expect_install().never();
        let resolver = resolver(MockFavoritesSource::new(), presets, installer);

        // Act
        let catalog = resolver.presets().await;

        // Assert
        let names: Vec<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
        assert!(catalog[0].assigned_shortcut.is_none());
        assert_eq!(catalog[1].assigned_shortcut.unwrap().key, KeyCode::Q);
    }

    #[tokio::test]
    async fn test_presets_degrade_to_empty_on_scan_error() {
        let mut presets = MockPresetSource::new();
        presets
            .expect_scan()
            .returning(|| Err(ScanError::NoResourceDir));
        let resolver = resolver(MockFavoritesSource::new(), presets, MockShortcutInstaller::new());

        assert!(resolver.presets().await.is_empty());
    }

    #[tokio::test]
    async fn test_generation_installs_allocated_table() {
        // Arrange
        let mut presets = MockPresetSource::new();
        presets
            .expect_scan()
            .returning(|| Ok(entries(&["Alpha", "Beta", "Gamma"])));
        let mut installer = MockShortcutInstaller::new();
        installer.expect_installed().returning(|| Ok(Vec::new()));
        installer
            .expect_install()
            .withf(|table| {
                table.len() == 3
                    && table[0].action_id == "artremote_preset_alpha"
                    && table[2].action_id == "artremote_preset_gamma"
                    && table[2].preset.as_deref() == Some("Gamma")
            })
            .times(1)
            .returning(|_| Ok(outcome()));
        let resolver = resolver(MockFavoritesSource::new(), presets, installer);

        // Act
        let report = resolver.generate_and_install().await.unwrap();

        // Assert
        assert_eq!(report.installed, 3);
        assert!(report.failed.is_empty());
        assert!(report.restart_required);
    }

    #[tokio::test]
    async fn test_generation_reports_overflow_per_entry() {
        // Arrange
        let mut presets = MockPresetSource::new();
        presets
            .expect_scan()
            .returning(|| Ok(entries(&["One", "Two", "Three"])));
        let mut installer = MockShortcutInstaller::new();
        installer.expect_installed().returning(|| Ok(Vec::new()));
        installer
            .expect_install()
            .withf(|table| table.len() == 1)
            .returning(|_| Ok(outcome()));
        let resolver = resolver(MockFavoritesSource::new(), presets, installer).with_allocator(
            PresetAllocator::with_keyspace(vec![KeyCombo::parse("alt+shift+a", Platform::Windows).unwrap()]),
        );

        // Act
        let report = resolver.generate_and_install().await.unwrap();

        // Assert
        assert_eq!(report.installed, 1);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["Three", "Two"]);
    }

    /// Installer that logs when each pass reads and writes, and holds the
    /// write open long enough for a competing pass to run.
    #[derive(Default)]
    struct RecordingInstaller {
        events: std::sync::Mutex<Vec<&'static str>>,
    }

    impl RecordingInstaller {
        fn record(&self, event: &'static str) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl ShortcutInstaller for RecordingInstaller {
        async fn installed(&self) -> Result<Vec<ManagedShortcut>, InstallError> {
            self.record("read");
            Ok(Vec::new())
        }

        async fn install(&self, _table: Vec<ManagedShortcut>) -> Result<InstallOutcome, InstallError> {
            self.record("write-start");
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            self.record("write-end");
            Ok(outcome())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_generation_passes_do_not_interleave() {
        // Arrange
        let mut presets = MockPresetSource::new();
        presets
            .expect_scan()
            .times(2)
            .returning(|| Ok(entries(&["Alpha", "Beta"])));
        let installer = Arc::new(RecordingInstaller::default());
        let resolver = Arc::new(ShortcutResolver::new(
            Arc::new(MockFavoritesSource::new()),
            Arc::new(presets),
            Arc::clone(&installer) as Arc<dyn ShortcutInstaller>,
            Platform::Windows,
        ));

        // Act
        let (a, b) = tokio::join!(
            tokio::spawn({
                let resolver = Arc::clone(&resolver);
                async move { resolver.generate_and_install().await }
            }),
            tokio::spawn({
                let resolver = Arc::clone(&resolver);
                async move { resolver.generate_and_install().await }
            }),
        );

        // Assert
        tokio_test::assert_ok!(a.unwrap());
        tokio_test::assert_ok!(b.unwrap());
        let pass = ["read", "write-start", "write-end"];
        let expected: Vec<&str> = pass.iter().chain(pass.iter()).copied().collect();
        assert_eq!(*installer.events.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_generation_propagates_scan_failure() {
        let mut presets = MockPresetSource::new();
        presets
            .expect_scan()
            .returning(|| Err(ScanError::NoResourceDir));
        let mut installer = MockShortcutInstaller::new();
        installer.expect_install().never();
        let resolver = resolver(MockFavoritesSource::new(), presets, installer);

        let err = resolver.generate_and_install().await.unwrap_err();

        assert_eq!(err, ResolverError::Scan(ScanError::NoResourceDir));
    }
}
