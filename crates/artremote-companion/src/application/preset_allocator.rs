//! Deterministic shortcut allocation for Krita presets.
//!
//! The candidate keyspace is every combination of
//!
//! ```text
//! { primary+Alt, primary+Alt+Shift, Alt+Shift } × { A..Z, 0..9 }
//! ```
//!
//! in that order, minus [`RESERVED_COMBOS`].  Allocation runs in two passes:
//!
//! 1. every entry whose previously installed combination is still in the
//!    keyspace and not yet taken keeps it;
//! 2. the remaining entries, in catalog order, take the first free
//!    combination.
//!
//! With no previous table the result is a pure function of catalog order, and
//! with one the assignments of existing entries never move.  Entries left
//! over when the keyspace runs out get an explicit
//! [`AllocationError::KeyspaceExhausted`]; a combination is never reused.

use std::collections::{HashMap, HashSet};

use artremote_core::domain::presets::{assign_action_ids, owners_of};
use artremote_core::{
    KeyCode, KeyCombo, ManagedShortcut, Modifier, Modifiers, Platform, PresetEntry,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Combinations never handed out, written in [`KeyCombo::parse`] syntax.
///
/// These are bound by Krita itself on a default install.
pub const RESERVED_COMBOS: &[&str] = &["primary+alt+t", "primary+alt+l", "primary+alt+d"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no free shortcut left for preset {name:?}")]
    KeyspaceExhausted { name: String },
}

impl AllocationError {
    /// Name of the preset that could not be allocated.
    pub fn preset_name(&self) -> &str {
        match self {
            AllocationError::KeyspaceExhausted { name } => name,
        }
    }
}

/// One preset's installed binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Catalog position of the preset.
    pub index: usize,
    pub action_id: String,
    pub name: String,
    pub combo: KeyCombo,
}

/// Outcome of one allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationReport {
    /// Successful allocations in catalog order.
    pub assigned: Vec<Allocation>,
    pub failures: Vec<AllocationError>,
}

impl AllocationReport {
    /// The managed table to install, with each id's owning preset.
    pub fn table(&self) -> Vec<ManagedShortcut> {
        self.assigned
            .iter()
            .map(|a| ManagedShortcut {
                action_id: a.action_id.clone(),
                combo: a.combo,
                preset: Some(a.name.clone()),
            })
            .collect()
    }
}

/// Allocator over a fixed, ordered keyspace.
#[derive(Debug, Clone)]
pub struct PresetAllocator {
    keyspace: Vec<KeyCombo>,
}

impl PresetAllocator {
    /// The default keyspace for `platform`.
    pub fn new(platform: Platform) -> Self {
        let primary = Modifiers::primary(platform);
        let groups = [
            primary.with(Modifier::Alt),
            primary.with(Modifier::Alt).with(Modifier::Shift),
            Modifiers::NONE.with(Modifier::Alt).with(Modifier::Shift),
        ];
        let reserved: HashSet<KeyCombo> = RESERVED_COMBOS
            .iter()
            .filter_map(|text| match KeyCombo::parse(text, platform) {
                Ok(combo) => Some(combo),
                Err(e) => {
                    warn!("ignoring reserved combo {text}: {e}");
                    None
                }
            })
            .collect();

        let keys = KeyCode::letters().iter().chain(KeyCode::digits());
        let keys: Vec<KeyCode> = keys.copied().collect();
        let keyspace = groups
            .iter()
            .flat_map(|modifiers| keys.iter().map(move |key| KeyCombo::new(*modifiers, *key)))
            .filter(|combo| !reserved.contains(combo))
            .collect();
        Self { keyspace }
    }

    /// An allocator over an explicit keyspace, in the order given.
    pub fn with_keyspace(keyspace: Vec<KeyCombo>) -> Self {
        Self { keyspace }
    }

    pub fn keyspace(&self) -> &[KeyCombo] {
        &self.keyspace
    }

    /// Allocates a combination for every entry of an ordered catalog.
    ///
    /// `previous` is the managed table currently installed.  Its recorded
    /// owners pin action ids to presets, so a new preset whose name collides
    /// with an installed one never takes over that preset's id or combination.
    pub fn allocate(&self, catalog: &[PresetEntry], previous: &[ManagedShortcut]) -> AllocationReport {
        let owners = owners_of(previous);
        let combos: HashMap<&str, KeyCombo> = previous
            .iter()
            .map(|s| (s.action_id.as_str(), s.combo))
            .collect();
        let ids = assign_action_ids(catalog, &owners);
        let valid: HashSet<KeyCombo> = self.keyspace.iter().copied().collect();
        let mut taken: HashSet<KeyCombo> = HashSet::with_capacity(catalog.len());
        let mut chosen: Vec<Option<KeyCombo>> = vec![None; catalog.len()];

        // Pass 1: keep still-valid previous assignments.
        for (i, id) in ids.iter().enumerate() {
            if let Some(combo) = combos.get(id.as_str()) {
                if valid.contains(combo) && taken.insert(*combo) {
                    chosen[i] = Some(*combo);
                }
            }
        }
        let kept = chosen.iter().flatten().count();

        // Pass 2: fill the rest in catalog order.
        let mut free = self.keyspace.iter().filter(|c| !taken.contains(*c));
        let mut report = AllocationReport::default();
        for (i, entry) in catalog.iter().enumerate() {
            let combo = match chosen[i] {
                Some(combo) => combo,
                None => match free.next() {
                    Some(combo) => *combo,
                    None => {
                        report.failures.push(AllocationError::KeyspaceExhausted {
                            name: entry.name.clone(),
                        });
                        continue;
                    }
                },
            };
            report.assigned.push(Allocation {
                index: i,
                action_id: ids[i].clone(),
                name: entry.name.clone(),
                combo,
            });
        }

        debug!(
            "allocated {} presets ({kept} kept), {} failed",
            report.assigned.len(),
            report.failures.len()
        );
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use artremote_core::PresetCategory;
    use std::path::PathBuf;

    fn catalog(names: &[&str]) -> Vec<PresetEntry> {
        names
            .iter()
            .map(|n| PresetEntry::new(*n, PresetCategory::Other, PathBuf::from(format!("{n}.kpp"))))
            .collect()
    }

    fn previous_from(report: &AllocationReport) -> Vec<ManagedShortcut> {
        report.table()
    }

    #[test]
    fn test_keyspace_size_and_reserved_exclusion() {
        // Arrange / Act
        let allocator = PresetAllocator::new(Platform::Windows);

        // Assert: 3 modifier groups × 36 keys, minus 3 reserved.
        assert_eq!(allocator.keyspace().len(), 3 * 36 - 3);
        for text in RESERVED_COMBOS {
            let reserved = KeyCombo::parse(text, Platform::Windows).unwrap();
            assert!(!allocator.keyspace().contains(&reserved), "{text}");
        }
    }

    #[test]
    fn test_alpha_beta_gamma_scenario() {
        // Arrange
        let allocator = PresetAllocator::new(Platform::Linux);
        let presets = catalog(&["Alpha", "Beta", "Gamma"]);

        // Act
        let first = allocator.allocate(&presets, &[]);
        let rescan = allocator.allocate(&presets, &[]);
        let with_previous = allocator.allocate(&presets, &previous_from(&first));

        // Assert
        assert_eq!(first.assigned.len(), 3);
        assert!(first.failures.is_empty());
        let combos: HashSet<KeyCombo> = first.assigned.iter().map(|a| a.combo).collect();
        assert_eq!(combos.len(), 3, "combinations are distinct");
        let reserved: Vec<KeyCombo> = RESERVED_COMBOS
            .iter()
            .map(|t| KeyCombo::parse(t, Platform::Linux).unwrap())
            .collect();
        assert!(combos.iter().all(|c| !reserved.contains(c)));
        assert_eq!(first, rescan);
        assert_eq!(first, with_previous);
    }

    #[test]
    fn test_appending_entries_keeps_existing_assignments() {
        // Arrange
        let allocator = PresetAllocator::new(Platform::Windows);
        let before = allocator.allocate(&catalog(&["Alpha", "Beta"]), &[]);

        // Act: a new preset sorts first.
        let after = allocator.allocate(&catalog(&["Aardvark", "Alpha", "Beta"]), &previous_from(&before));

        // Assert
        let combo_of = |r: &AllocationReport, name: &str| {
            r.assigned.iter().find(|a| a.name == name).map(|a| a.combo)
        };
        assert_eq!(combo_of(&after, "Alpha"), combo_of(&before, "Alpha"));
        assert_eq!(combo_of(&after, "Beta"), combo_of(&before, "Beta"));
        let aardvark = combo_of(&after, "Aardvark").unwrap();
        assert_ne!(Some(aardvark), combo_of(&before, "Alpha"));
        assert_ne!(Some(aardvark), combo_of(&before, "Beta"));
    }

    #[test]
    fn test_colliding_newcomer_does_not_take_installed_combo() {
        // Arrange
        let allocator = PresetAllocator::new(Platform::Windows);
        let before = allocator.allocate(&catalog(&["Ink_3"]), &[]);

        // Act: "Ink 3" has the same slug and sorts first.
        let after = allocator.allocate(&catalog(&["Ink 3", "Ink_3"]), &previous_from(&before));

        // Assert
        let find = |r: &AllocationReport, name: &str| {
            r.assigned.iter().find(|a| a.name == name).cloned().unwrap()
        };
        let kept = find(&after, "Ink_3");
        let added = find(&after, "Ink 3");
        assert_eq!(kept.action_id, "artremote_preset_ink_3");
        assert_eq!(kept.combo, find(&before, "Ink_3").combo);
        assert_eq!(added.action_id, "artremote_preset_ink_3_2");
        assert_ne!(added.combo, kept.combo);
    }

    #[test]
    fn test_previous_combo_without_owner_is_kept_by_id() {
        let allocator = PresetAllocator::new(Platform::Windows);
        let combo = allocator.keyspace()[5];
        let previous = vec![ManagedShortcut {
            action_id: "artremote_preset_alpha".to_string(),
            combo,
            preset: None,
        }];

        let report = allocator.allocate(&catalog(&["Alpha"]), &previous);

        assert_eq!(report.assigned[0].combo, combo);
    }

    #[test]
    fn test_overflow_fails_explicitly_without_reuse() {
        // Arrange
        let keyspace = vec![
            KeyCombo::parse("alt+shift+a", Platform::Windows).unwrap(),
            KeyCombo::parse("alt+shift+b", Platform::Windows).unwrap(),
        ];
        let allocator = PresetAllocator::with_keyspace(keyspace);

        // Act
        let report = allocator.allocate(&catalog(&["One", "Two", "Three", "Four"]), &[]);

        // Assert
        assert_eq!(report.assigned.len(), 2);
        assert_eq!(
            report.failures,
            vec![
                AllocationError::KeyspaceExhausted { name: "Three".to_string() },
                AllocationError::KeyspaceExhausted { name: "Four".to_string() },
            ]
        );
    }

    #[test]
    fn test_full_default_keyspace_never_collides() {
        let allocator = PresetAllocator::new(Platform::MacOs);
        let names: Vec<String> = (0..120).map(|i| format!("Preset {i:03}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let report = allocator.allocate(&catalog(&refs), &[]);

        assert_eq!(report.assigned.len(), allocator.keyspace().len());
        assert_eq!(report.failures.len(), 120 - allocator.keyspace().len());
        let unique: HashSet<KeyCombo> = report.assigned.iter().map(|a| a.combo).collect();
        assert_eq!(unique.len(), report.assigned.len());
    }

    #[test]
    fn test_previous_combo_outside_keyspace_is_reallocated() {
        let allocator = PresetAllocator::new(Platform::Windows);
        let presets = catalog(&["Alpha"]);
        let previous = vec![ManagedShortcut {
            action_id: "artremote_preset_alpha".to_string(),
            combo: KeyCombo::parse("primary+alt+t", Platform::Windows).unwrap(),
            preset: Some("Alpha".to_string()),
        }];

        let report = allocator.allocate(&presets, &previous);

        assert_eq!(report.assigned[0].combo, allocator.keyspace()[0]);
    }

    #[test]
    fn test_non_ascii_names_still_allocate() {
        let allocator = PresetAllocator::new(Platform::Windows);
        let report = allocator.allocate(&catalog(&["水彩", "★"]), &[]);
        assert_eq!(report.assigned.len(), 2);
        assert_ne!(report.assigned[0].action_id, report.assigned[1].action_id);
    }
}
