//! Krita brush presets and their generated shortcut identifiers.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::keymap::KeyCombo;

/// Prefix of every shortcut action this program writes into Krita's shortcut file.
pub const MANAGED_ACTION_PREFIX: &str = "artremote_preset_";

/// Preset grouping shown on the control surface.
///
/// Declaration order is the catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PresetCategory {
    Pencils,
    Ink,
    Watercolor,
    Paint,
    Airbrush,
    Erasers,
    Basic,
    Other,
}

impl PresetCategory {
    /// Classifies a preset from its tags, falling back to its name.
    pub fn classify<'a, I>(name: &str, tags: I) -> PresetCategory
    where
        I: IntoIterator<Item = &'a str>,
    {
        for tag in tags {
            if let Some(category) = Self::from_keywords(&tag.to_lowercase()) {
                return category;
            }
        }
        Self::from_keywords(&name.to_lowercase()).unwrap_or(PresetCategory::Other)
    }

    fn from_keywords(text: &str) -> Option<PresetCategory> {
        const RULES: &[(&[&str], PresetCategory)] = &[
            (&["eraser", "erase"], PresetCategory::Erasers),
            (&["pencil", "sketch", "graphite"], PresetCategory::Pencils),
            (&["ink", "pen", "liner", "marker"], PresetCategory::Ink),
            (&["water", "wet"], PresetCategory::Watercolor),
            (&["airbrush", "spray"], PresetCategory::Airbrush),
            (&["paint", "oil", "acrylic", "bristle", "brush"], PresetCategory::Paint),
            (&["basic", "default"], PresetCategory::Basic),
        ];
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
            .map(|(_, category)| *category)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresetCategory::Pencils => "Pencils",
            PresetCategory::Ink => "Ink",
            PresetCategory::Watercolor => "Watercolor",
            PresetCategory::Paint => "Paint",
            PresetCategory::Airbrush => "Airbrush",
            PresetCategory::Erasers => "Erasers",
            PresetCategory::Basic => "Basic",
            PresetCategory::Other => "Other",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            PresetCategory::Pencils => "✏️",
            PresetCategory::Ink => "🖊️",
            PresetCategory::Watercolor => "💧",
            PresetCategory::Paint => "🖌️",
            PresetCategory::Airbrush => "🎨",
            PresetCategory::Erasers => "🧽",
            PresetCategory::Basic | PresetCategory::Other => "🔧",
        }
    }
}

/// One Krita brush preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetEntry {
    pub name: String,
    pub category: PresetCategory,
    #[serde(skip)]
    pub source_path: PathBuf,
    /// Generated shortcut, once installed.
    #[serde(rename = "shortcut")]
    pub assigned_shortcut: Option<KeyCombo>,
}

impl PresetEntry {
    pub fn new(name: impl Into<String>, category: PresetCategory, source_path: PathBuf) -> Self {
        Self {
            name: name.into(),
            category,
            source_path,
            assigned_shortcut: None,
        }
    }
}

/// Sorts presets into catalog order and drops later duplicates by name.
///
/// Order is (category, name, source path), so the result does not depend on
/// the order the scanner happened to find files in.
pub fn normalize_catalog(mut entries: Vec<PresetEntry>) -> Vec<PresetEntry> {
    entries.sort_by(|a, b| {
        (a.category, &a.name, &a.source_path).cmp(&(b.category, &b.name, &b.source_path))
    });
    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.name.clone()));
    entries
}

/// Builds the shortcut-file action name for a preset.
///
/// ASCII alphanumerics are lowercased and every other run of characters
/// becomes one `_`.  Names with no ASCII alphanumerics at all fall back to the
/// hex encoding of their UTF-8 bytes so they still get a stable identifier.
pub fn preset_action_id(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug = hex::encode(name.as_bytes());
    }
    format!("{MANAGED_ACTION_PREFIX}{slug}")
}

/// One binding in the managed range of Krita's shortcut file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedShortcut {
    pub action_id: String,
    pub combo: KeyCombo,
    /// Name of the preset holding `action_id`; `None` when the file does not
    /// record it.
    pub preset: Option<String>,
}

/// Action id → owning preset name, for the bindings that record an owner.
pub fn owners_of(installed: &[ManagedShortcut]) -> HashMap<String, String> {
    installed
        .iter()
        .filter_map(|s| Some((s.action_id.clone(), s.preset.clone()?)))
        .collect()
}

/// Assigns action ids to an ordered catalog.
///
/// `owners` maps installed ids to the preset that holds them.  A preset keeps
/// the id it already owns.  Every other preset takes its base id, or the first
/// of `_2`, `_3`, … that is neither used in this pass nor owned by a different
/// preset, so adding a preset never moves an existing one to another id.
pub fn assign_action_ids(entries: &[PresetEntry], owners: &HashMap<String, String>) -> Vec<String> {
    let owned: HashMap<&str, &str> = owners
        .iter()
        .map(|(id, name)| (name.as_str(), id.as_str()))
        .collect();
    let mut used: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut ids: Vec<Option<String>> = vec![None; entries.len()];

    for (slot, entry) in ids.iter_mut().zip(entries) {
        if let Some(id) = owned.get(entry.name.as_str()) {
            if used.insert((*id).to_string()) {
                *slot = Some((*id).to_string());
            }
        }
    }

    for (slot, entry) in ids.iter_mut().zip(entries) {
        if slot.is_some() {
            continue;
        }
        let base = preset_action_id(&entry.name);
        let mut candidate = base.clone();
        let mut n = 2;
        while used.contains(&candidate)
            || owners.get(&candidate).is_some_and(|owner| owner != &entry.name)
        {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        used.insert(candidate.clone());
        *slot = Some(candidate);
    }

    ids.into_iter().flatten().collect()
}
