//! Decoding Clip Studio Paint shortcut rows into favorite slots.
//!
//! Clip Studio Paint keeps function-key assignments in two SQLite stores:
//!
//! - the menu store (`Shortcut/default.khc`): one row per menu command bound
//!   to `F1`..`F12`, with a numeric modifier code;
//! - the tool store (`Tool/EditImageTool.todb`): one row per custom sub-tool,
//!   whose `NodeShortCutKey` is `36 + n` for `F{n}`.
//!
//! This module turns those raw rows into a [`FavoriteCatalog`].  It does no
//! I/O; the infrastructure layer reads the rows.

use artremote_core::domain::favorites::FavoriteSlot;
use artremote_core::{FavoriteCatalog, KeyCode, KeyCombo, Modifier, Modifiers, Platform, FAVORITE_SLOT_COUNT};
use tracing::{debug, warn};

/// `NodeShortCutKey` value of `F1` minus one.
pub const CSP_FUNCTION_KEY_OFFSET: i64 = 36;

/// One row of `shortcutmenu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuShortcutRow {
    pub command_type: Option<String>,
    pub command: String,
    /// Key name as stored, e.g. `"F5"`.
    pub shortcut: String,
    pub modifier: i64,
}

/// One row of the tool store's `Node` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolShortcutRow {
    pub node_name: String,
    pub shortcut_key: i64,
}

/// Everything read from the two stores in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspShortcutRows {
    pub menu: Vec<MenuShortcutRow>,
    pub tools: Vec<ToolShortcutRow>,
}

/// Builds the twelve-slot catalog.
///
/// Tool rows override menu rows for the same slot.  Rows that do not map to a
/// slot (unknown modifier code, key outside `F1`..`F12`) are skipped, leaving
/// the slot unassigned.
pub fn build_favorites(rows: &CspShortcutRows, platform: Platform) -> FavoriteCatalog {
    let menu_slots = rows.menu.iter().filter_map(|row| menu_slot(row, platform));
    let tool_slots = rows.tools.iter().filter_map(tool_slot);
    let catalog = FavoriteCatalog::from_slots(menu_slots.chain(tool_slots));
    debug!("favorites: {} of {FAVORITE_SLOT_COUNT} slots assigned", catalog.assigned_count());
    catalog
}

fn menu_slot(row: &MenuShortcutRow, platform: Platform) -> Option<FavoriteSlot> {
    let index = function_key_index(&row.shortcut)?;
    let Some(modifiers) = modifier_from_code(row.modifier, platform) else {
        warn!(
            "favorites: F{index} ({}) has unknown modifier code {}, leaving unassigned",
            row.command, row.modifier
        );
        return None;
    };
    let key = KeyCode::function(index)?;
    Some(FavoriteSlot {
        index,
        assigned: true,
        icon: command_icon(&row.command).to_string(),
        description: command_description(&row.command),
        command: Some(row.command.clone()),
        key_combination: Some(KeyCombo::new(modifiers, key)),
    })
}

fn tool_slot(row: &ToolShortcutRow) -> Option<FavoriteSlot> {
    let Some(index) = tool_key_index(row.shortcut_key) else {
        warn!(
            "favorites: tool {} has shortcut key {} outside F1..F12, ignoring",
            row.node_name, row.shortcut_key
        );
        return None;
    };
    let key = KeyCode::function(index)?;
    Some(FavoriteSlot {
        index,
        assigned: true,
        icon: tool_icon(&row.node_name).to_string(),
        description: row.node_name.clone(),
        command: Some(format!("custom_tool_{}", row.shortcut_key)),
        key_combination: Some(KeyCombo::key(key)),
    })
}

/// Maps `NodeShortCutKey` to a slot, re-checking the range the query used.
pub fn tool_key_index(shortcut_key: i64) -> Option<u8> {
    let n = shortcut_key.checked_sub(CSP_FUNCTION_KEY_OFFSET)?;
    u8::try_from(n)
        .ok()
        .filter(|n| (1..=FAVORITE_SLOT_COUNT).contains(n))
}

/// Parses `"F5"` (any case) into `5`.
fn function_key_index(shortcut: &str) -> Option<u8> {
    let shortcut = shortcut.trim();
    let digits = shortcut
        .strip_prefix('F')
        .or_else(|| shortcut.strip_prefix('f'))?;
    digits
        .parse::<u8>()
        .ok()
        .filter(|n| (1..=FAVORITE_SLOT_COUNT).contains(n))
}

/// Decodes the menu store's modifier column.
///
/// | code | modifiers       |
/// |------|-----------------|
/// | 0    | none            |
/// | 1    | Alt             |
/// | 2    | Shift           |
/// | 3    | Shift+Alt       |
/// | 4    | primary         |
/// | 5    | primary+Alt     |
/// | 6    | primary+Shift   |
pub fn modifier_from_code(code: i64, platform: Platform) -> Option<Modifiers> {
    let primary = Modifiers::primary(platform);
    let modifiers = match code {
        0 => Modifiers::NONE,
        1 => Modifiers::NONE.with(Modifier::Alt),
        2 => Modifiers::NONE.with(Modifier::Shift),
        3 => Modifiers::NONE.with(Modifier::Shift).with(Modifier::Alt),
        4 => primary,
        5 => primary.with(Modifier::Alt),
        6 => primary.with(Modifier::Shift),
        _ => return None,
    };
    Some(modifiers)
}

/// Human-readable label for a menu command id.
pub fn command_description(command: &str) -> String {
    let known = match command {
        "cut" => "Cut",
        "copy" => "Copy",
        "paste" => "Paste",
        "undo" => "Undo",
        "redo" => "Redo",
        "helponlinehowto" => "Help/Tutorial",
        "subtoolprevioussubtool" => "Previous Sub-tool",
        "subtoolnextsubtool" => "Next Sub-tool",
        "selectinvert" => "Invert Selection",
        other => return title_case(&other.replace('_', " ")),
    };
    known.to_string()
}

pub fn command_icon(command: &str) -> &'static str {
    match command {
        "cut" => "✂️",
        "copy" => "📋",
        "paste" => "📥",
        "undo" => "↶",
        "redo" => "↷",
        "helponlinehowto" => "❓",
        "subtoolprevioussubtool" => "⬅️",
        "subtoolnextsubtool" => "➡️",
        "selectinvert" => "🔄",
        _ => "🔧",
    }
}

/// Icon for a custom sub-tool, chosen from keywords in its name.
pub fn tool_icon(tool_name: &str) -> &'static str {
    let name = tool_name.to_lowercase();
    // "pencil" contains "pen", so it is tested first.
    let rules: [(&str, &'static str); 6] = [
        ("watercolor", "💧"),
        ("airbrush", "🎨"),
        ("brush", "🖌️"),
        ("pencil", "✏️"),
        ("pen", "🖊️"),
        ("eraser", "🧽"),
    ];
    rules
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, icon)| *icon)
        .unwrap_or("🔧")
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(c);
            previous_alpha = false;
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
