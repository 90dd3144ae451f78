//! Clip Studio Paint favorite slots (F1–F12).
//!
//! The companion never writes these; they are read from the application's
//! own shortcut store and shown on the control surface.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::keymap::KeyCombo;

/// Number of function-key favorites.
pub const FAVORITE_SLOT_COUNT: u8 = 12;

/// Icon shown for a slot with nothing assigned.
pub const UNASSIGNED_ICON: &str = "➕";

/// One function-key slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteSlot {
    /// 1-based slot number; slot `n` is triggered by `F{n}`.
    #[serde(skip)]
    pub index: u8,
    pub assigned: bool,
    pub icon: String,
    pub description: String,
    pub command: Option<String>,
    pub key_combination: Option<KeyCombo>,
}

impl FavoriteSlot {
    pub fn unassigned(index: u8) -> Self {
        Self {
            index,
            assigned: false,
            icon: UNASSIGNED_ICON.to_string(),
            description: format!("Available F{index}"),
            command: None,
            key_combination: None,
        }
    }

    /// Wire label of the slot (`"F5"`).
    pub fn label(&self) -> String {
        format!("F{}", self.index)
    }
}

/// Exactly twelve slots, ordered F1..F12.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteCatalog {
    slots: Vec<FavoriteSlot>,
}

impl FavoriteCatalog {
    /// A catalog with every slot unassigned.
    pub fn unassigned() -> Self {
        Self {
            slots: (1..=FAVORITE_SLOT_COUNT).map(FavoriteSlot::unassigned).collect(),
        }
    }

    /// Builds a catalog from assigned slots.
    ///
    /// Slots outside `1..=12` are ignored; a later slot with the same index
    /// replaces an earlier one.  Missing indices are unassigned.
    pub fn from_slots<I>(slots: I) -> Self
    where
        I: IntoIterator<Item = FavoriteSlot>,
    {
        let mut catalog = Self::unassigned();
        for slot in slots {
            if (1..=FAVORITE_SLOT_COUNT).contains(&slot.index) {
                let pos = usize::from(slot.index - 1);
                catalog.slots[pos] = slot;
            }
        }
        catalog
    }

    /// Returns slot `index` (1-based).
    pub fn slot(&self, index: u8) -> Option<&FavoriteSlot> {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(usize::from(i)))
    }

    pub fn slots(&self) -> &[FavoriteSlot] {
        &self.slots
    }

    pub fn assigned_count(&self) -> usize {
        self.slots.iter().filter(|s| s.assigned).count()
    }
}

impl Default for FavoriteCatalog {
    fn default() -> Self {
        Self::unassigned()
    }
}

/// Serializes as an object keyed `"F1"`..`"F12"` in slot order.
impl Serialize for FavoriteCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for slot in &self.slots {
            map.serialize_entry(&slot.label(), slot)?;
        }
        map.end()
    }
}
