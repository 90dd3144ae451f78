//! Target application profiles.
//!
//! A profile describes how to recognise one art application on screen and
//! which key combination performs each logical action in it.  The catalog is
//! built once per host platform; the `primary` modifier in the tables below
//! becomes Command on macOS.
//!
//! | logical name      | Krita            | Clip Studio Paint  | fallback        |
//! |-------------------|------------------|--------------------|-----------------|
//! | `undo`            | primary+z        | primary+z          | primary+z       |
//! | `redo`            | primary+shift+z  | primary+y          | primary+shift+z |
//! | `zoom_in`         | primary+=        | primary+=          | primary+=       |
//! | `rotate_right`    | primary+]        | `^`                | -               |
//! | `brush_size_up`   | ]                | ]                  | ]               |
//!
//! (abridged; see the tables at the bottom of this file)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::platform::Platform;
use crate::keymap::KeyCombo;

/// The applications the companion knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppId {
    Krita,
    ClipStudioPaint,
}

impl AppId {
    /// Identifier used on the wire (`"krita"`, `"clip_studio_paint"`).
    pub fn as_str(self) -> &'static str {
        match self {
            AppId::Krita => "krita",
            AppId::ClipStudioPaint => "clip_studio_paint",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AppId::Krita => "Krita",
            AppId::ClipStudioPaint => "Clip Studio Paint",
        }
    }

    /// Clip Studio Paint exposes the user's F1–F12 favorites.
    pub fn has_favorites(self) -> bool {
        self == AppId::ClipStudioPaint
    }

    /// Krita exposes brush presets that get generated shortcuts.
    pub fn has_presets(self) -> bool {
        self == AppId::Krita
    }
}

/// Tool families that can be selected by a single shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Brush,
    Pen,
    Pencil,
    Airbrush,
    Decoration,
    Blend,
    Liquify,
    Eraser,
    Select,
    Pan,
}

impl ToolKind {
    /// Parses a tool name as sent by the control surface (case-insensitive).
    pub fn from_name(name: &str) -> Option<ToolKind> {
        let tool = match name.trim().to_ascii_lowercase().as_str() {
            "brush" | "paint" | "watercolor" => ToolKind::Brush,
            "pen" | "ink" | "marker" => ToolKind::Pen,
            "pencil" => ToolKind::Pencil,
            "airbrush" | "spray" => ToolKind::Airbrush,
            "decoration" => ToolKind::Decoration,
            "blend" | "smudge" => ToolKind::Blend,
            "liquify" => ToolKind::Liquify,
            "eraser" => ToolKind::Eraser,
            "select" | "selection" => ToolKind::Select,
            "pan" | "hand" | "move" => ToolKind::Pan,
            _ => return None,
        };
        Some(tool)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Brush => "brush",
            ToolKind::Pen => "pen",
            ToolKind::Pencil => "pencil",
            ToolKind::Airbrush => "airbrush",
            ToolKind::Decoration => "decoration",
            ToolKind::Blend => "blend",
            ToolKind::Liquify => "liquify",
            ToolKind::Eraser => "eraser",
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
        }
    }

    /// Key of this tool in a profile's shortcut table (`tool_brush`).
    pub fn shortcut_name(self) -> String {
        format!("tool_{}", self.as_str())
    }
}

/// Recognition rules and shortcut table for one application.
#[derive(Debug, Clone)]
pub struct AppProfile {
    /// `None` for the fallback profile used when nothing is detected.
    pub id: Option<AppId>,
    pub display_name: String,
    /// Executable names, compared case-insensitively without a `.exe` suffix.
    pub process_identifiers: Vec<String>,
    /// Lowercase substrings of the foreground window title.
    pub window_title_keywords: Vec<String>,
    pub supported_tools: Vec<ToolKind>,
    shortcut_table: HashMap<String, KeyCombo>,
}

impl AppProfile {
    fn build(
        id: Option<AppId>,
        display_name: &str,
        process_identifiers: &[&str],
        window_title_keywords: &[&str],
        supported_tools: &[ToolKind],
        table: &[(&str, &str)],
        platform: Platform,
    ) -> Self {
        let mut shortcut_table = HashMap::with_capacity(table.len());
        for (name, combo) in table {
            match KeyCombo::parse(combo, platform) {
                Ok(parsed) => {
                    shortcut_table.insert((*name).to_string(), parsed);
                }
                Err(e) => warn!("skipping shortcut {name} for {display_name}: {e}"),
            }
        }
        Self {
            id,
            display_name: display_name.to_string(),
            process_identifiers: process_identifiers.iter().map(|s| s.to_string()).collect(),
            window_title_keywords: window_title_keywords.iter().map(|s| s.to_string()).collect(),
            supported_tools: supported_tools.to_vec(),
            shortcut_table,
        }
    }

    /// Looks up the combo for a logical action name such as `"undo"` or `"tool_pen"`.
    pub fn shortcut(&self, name: &str) -> Option<KeyCombo> {
        self.shortcut_table.get(name).copied()
    }

    /// Number of logical actions this profile maps.
    pub fn shortcut_count(&self) -> usize {
        self.shortcut_table.len()
    }

    /// Returns `true` if the window title contains one of the profile's keywords.
    pub fn matches_title(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.window_title_keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()))
    }

    /// Returns `true` if `process_name` is one of the profile's executables.
    pub fn matches_process(&self, process_name: &str) -> bool {
        let candidate = normalize_process_name(process_name);
        self.process_identifiers
            .iter()
            .any(|id| normalize_process_name(id) == candidate)
    }
}

fn normalize_process_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// All known profiles for one host platform, plus the fallback.
#[derive(Debug, Clone)]
pub struct AppCatalog {
    platform: Platform,
    profiles: Vec<AppProfile>,
    fallback: AppProfile,
}

impl AppCatalog {
    pub fn for_platform(platform: Platform) -> Self {
        let profiles = vec![
            AppProfile::build(
                Some(AppId::Krita),
                AppId::Krita.display_name(),
                KRITA_PROCESSES,
                &["krita"],
                KRITA_TOOLS,
                KRITA_SHORTCUTS,
                platform,
            ),
            AppProfile::build(
                Some(AppId::ClipStudioPaint),
                AppId::ClipStudioPaint.display_name(),
                CSP_PROCESSES,
                &["clip studio", "clipstudio"],
                CSP_TOOLS,
                CSP_SHORTCUTS,
                platform,
            ),
        ];
        let fallback = AppProfile::build(
            None,
            "Generic",
            &[],
            &[],
            FALLBACK_TOOLS,
            FALLBACK_SHORTCUTS,
            platform,
        );
        Self {
            platform,
            profiles,
            fallback,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The profile for `app`, or the fallback profile when `app` is `None`.
    pub fn profile(&self, app: Option<AppId>) -> &AppProfile {
        app.and_then(|id| self.profiles.iter().find(|p| p.id == Some(id)))
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &AppProfile {
        &self.fallback
    }

    /// Application profiles, excluding the fallback.
    pub fn profiles(&self) -> &[AppProfile] {
        &self.profiles
    }

    /// Identifies the active application.
    ///
    /// The foreground window title wins; only when it matches nothing are the
    /// running process names consulted.
    pub fn identify<'a, I>(&self, window_title: Option<&str>, process_names: I) -> Option<AppId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(title) = window_title.filter(|t| !t.trim().is_empty()) {
            if let Some(profile) = self.profiles.iter().find(|p| p.matches_title(title)) {
                return profile.id;
            }
        }

        for name in process_names {
            if let Some(profile) = self.profiles.iter().find(|p| p.matches_process(name)) {
                return profile.id;
            }
        }
        None
    }
}

// ── Tables ───────────────────────────────────────────────────────────────────

const KRITA_PROCESSES: &[&str] = &["krita.exe", "krita", "Krita"];

const CSP_PROCESSES: &[&str] = &[
    "CLIPStudioPaint.exe",
    "CLIPStudio.exe",
    "CLIP STUDIO PAINT",
    "ClipStudioPaint",
];

const KRITA_TOOLS: &[ToolKind] = &[
    ToolKind::Brush,
    ToolKind::Pencil,
    ToolKind::Airbrush,
    ToolKind::Eraser,
    ToolKind::Select,
    ToolKind::Pan,
];

const CSP_TOOLS: &[ToolKind] = &[
    ToolKind::Pen,
    ToolKind::Pencil,
    ToolKind::Brush,
    ToolKind::Airbrush,
    ToolKind::Decoration,
    ToolKind::Eraser,
    ToolKind::Blend,
    ToolKind::Liquify,
    ToolKind::Select,
    ToolKind::Pan,
];

const FALLBACK_TOOLS: &[ToolKind] = &[ToolKind::Brush, ToolKind::Eraser];

const KRITA_SHORTCUTS: &[(&str, &str)] = &[
    ("undo", "primary+z"),
    ("redo", "primary+shift+z"),
    ("zoom_in", "primary+="),
    ("zoom_out", "primary+-"),
    ("rotate_left", "primary+["),
    ("rotate_right", "primary+]"),
    ("reset_canvas", "5"),
    ("tool_brush", "b"),
    ("tool_pencil", "n"),
    ("tool_airbrush", "a"),
    ("tool_eraser", "e"),
    ("tool_pan", "space"),
    ("tool_select", "r"),
    ("layer_new", "primary+shift+n"),
    ("layer_delete", "delete"),
    ("layer_duplicate", "primary+j"),
    ("layer_folder", "primary+g"),
    ("layer_merge", "primary+e"),
    ("layer_up", "pageup"),
    ("layer_down", "pagedown"),
    ("brush_size_up", "]"),
    ("brush_size_down", "["),
];

const CSP_SHORTCUTS: &[(&str, &str)] = &[
    ("undo", "primary+z"),
    ("redo", "primary+y"),
    ("zoom_in", "primary+="),
    ("zoom_out", "primary+-"),
    ("rotate_left", "-"),
    ("rotate_right", "^"),
    ("reset_canvas", "primary+0"),
    ("tool_brush", "b"),
    ("tool_pen", "p"),
    ("tool_pencil", "c"),
    ("tool_airbrush", "a"),
    ("tool_decoration", "d"),
    ("tool_blend", "j"),
    ("tool_liquify", "q"),
    ("tool_eraser", "e"),
    ("tool_pan", "h"),
    ("tool_select", "m"),
    ("layer_new", "primary+shift+n"),
    ("layer_delete", "delete"),
    ("layer_folder", "primary+g"),
    ("layer_merge", "primary+e"),
    ("layer_up", "alt+]"),
    ("layer_down", "alt+["),
    ("brush_size_up", "]"),
    ("brush_size_down", "["),
];

const FALLBACK_SHORTCUTS: &[(&str, &str)] = &[
    ("undo", "primary+z"),
    ("redo", "primary+shift+z"),
    ("zoom_in", "primary+="),
    ("zoom_out", "primary+-"),
    ("tool_brush", "b"),
    ("tool_eraser", "e"),
    ("brush_size_up", "]"),
    ("brush_size_down", "["),
];
