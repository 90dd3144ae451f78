//! Krita integration: the preset catalog and the generated shortcut range.

pub mod presets;
pub mod shortcuts_file;

pub use presets::KritaPresetScanner;
pub use shortcuts_file::KritaShortcutFile;
