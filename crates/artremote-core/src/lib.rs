//! # artremote-core
//!
//! Shared library for the ArtRemote companion containing the wire protocol,
//! the action vocabulary, the target-application profiles and the key code
//! translation tables.
//!
//! It has no dependencies on OS APIs, databases or network sockets; those
//! live in `artremote-companion`.
//!
//! # Architecture overview
//!
//! ArtRemote turns a phone or tablet into a shortcut pad for digital painting
//! applications.  The control surface sends small JSON commands ("undo",
//! "zoom in", "select favorite F5") over a WebSocket; the companion running
//! next to the painting application turns each command into the keystroke
//! that application expects.
//!
//! - **`protocol`**: the JSON frames exchanged over the WebSocket.
//!
//! - **`domain`**: the closed [`Action`] vocabulary, the [`AppCatalog`] of
//!   known applications with their shortcut tables, Clip Studio Paint
//!   favorite slots and Krita brush presets.
//!
//! - **`keymap`**: [`KeyCombo`] parsing and the per-OS tables that turn a
//!   [`KeyCode`] into a Windows Virtual-Key, an X11 KeySym or a macOS CGKeyCode.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::action::{Action, ActionRequest, Direction, LayerOp, RotateDirection, ZoomDirection};
pub use domain::app_profile::{AppCatalog, AppId, AppProfile, ToolKind};
pub use domain::favorites::{FavoriteCatalog, FavoriteSlot, FAVORITE_SLOT_COUNT};
pub use domain::platform::Platform;
pub use domain::presets::{ManagedShortcut, PresetCategory, PresetEntry};
pub use keymap::{KeyCode, KeyCombo, KeyComboError, KeyMapper, Modifier, Modifiers};
pub use protocol::messages::{ClientMessage, ServerMessage};
pub use protocol::ProtocolError;
