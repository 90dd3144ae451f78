//! ArtRemote companion library crate.
//!
//! The companion runs on the artist's computer.  A control surface (a phone
//! or tablet) connects over WebSocket, authenticates with the pairing token
//! or PIN, and sends actions; the companion turns them into keystrokes for
//! whichever painting application is in front.
//!
//! # Architecture
//!
//! ```text
//! control surface (JSON over WebSocket)
//!         ↕
//! [artremote-companion]
//!   ├── domain/           runtime config, pairing credential, detected app
//!   ├── application/      auth gate, action router, injection queue,
//!   │                     shortcut resolver, preset allocator
//!   └── infrastructure/
//!         ├── ws_server         accept loop + sessions (tokio-tungstenite)
//!         ├── input_injection   SendInput / XTest / CoreGraphics
//!         ├── app_detector      foreground app polling (sysinfo)
//!         ├── csp_store         Clip Studio Paint databases (rusqlite)
//!         ├── krita/            preset catalog + kritashortcutsrc
//!         ├── credential_store  ~/.artremote/auth.json
//!         └── storage/          TOML settings
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `artremote-core`; OS and file
//!   access reach it only through traits.
//! - `infrastructure` implements those traits and owns all I/O.

/// Domain layer: configuration, credential and detection snapshot types.
pub mod domain;

/// Application layer: session authentication, routing and shortcut logic.
pub mod application;

/// Infrastructure layer: network server, OS input, application files.
pub mod infrastructure;
