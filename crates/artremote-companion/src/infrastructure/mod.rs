//! Infrastructure layer for the companion.
//!
//! Everything that touches the OS, the network or another program's files:
//!
//! - **`ws_server`** – WebSocket accept loop and per-session tasks.
//! - **`input_injection`** – OS-specific [`InputInjector`] backends, chosen
//!   at compile time, plus a recording mock for tests.
//! - **`app_detector`** – foreground application polling and the
//!   `app_detected` notifier.
//! - **`csp_store`** – read-only Clip Studio Paint shortcut databases.
//! - **`krita`** – Krita preset scanning and the managed shortcut range.
//! - **`credential_store`** – `auth.json` persistence.
//! - **`storage`** – the TOML settings file.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `artremote_core`, but is never imported by them.
//!
//! [`InputInjector`]: crate::application::injection::InputInjector

pub mod app_detector;
pub mod credential_store;
pub mod csp_store;
pub mod input_injection;
pub mod krita;
pub mod storage;
pub mod ws_server;

pub use ws_server::{run_server, serve, ServerContext};
