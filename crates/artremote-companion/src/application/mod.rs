//! Application layer: the companion's use cases.
//!
//! - **`auth_gate`** – per-session authentication state machine.  Pure and
//!   synchronous; the WebSocket session drives it.
//! - **`action_router`** – decodes authenticated requests and turns them into
//!   injection jobs or data replies.
//! - **`injection`** – the `InputInjector` trait and the single-threaded queue
//!   every injection goes through.
//! - **`resolver`** – Clip Studio Paint favorites and Krita preset shortcuts,
//!   behind source traits the infrastructure layer implements.
//! - **`favorites`** / **`preset_allocator`** – the pure halves of the
//!   resolver: decoding store rows and allocating preset shortcuts.
//! - **`app_notices`** – builds the `app_detected` notice.
//!
//! Nothing here touches the OS, the network or the file system directly.

pub mod action_router;
pub mod app_notices;
pub mod auth_gate;
pub mod favorites;
pub mod injection;
pub mod preset_allocator;
pub mod resolver;
