//! Companion-side domain types: runtime configuration, the pairing credential
//! and the detected-application snapshot.

pub mod config;
pub mod credential;
pub mod detected_app;

pub use config::{AuthPolicy, CompanionConfig};
pub use credential::Credential;
pub use detected_app::DetectedAppState;
