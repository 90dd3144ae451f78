//! Pure domain types: host platform, application profiles, actions, favorites and presets.

pub mod action;
pub mod app_profile;
pub mod favorites;
pub mod platform;
pub mod presets;
