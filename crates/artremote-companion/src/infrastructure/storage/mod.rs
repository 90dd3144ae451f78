//! Storage infrastructure: the TOML settings file.
//!
//! Reads the settings from the platform config directory, falls back to
//! defaults on first run, and writes them back when asked to.

pub mod config;
