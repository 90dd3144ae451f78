//! Platform-specific input injection.
//!
//! The backend is selected at compile time via `#[cfg(target_os = ...)]` and
//! constructed once at startup by [`platform_injector`].

use artremote_core::Direction;
use tracing::{info, warn};

use crate::application::injection::{InjectedKey, InjectionError, InputInjector};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

/// Stand-in used when the platform backend cannot start.
///
/// The server still runs (clients can authenticate and query catalogs) but
/// every injection fails with the startup error.
pub struct UnavailableInjector {
    reason: InjectionError,
}

impl UnavailableInjector {
    pub fn new(reason: InjectionError) -> Self {
        Self { reason }
    }
}

impl InputInjector for UnavailableInjector {
    fn emit_key(&self, _key: InjectedKey, _pressed: bool) -> Result<(), InjectionError> {
        Err(self.reason.clone())
    }

    fn emit_scroll(&self, _direction: Direction, _amount: u32) -> Result<(), InjectionError> {
        Err(self.reason.clone())
    }

    fn emit_pointer_delta(&self, _dx: i32, _dy: i32) -> Result<(), InjectionError> {
        Err(self.reason.clone())
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Builds the injector for the running OS.
pub fn platform_injector() -> Box<dyn InputInjector> {
    let result: Result<Box<dyn InputInjector>, InjectionError> = {
        #[cfg(target_os = "windows")]
        {
            Ok(Box::new(windows::WindowsInjector::new()))
        }
        #[cfg(target_os = "linux")]
        {
            linux::LinuxXTestInjector::new().map(|i| Box::new(i) as Box<dyn InputInjector>)
        }
        #[cfg(target_os = "macos")]
        {
            macos::MacosInjector::new().map(|i| Box::new(i) as Box<dyn InputInjector>)
        }
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        {
            Err(InjectionError::Unavailable(
                "no input backend for this operating system".to_string(),
            ))
        }
    };

    match result {
        Ok(injector) => {
            info!("input injection backend: {}", injector.name());
            injector
        }
        Err(e) => {
            warn!("input injection disabled: {e}");
            Box::new(UnavailableInjector::new(e))
        }
    }
}
