//! Foreground application detection and the `app_detected` notifier.
//!
//! Two background tasks share state only through `watch` channels:
//!
//! ```text
//! detector ──watch<Arc<DetectedAppState>>──► notifier ──watch<Option<Arc<ServerMessage>>>──► sessions
//!     │                                   └──► action router
//!     └─ AppProbe (spawn_blocking each tick)
//! ```
//!
//! The detector publishes a fresh snapshot every tick.  The notifier only
//! rebuilds the notice when the detected application changes, so catalogs
//! are read from disk once per switch rather than once per tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sysinfo::System;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use artremote_core::{AppCatalog, ServerMessage};

use crate::application::app_notices::build_notice;
use crate::application::resolver::ShortcutResolver;
use crate::domain::DetectedAppState;

/// What one probe pass observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSnapshot {
    pub window_title: Option<String>,
    pub process_names: Vec<String>,
}

/// Source of foreground-window and process information.
pub trait AppProbe: Send {
    fn snapshot(&mut self) -> ProbeSnapshot;
}

/// [`AppProbe`] over the real system.
///
/// The foreground window title is only available on Windows; elsewhere
/// detection relies on the process list alone.
pub struct SystemProbe {
    system: System,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl AppProbe for SystemProbe {
    fn snapshot(&mut self) -> ProbeSnapshot {
        self.system.refresh_processes();
        let process_names = self
            .system
            .processes()
            .values()
            .map(|p| p.name().to_string())
            .collect();
        ProbeSnapshot {
            window_title: foreground_window_title(),
            process_names,
        }
    }
}

#[cfg(target_os = "windows")]
fn foreground_window_title() -> Option<String> {
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

    // SAFETY: both calls only read window-manager state; the buffer outlives the call.
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0.is_null() {
            return None;
        }
        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buf);
        if len <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buf[..len as usize]))
    }
}

#[cfg(not(target_os = "windows"))]
fn foreground_window_title() -> Option<String> {
    None
}

/// Starts the detection loop.
///
/// Publishes a new [`DetectedAppState`] every `interval` until `running` is
/// cleared or every receiver is gone.
pub fn spawn_detector(
    probe: Box<dyn AppProbe>,
    catalog: Arc<AppCatalog>,
    interval: Duration,
    state_tx: watch::Sender<Arc<DetectedAppState>>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut probe = probe;

        while running.load(Ordering::Relaxed) {
            ticker.tick().await;

            // Process enumeration blocks; keep it off the async workers.
            let pass = tokio::task::spawn_blocking(move || {
                let snapshot = probe.snapshot();
                (probe, snapshot)
            })
            .await;
            let snapshot = match pass {
                Ok((returned, snapshot)) => {
                    probe = returned;
                    snapshot
                }
                Err(e) => {
                    warn!("application probe failed, detector stopping: {e}");
                    break;
                }
            };

            let app = catalog.identify(
                snapshot.window_title.as_deref(),
                snapshot.process_names.iter().map(String::as_str),
            );
            let previous = state_tx.borrow().app_id;
            if previous != app {
                info!(
                    "detected application: {}",
                    app.map(|a| a.display_name()).unwrap_or("none")
                );
            }
            state_tx.send_replace(Arc::new(DetectedAppState::new(app)));

            if state_tx.is_closed() {
                debug!("no detection subscribers left");
                break;
            }
        }
        debug!("detector stopped");
    })
}

/// Starts the notifier that turns application switches into `app_detected`
/// notices.
///
/// The current notice is published immediately, then again on every change
/// of detected application.  The task ends when the detector stops.
pub fn spawn_notifier(
    mut state_rx: watch::Receiver<Arc<DetectedAppState>>,
    catalog: Arc<AppCatalog>,
    resolver: Arc<ShortcutResolver>,
    notice_tx: watch::Sender<Option<Arc<ServerMessage>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut current = state_rx.borrow_and_update().app_id;
        loop {
            let notice = build_notice(current, &catalog, &resolver).await;
            notice_tx.send_replace(Some(Arc::new(ServerMessage::app_detected(notice))));

            // Wait for a snapshot naming a different application.
            let next = loop {
                if state_rx.changed().await.is_err() {
                    debug!("notifier stopped");
                    return;
                }
                let app = state_rx.borrow_and_update().app_id;
                if app != current {
                    break app;
                }
            };
            current = next;
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::resolver::{
        MockFavoritesSource, MockPresetSource, MockShortcutInstaller,
    };
    use crate::application::favorites::CspShortcutRows;
    use artremote_core::protocol::ServerEvent;
    use artremote_core::{AppId, Platform};
    use std::sync::Mutex;

    /// Replays a script of snapshots, repeating the last one.
    struct ScriptedProbe {
        script: Arc<Mutex<Vec<ProbeSnapshot>>>,
    }

    impl AppProbe for ScriptedProbe {
        fn snapshot(&mut self) -> ProbeSnapshot {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script.first().cloned().unwrap_or_default()
            }
        }
    }

    fn processes(names: &[&str]) -> ProbeSnapshot {
        ProbeSnapshot {
            window_title: None,
            process_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn resolver() -> Arc<ShortcutResolver> {
        let mut favorites = MockFavoritesSource::new();
        favorites
            .expect_load()
            .returning(|| Ok(CspShortcutRows::default()));
        let mut presets = MockPresetSource::new();
        presets.expect_scan().returning(|| Ok(Vec::new()));
        let mut installer = MockShortcutInstaller::new();
        installer.expect_installed().returning(|| Ok(Vec::new()));
        Arc::new(ShortcutResolver::new(
            Arc::new(favorites),
            Arc::new(presets),
            Arc::new(installer),
            Platform::Windows,
        ))
    }

    #[tokio::test]
    async fn test_detector_publishes_identified_app() {
        // Arrange
        let catalog = Arc::new(AppCatalog::for_platform(Platform::Windows));
        let probe = ScriptedProbe {
            script: Arc::new(Mutex::new(vec![processes(&["explorer.exe", "krita.exe"])])),
        };
        let (tx, mut rx) = watch::channel(Arc::new(DetectedAppState::undetected()));
        let running = Arc::new(AtomicBool::new(true));

        // Act
        let task = spawn_detector(
            Box::new(probe),
            catalog,
            Duration::from_millis(10),
            tx,
            Arc::clone(&running),
        );
        let found = tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.app_id == Some(AppId::Krita)),
        )
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

        // Assert
        assert!(found, "detector never reported Krita");
        running.store(false, Ordering::Relaxed);
        drop(rx);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_detector_reports_switch_away() {
        let catalog = Arc::new(AppCatalog::for_platform(Platform::Windows));
        let probe = ScriptedProbe {
            script: Arc::new(Mutex::new(vec![
                processes(&["CLIPStudioPaint.exe"]),
                processes(&["notepad.exe"]),
            ])),
        };
        let (tx, mut rx) = watch::channel(Arc::new(DetectedAppState::undetected()));
        let running = Arc::new(AtomicBool::new(true));

        let _task = spawn_detector(
            Box::new(probe),
            catalog,
            Duration::from_millis(10),
            tx,
            Arc::clone(&running),
        );

        tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.app_id == Some(AppId::ClipStudioPaint)),
        )
        .await
        .unwrap()
        .unwrap();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.app_id.is_none()))
            .await
            .unwrap()
            .unwrap();
        running.store(false, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn test_notifier_publishes_initial_and_changed_notices() {
        // Arrange
        let catalog = Arc::new(AppCatalog::for_platform(Platform::Windows));
        let (state_tx, state_rx) = watch::channel(Arc::new(DetectedAppState::undetected()));
        let (notice_tx, mut notice_rx) = watch::channel(None);

        // Act
        let task = spawn_notifier(state_rx, catalog, resolver(), notice_tx);
        notice_rx.changed().await.unwrap();
        let initial = notice_rx.borrow_and_update().clone().unwrap();

        state_tx.send_replace(Arc::new(DetectedAppState::new(Some(AppId::ClipStudioPaint))));
        notice_rx.changed().await.unwrap();
        let switched = notice_rx.borrow_and_update().clone().unwrap();

        drop(state_tx);
        task.await.unwrap();

        // Assert
        let app_of = |msg: &ServerMessage| match msg {
            ServerMessage::Event(ServerEvent::AppDetected(n)) => n.app.clone(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(app_of(initial.as_ref()), "none");
        assert_eq!(app_of(switched.as_ref()), "clip_studio_paint");
    }

    #[tokio::test]
    async fn test_notifier_ignores_repeated_snapshots_of_same_app() {
        let catalog = Arc::new(AppCatalog::for_platform(Platform::Windows));
        let (state_tx, state_rx) =
            watch::channel(Arc::new(DetectedAppState::new(Some(AppId::Krita))));
        let (notice_tx, mut notice_rx) = watch::channel(None);

        let task = spawn_notifier(state_rx, catalog, resolver(), notice_tx);
        notice_rx.changed().await.unwrap();
        drop(notice_rx.borrow_and_update());

        state_tx.send_replace(Arc::new(DetectedAppState::new(Some(AppId::Krita))));
        state_tx.send_replace(Arc::new(DetectedAppState::new(Some(AppId::Krita))));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!notice_rx.has_changed().unwrap());
        drop(state_tx);
        task.await.unwrap();
    }
}
