//! ActionRouter: turns authenticated action requests into injected input or
//! data replies.
//!
//! Every request is decoded into a closed [`Action`].  Queries are answered
//! from the [`ShortcutResolver`]; everything else becomes a list of
//! [`InjectionStep`]s, planned against the profile of the application the
//! detector last saw, and submitted to the single injection queue.
//!
//! Profile lookups go through [`AppCatalog::profile`], which falls back to the
//! generic profile, so `undo` still works when nothing is detected.
//!
//! Errors never close the session: [`ActionRouter::route`] always returns a
//! frame, either the data reply, an `{"status":"received"}` ack, or an
//! `{"action":"error"}` built from the [`RouteError`] text.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use artremote_core::domain::action::{LAYER_GOTO_FIRST_STEPS, MAX_BRUSH_SIZE_STEPS};
use artremote_core::protocol::ActionReply;
use artremote_core::{
    Action, ActionRequest, AppCatalog, AppProfile, KeyCombo, KeyComboError, LayerOp, Platform,
    ProtocolError, RotateDirection, ServerMessage, ZoomDirection,
};

use super::injection::{InjectionError, InjectionHandle, InjectionStep};
use super::resolver::{ResolverError, ShortcutResolver};
use crate::domain::detected_app::DetectedAppState;

/// Pause between repeated `layer_down` presses for `goto_first`.
pub const LAYER_STEP_PAUSE: Duration = Duration::from_millis(50);

/// Why an action could not be carried out.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("{app} has no shortcut for {action}")]
    NoShortcut { app: String, action: String },

    #[error("invalid key combination \"{text}\": {source}")]
    InvalidCombo {
        text: String,
        #[source]
        source: KeyComboError,
    },

    #[error("favorite F{0} is not assigned")]
    FavoriteUnassigned(u8),

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("preset \"{0}\" has no installed shortcut; install preset shortcuts and restart Krita")]
    PresetNotInstalled(String),

    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

/// Dispatches decoded actions for every session.
///
/// Cheap to share: sessions hold it behind an `Arc`.
pub struct ActionRouter {
    catalog: Arc<AppCatalog>,
    injector: InjectionHandle,
    resolver: Arc<ShortcutResolver>,
    detected: watch::Receiver<Arc<DetectedAppState>>,
}

impl ActionRouter {
    pub fn new(
        catalog: Arc<AppCatalog>,
        injector: InjectionHandle,
        resolver: Arc<ShortcutResolver>,
        detected: watch::Receiver<Arc<DetectedAppState>>,
    ) -> Self {
        Self {
            catalog,
            injector,
            resolver,
            detected,
        }
    }

    /// Handles one request and returns the frame to send back.
    pub async fn route(&self, request: &ActionRequest) -> ServerMessage {
        match self.dispatch(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("action {} failed: {e}", request.action);
                ServerMessage::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, request: &ActionRequest) -> Result<ServerMessage, RouteError> {
        let action = request.decode()?;
        // Snapshot only; never held across an await.
        let app = self.detected.borrow().app_id;
        debug!("dispatch {} as {action:?} (app: {app:?})", request.action);

        let steps = match action {
            Action::GetFavorites => {
                let favorites = self.resolver.favorites().await;
                return Ok(ServerMessage::Reply(ActionReply::FavoritesData {
                    total_assigned: favorites.assigned_count(),
                    favorites,
                }));
            }
            Action::GetPresets => {
                let presets = self.resolver.presets().await;
                return Ok(ServerMessage::Reply(ActionReply::PresetsData {
                    total: presets.len(),
                    presets,
                }));
            }
            Action::InstallPresetShortcuts => {
                let report = self.resolver.generate_and_install().await?;
                return Ok(ServerMessage::Reply(ActionReply::PresetsInstalled {
                    installed: report.installed,
                    failed: report.failed,
                    restart_required: report.restart_required,
                }));
            }
            Action::SelectFavorite(slot) => {
                let favorites = self.resolver.favorites().await;
                let combo = favorites
                    .slot(slot)
                    .filter(|s| s.assigned)
                    .and_then(|s| s.key_combination)
                    .ok_or(RouteError::FavoriteUnassigned(slot))?;
                vec![InjectionStep::KeyCombo(combo)]
            }
            Action::SelectPreset(name) => {
                let presets = self.resolver.presets().await;
                let preset = presets
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(&name))
                    .ok_or_else(|| RouteError::PresetNotFound(name.clone()))?;
                let combo = preset
                    .assigned_shortcut
                    .ok_or_else(|| RouteError::PresetNotInstalled(preset.name.clone()))?;
                vec![InjectionStep::KeyCombo(combo)]
            }
            Action::Unrecognized(name) => return Err(RouteError::UnknownAction(name)),
            other => plan_steps(&other, self.catalog.profile(app), self.catalog.platform())?,
        };

        self.injector.submit(steps).await?;
        Ok(ServerMessage::received(request.action.clone()))
    }
}

/// Plans the injection steps for a profile-resolved action.
///
/// Queries, favorites and presets need the resolver and are handled by the
/// router; passing one here is an [`RouteError::UnknownAction`].
pub fn plan_steps(
    action: &Action,
    profile: &AppProfile,
    platform: Platform,
) -> Result<Vec<InjectionStep>, RouteError> {
    let shortcut = |name: &str| -> Result<InjectionStep, RouteError> {
        profile
            .shortcut(name)
            .map(InjectionStep::KeyCombo)
            .ok_or_else(|| RouteError::NoShortcut {
                app: profile.display_name.clone(),
                action: name.to_string(),
            })
    };

    let steps = match action {
        Action::Zoom(ZoomDirection::In) => vec![shortcut("zoom_in")?],
        Action::Zoom(ZoomDirection::Out) => vec![shortcut("zoom_out")?],
        Action::Rotate(RotateDirection::Left) => vec![shortcut("rotate_left")?],
        Action::Rotate(RotateDirection::Right) => vec![shortcut("rotate_right")?],
        Action::ResetCanvas => vec![shortcut("reset_canvas")?],
        Action::Undo => vec![shortcut("undo")?],
        Action::Redo => vec![shortcut("redo")?],
        Action::Tool(tool) => vec![shortcut(&tool.shortcut_name())?],
        Action::Layer(LayerOp::GotoFirst) => {
            let down = shortcut(LayerOp::GotoFirst.shortcut_name())?;
            let mut steps = Vec::with_capacity(LAYER_GOTO_FIRST_STEPS as usize * 2);
            for i in 0..LAYER_GOTO_FIRST_STEPS {
                if i > 0 {
                    steps.push(InjectionStep::Pause(LAYER_STEP_PAUSE));
                }
                steps.push(down.clone());
            }
            steps
        }
        Action::Layer(op) => vec![shortcut(op.shortcut_name())?],
        Action::BrushSize(delta) => {
            let name = if *delta >= 0 { "brush_size_up" } else { "brush_size_down" };
            let repeats = delta.unsigned_abs().min(MAX_BRUSH_SIZE_STEPS) as usize;
            if repeats == 0 {
                Vec::new()
            } else {
                vec![shortcut(name)?; repeats]
            }
        }
        Action::KeyCombo(text) => {
            let combo = KeyCombo::parse(text, platform).map_err(|source| RouteError::InvalidCombo {
                text: text.clone(),
                source,
            })?;
            vec![InjectionStep::KeyCombo(combo)]
        }
        Action::Scroll { direction, amount } => vec![InjectionStep::Scroll {
            direction: *direction,
            amount: *amount,
        }],
        Action::PointerDelta { dx, dy } => vec![InjectionStep::PointerDelta { dx: *dx, dy: *dy }],
        Action::CanvasPan {
            direction,
            distance,
        } => {
            let (ux, uy) = direction.unit_vector();
            let mut steps = Vec::with_capacity(2);
            // Profiles without a pan tool just move the pointer.
            if let Some(pan) = profile.shortcut("tool_pan") {
                steps.push(InjectionStep::KeyCombo(pan));
            }
            steps.push(InjectionStep::PointerDelta {
                dx: ux.saturating_mul(*distance),
                dy: uy.saturating_mul(*distance),
            });
            steps
        }
        Action::GetFavorites
        | Action::GetPresets
        | Action::InstallPresetShortcuts
        | Action::SelectFavorite(_)
        | Action::SelectPreset(_) => {
            return Err(RouteError::UnknownAction(format!("{action:?}")));
        }
        Action::Unrecognized(name) => return Err(RouteError::UnknownAction(name.clone())),
    };
    Ok(steps)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::favorites::{CspShortcutRows, ToolShortcutRow};
    use crate::application::injection::InjectionQueue;
    use crate::application::resolver::{
        InstallOutcome, MockFavoritesSource, MockPresetSource, MockShortcutInstaller,
    };
    use crate::infrastructure::input_injection::mock::{InjectedEvent, MockInjector};
    use artremote_core::{
        AppId, Direction, KeyCode, ManagedShortcut, Modifier, Modifiers, PresetCategory, PresetEntry,
    };
    use std::path::PathBuf;

    struct Fixture {
        router: ActionRouter,
        mock: MockInjector,
        detected: watch::Sender<Arc<DetectedAppState>>,
    }

    fn default_sources() -> (MockFavoritesSource, MockPresetSource, MockShortcutInstaller) {
        let mut favorites = MockFavoritesSource::new();
        favorites.expect_load().returning(|| {
            Ok(CspShortcutRows {
                menu: Vec::new(),
                tools: vec![ToolShortcutRow {
                    node_name: "G-Pen".to_string(),
                    shortcut_key: 39,
                }],
            })
        });
        let mut presets = MockPresetSource::new();
        presets.expect_scan().returning(|| {
            Ok(vec![
                PresetEntry::new("Ink Fine", PresetCategory::Ink, PathBuf::from("a.kpp")),
                PresetEntry::new("Soft Paint", PresetCategory::Paint, PathBuf::from("b.kpp")),
            ])
        });
        let mut installer = MockShortcutInstaller::new();
        installer.expect_installed().returning(|| {
            Ok(vec![ManagedShortcut {
                action_id: "artremote_preset_ink_fine".to_string(),
                combo: KeyCombo::parse("ctrl+alt+a", Platform::Windows).unwrap(),
                preset: Some("Ink Fine".to_string()),
            }])
        });
        installer.expect_install().returning(|table| {
            Ok(InstallOutcome {
                path: PathBuf::from("kritashortcutsrc"),
                changed: !table.is_empty(),
                backup_created: false,
            })
        });
        (favorites, presets, installer)
    }

    fn fixture(app: Option<AppId>) -> Fixture {
        let mock = MockInjector::new();
        let (handle, _worker) = InjectionQueue::spawn(Box::new(mock.clone()), 16).unwrap();
        let (favorites, presets, installer) = default_sources();
        let resolver = ShortcutResolver::new(
            Arc::new(favorites),
            Arc::new(presets),
            Arc::new(installer),
            Platform::Windows,
        );
        let (detected, rx) = watch::channel(Arc::new(DetectedAppState::new(app)));
        let router = ActionRouter::new(
            Arc::new(AppCatalog::for_platform(Platform::Windows)),
            handle,
            Arc::new(resolver),
            rx,
        );
        Fixture {
            router,
            mock,
            detected,
        }
    }

    fn request(json: &str) -> ActionRequest {
        match artremote_core::ClientMessage::parse(json).unwrap() {
            artremote_core::ClientMessage::Action(req) => req,
            other => panic!("not an action: {other:?}"),
        }
    }

    fn combo(text: &str) -> KeyCombo {
        KeyCombo::parse(text, Platform::Windows).unwrap()
    }

    #[tokio::test]
    async fn test_undo_without_detected_app_injects_default_combo() {
        // Arrange
        let fx = fixture(None);

        // Act
        let reply = fx.router.route(&request(r#"{"action":"undo"}"#)).await;

        // Assert
        assert_eq!(reply, ServerMessage::received("undo"));
        assert_eq!(fx.mock.key_taps(), vec![combo("ctrl+z")]);
    }

    #[tokio::test]
    async fn test_redo_follows_detected_app() {
        // Arrange
        let fx = fixture(Some(AppId::Krita));

        // Act
        fx.router.route(&request(r#"{"action":"redo"}"#)).await;
        fx.detected
            .send(Arc::new(DetectedAppState::new(Some(AppId::ClipStudioPaint))))
            .unwrap();
        fx.router.route(&request(r#"{"action":"redo"}"#)).await;

        // Assert
        assert_eq!(fx.mock.key_taps(), vec![combo("ctrl+shift+z"), combo("ctrl+y")]);
    }

    #[tokio::test]
    async fn test_unknown_action_replies_error() {
        let fx = fixture(None);

        let reply = fx.router.route(&request(r#"{"action":"make_coffee"}"#)).await;

        assert_eq!(reply, ServerMessage::error("Unknown action: make_coffee"));
        assert!(fx.mock.events().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_params_reply_error_without_injecting() {
        let fx = fixture(None);

        let reply = fx
            .router
            .route(&request(r#"{"action":"zoom","value":{"direction":"sideways"}}"#))
            .await;

        assert!(matches!(reply, ServerMessage::Reply(ActionReply::Error { .. })));
        assert!(fx.mock.events().is_empty());
    }

    #[tokio::test]
    async fn test_missing_profile_shortcut_replies_error() {
        // The generic profile has no layer shortcuts.
        let fx = fixture(None);

        let reply = fx.router.route(&request(r#"{"action":"layer_new"}"#)).await;

        assert_eq!(reply, ServerMessage::error("Generic has no shortcut for layer_new"));
    }

    #[tokio::test]
    async fn test_csp_rotate_right_injects_shift_six() {
        let fx = fixture(Some(AppId::ClipStudioPaint));

        fx.router
            .route(&request(r#"{"action":"rotate","value":"{degrees=15}"}"#))
            .await;

        assert_eq!(fx.mock.key_taps(), vec![KeyCombo::new(Modifiers::NONE.with(Modifier::Shift), KeyCode::Digit6)]);
    }

    #[tokio::test]
    async fn test_brush_size_repeats_are_clamped() {
        let fx = fixture(Some(AppId::Krita));

        fx.router
            .route(&request(r#"{"action":"brush_size","value":{"delta":-25}}"#))
            .await;

        let taps = fx.mock.key_taps();
        assert_eq!(taps.len(), MAX_BRUSH_SIZE_STEPS as usize);
        assert!(taps.iter().all(|c| c.key == KeyCode::BracketLeft));
    }

    #[tokio::test]
    async fn test_select_favorite_injects_assigned_slot() {
        // Arrange: tool key 39 is F3.
        let fx = fixture(Some(AppId::ClipStudioPaint));

        // Act
        let reply = fx
            .router
            .route(&request(r#"{"action":"select_brush","value":{"subtool_uuid":"F3"}}"#))
            .await;

        // Assert
        assert_eq!(reply, ServerMessage::received("select_brush"));
        assert_eq!(fx.mock.key_taps(), vec![KeyCombo::key(KeyCode::F3)]);
    }

    #[tokio::test]
    async fn test_select_unassigned_favorite_is_an_error() {
        let fx = fixture(Some(AppId::ClipStudioPaint));

        let reply = fx
            .router
            .route(&request(r#"{"action":"select_favorite","value":{"slot":7}}"#))
            .await;

        assert_eq!(reply, ServerMessage::error("favorite F7 is not assigned"));
        assert!(fx.mock.events().is_empty());
    }

    #[tokio::test]
    async fn test_select_preset_uses_installed_shortcut() {
        let fx = fixture(Some(AppId::Krita));

        let ok = fx
            .router
            .route(&request(r#"{"action":"select_preset","value":{"name":"ink fine"}}"#))
            .await;
        let missing = fx
            .router
            .route(&request(r#"{"action":"select_preset","value":{"name":"Soft Paint"}}"#))
            .await;

        assert_eq!(ok, ServerMessage::received("select_preset"));
        assert_eq!(fx.mock.key_taps(), vec![combo("ctrl+alt+a")]);
        assert!(matches!(missing, ServerMessage::Reply(ActionReply::Error { .. })));
    }

    #[tokio::test]
    async fn test_get_favorites_replies_with_catalog() {
        let fx = fixture(None);

        let reply = fx.router.route(&request(r#"{"action":"get_favorites"}"#)).await;

        let ServerMessage::Reply(ActionReply::FavoritesData {
            favorites,
            total_assigned,
        }) = reply
        else {
            panic!("expected favorites_data, got {reply:?}");
        };
        assert_eq!(total_assigned, 1);
        assert_eq!(favorites.slot(3).unwrap().description, "G-Pen");
    }

    #[tokio::test]
    async fn test_get_presets_replies_with_total() {
        let fx = fixture(Some(AppId::Krita));

        let reply = fx.router.route(&request(r#"{"action":"get_presets"}"#)).await;

        assert!(matches!(
            reply,
            ServerMessage::Reply(ActionReply::PresetsData { total: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_install_preset_shortcuts_reports_restart() {
        let fx = fixture(Some(AppId::Krita));

        let reply = fx
            .router
            .route(&request(r#"{"action":"install_preset_shortcuts"}"#))
            .await;

        assert_eq!(
            reply,
            ServerMessage::Reply(ActionReply::PresetsInstalled {
                installed: 2,
                failed: Vec::new(),
                restart_required: true,
            })
        );
        assert!(fx.mock.events().is_empty());
    }

    #[tokio::test]
    async fn test_injection_failure_is_reported_not_fatal() {
        let fx = fixture(None);
        fx.mock.fail_everything();

        let reply = fx.router.route(&request(r#"{"action":"undo"}"#)).await;
        let second = fx.router.route(&request(r#"{"action":"redo"}"#)).await;

        assert!(matches!(reply, ServerMessage::Reply(ActionReply::Error { .. })));
        assert!(matches!(second, ServerMessage::Reply(ActionReply::Error { .. })));
    }

    #[tokio::test]
    async fn test_scroll_and_pointer_delta_pass_through() {
        let fx = fixture(None);

        fx.router
            .route(&request(r#"{"action":"scroll","value":{"direction":"up"}}"#))
            .await;
        fx.router
            .route(&request(r#"{"action":"pointer_delta","dx":5,"dy":-2}"#))
            .await;

        assert_eq!(
            fx.mock.events(),
            vec![
                InjectedEvent::Scroll(Direction::Up, 3),
                InjectedEvent::PointerDelta(5, -2)
            ]
        );
    }

    #[test]
    fn test_goto_first_plans_twenty_presses_with_pauses() {
        // Arrange
        let catalog = AppCatalog::for_platform(Platform::Windows);
        let profile = catalog.profile(Some(AppId::Krita));

        // Act
        let steps = plan_steps(&Action::Layer(LayerOp::GotoFirst), profile, Platform::Windows).unwrap();

        // Assert
        let presses = steps
            .iter()
            .filter(|s| matches!(s, InjectionStep::KeyCombo(_)))
            .count();
        let pauses = steps
            .iter()
            .filter(|s| **s == InjectionStep::Pause(LAYER_STEP_PAUSE))
            .count();
        assert_eq!(presses, LAYER_GOTO_FIRST_STEPS as usize);
        assert_eq!(pauses, LAYER_GOTO_FIRST_STEPS as usize - 1);
    }

    #[test]
    fn test_canvas_pan_selects_pan_tool_then_moves() {
        let catalog = AppCatalog::for_platform(Platform::Windows);
        let profile = catalog.profile(Some(AppId::ClipStudioPaint));

        let steps = plan_steps(
            &Action::CanvasPan {
                direction: Direction::Left,
                distance: 100,
            },
            profile,
            Platform::Windows,
        )
        .unwrap();

        assert_eq!(
            steps,
            vec![
                InjectionStep::KeyCombo(KeyCombo::key(KeyCode::H)),
                InjectionStep::PointerDelta { dx: -100, dy: 0 },
            ]
        );
    }

    #[test]
    fn test_invalid_key_combo_is_an_error() {
        let catalog = AppCatalog::for_platform(Platform::Windows);
        let err = plan_steps(
            &Action::KeyCombo("ctrl+hyper+q".to_string()),
            catalog.fallback(),
            Platform::Windows,
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidCombo { .. }));
    }
}
