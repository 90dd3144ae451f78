//! Builds the `app_detected` notice for the current application.

use artremote_core::protocol::AppDetectedNotice;
use artremote_core::{AppCatalog, AppId};

use super::resolver::ShortcutResolver;

/// Wire id used when no target application is detected.
pub const NO_APP_ID: &str = "none";

/// Display name used when no target application is detected.
pub const NO_APP_NAME: &str = "None detected";

/// Assembles the notice, reading favorites or presets when the application has them.
pub async fn build_notice(
    app: Option<AppId>,
    catalog: &AppCatalog,
    resolver: &ShortcutResolver,
) -> AppDetectedNotice {
    let profile = catalog.profile(app);
    let Some(id) = app else {
        return AppDetectedNotice {
            app: NO_APP_ID.to_string(),
            app_name: NO_APP_NAME.to_string(),
            has_favorites: false,
            supported_tools: profile.supported_tools.clone(),
            favorites: None,
            presets: None,
        };
    };

    let favorites = if id.has_favorites() {
        Some(resolver.favorites().await)
    } else {
        None
    };
    let presets = if id.has_presets() {
        Some(resolver.presets().await)
    } else {
        None
    };

    AppDetectedNotice {
        app: id.as_str().to_string(),
        app_name: id.display_name().to_string(),
        has_favorites: id.has_favorites(),
        supported_tools: profile.supported_tools.clone(),
        favorites,
        presets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::resolver::{
        MockFavoritesSource, MockPresetSource, MockShortcutInstaller, StoreError,
    };
    use artremote_core::Platform;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn resolver() -> ShortcutResolver {
        let mut favorites = MockFavoritesSource::new();
        favorites.expect_load().returning(|| {
            Err(StoreError::Missing {
                path: PathBuf::from("default.khc"),
            })
        });
        let mut presets = MockPresetSource::new();
        presets.expect_scan().returning(|| Ok(Vec::new()));
        let mut installer = MockShortcutInstaller::new();
        installer.expect_installed().returning(|| Ok(Vec::new()));
        ShortcutResolver::new(
            Arc::new(favorites),
            Arc::new(presets),
            Arc::new(installer),
            Platform::Windows,
        )
    }

    #[tokio::test]
    async fn test_csp_notice_carries_favorites_only() {
        // Arrange
        let catalog = AppCatalog::for_platform(Platform::Windows);

        // Act
        let notice = build_notice(Some(AppId::ClipStudioPaint), &catalog, &resolver()).await;

        // Assert
        assert_eq!(notice.app, "clip_studio_paint");
        assert!(notice.has_favorites);
        assert_eq!(notice.favorites.unwrap().assigned_count(), 0);
        assert!(notice.presets.is_none());
    }

    #[tokio::test]
    async fn test_krita_notice_carries_presets_only() {
        let catalog = AppCatalog::for_platform(Platform::Windows);

        let notice = build_notice(Some(AppId::Krita), &catalog, &resolver()).await;

        assert_eq!(notice.app, "krita");
        assert!(!notice.has_favorites);
        assert!(notice.favorites.is_none());
        assert_eq!(notice.presets, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_no_app_notice() {
        let catalog = AppCatalog::for_platform(Platform::Linux);

        let notice = build_notice(None, &catalog, &resolver()).await;

        assert_eq!(notice.app, NO_APP_ID);
        assert_eq!(notice.app_name, NO_APP_NAME);
        assert_eq!(notice.supported_tools, catalog.fallback().supported_tools);
    }
}
