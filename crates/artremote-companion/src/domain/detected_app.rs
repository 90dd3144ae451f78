//! The process-wide "which application is in front" snapshot.

use chrono::{DateTime, Utc};

use artremote_core::AppId;

/// Result of one detection pass.
///
/// Published whole through a `tokio::sync::watch` channel as
/// `Arc<DetectedAppState>`; a published value is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedAppState {
    pub app_id: Option<AppId>,
    pub last_checked_at: DateTime<Utc>,
}

impl DetectedAppState {
    pub fn new(app_id: Option<AppId>) -> Self {
        Self {
            app_id,
            last_checked_at: Utc::now(),
        }
    }

    /// State before the first detection pass has run.
    pub fn undetected() -> Self {
        Self::new(None)
    }
}
