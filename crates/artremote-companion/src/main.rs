//! ArtRemote companion: entry point.
//!
//! Runs on the computer with the painting application.  The control surface
//! connects over WebSocket, pairs with the token or PIN printed at startup,
//! and sends actions that are injected as keystrokes into Krita or Clip
//! Studio Paint.
//!
//! # Usage
//!
//! ```text
//! artremote-companion [OPTIONS]
//!
//! Options:
//!   --port <PORT>                  WebSocket port [default: from settings, 8765]
//!   --bind-scope <local|network>   Loopback only, or all interfaces
//!   --no-auth                      Accept sessions without pairing
//!   --config <FILE>                Settings file to use
//!   --auth-timeout <SECS>          Time a session has to authenticate
//!   --max-auth-attempts <N>        Failed attempts before the session closes
//!   --detect-interval-ms <MS>      Foreground application polling interval
//!   --regenerate-credentials       Replace the pairing token and PIN
//!   --install-krita-shortcuts      Generate Krita preset shortcuts, then serve
//! ```
//!
//! Every option can also be given as an `ARTREMOTE_*` environment variable.
//! Precedence is command line, then environment, then the settings file.
//!
//! # Startup
//!
//! ```text
//! main()
//!  ├─ settings file + CLI overrides ─► CompanionConfig
//!  ├─ CredentialStore::load_or_create
//!  ├─ InjectionQueue::spawn          ("input-injection" thread)
//!  ├─ ShortcutResolver               (CSP store, Krita scanner + installer)
//!  ├─ spawn_detector / spawn_notifier
//!  └─ run_server                     (until Ctrl+C)
//! ```

use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use artremote_companion::application::action_router::ActionRouter;
use artremote_companion::application::injection::InjectionQueue;
use artremote_companion::application::resolver::ShortcutResolver;
use artremote_companion::domain::{CompanionConfig, Credential, DetectedAppState};
use artremote_companion::infrastructure::app_detector::{
    spawn_detector, spawn_notifier, SystemProbe,
};
use artremote_companion::infrastructure::credential_store::CredentialStore;
use artremote_companion::infrastructure::csp_store::CspStore;
use artremote_companion::infrastructure::input_injection::platform_injector;
use artremote_companion::infrastructure::krita::{KritaPresetScanner, KritaShortcutFile};
use artremote_companion::infrastructure::storage::config::{
    config_file_path, load_settings, save_settings, BindScope, CompanionSettings,
};
use artremote_companion::infrastructure::{run_server, ServerContext};
use artremote_core::{AppCatalog, Platform};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Local,
    Network,
}

impl From<ScopeArg> for BindScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Local => BindScope::Local,
            ScopeArg::Network => BindScope::Network,
        }
    }
}

/// ArtRemote desktop companion.
///
/// Options left unset keep the value from the settings file.
#[derive(Debug, Parser)]
#[command(
    name = "artremote-companion",
    about = "Authenticated WebSocket command server for Krita and Clip Studio Paint",
    version
)]
struct Cli {
    /// WebSocket port the control surface connects to.
    #[arg(long, env = "ARTREMOTE_PORT")]
    port: Option<u16>,

    /// `local` accepts loopback connections only; `network` accepts the LAN.
    #[arg(long, value_enum, env = "ARTREMOTE_BIND_SCOPE")]
    bind_scope: Option<ScopeArg>,

    /// Accept every session without pairing.
    #[arg(long, env = "ARTREMOTE_NO_AUTH")]
    no_auth: bool,

    /// Settings file to read instead of the platform default.
    #[arg(long, env = "ARTREMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds a new session has to authenticate.
    #[arg(long, env = "ARTREMOTE_AUTH_TIMEOUT")]
    auth_timeout: Option<u64>,

    /// Failed authentication attempts before the session is closed.
    #[arg(long, env = "ARTREMOTE_MAX_AUTH_ATTEMPTS")]
    max_auth_attempts: Option<u8>,

    /// Foreground application polling interval in milliseconds.
    #[arg(long, env = "ARTREMOTE_DETECT_INTERVAL_MS")]
    detect_interval_ms: Option<u64>,

    /// Replace the stored pairing token and PIN; paired surfaces must pair again.
    #[arg(long)]
    regenerate_credentials: bool,

    /// Run one Krita preset shortcut generation pass before serving.
    #[arg(long)]
    install_krita_shortcuts: bool,
}

impl Cli {
    /// Writes the options that were given over `settings`.
    fn apply_to(&self, settings: &mut CompanionSettings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(scope) = self.bind_scope {
            settings.server.bind_scope = scope.into();
        }
        if self.no_auth {
            settings.auth.enabled = false;
        }
        if let Some(secs) = self.auth_timeout {
            settings.auth.timeout_secs = secs;
        }
        if let Some(attempts) = self.max_auth_attempts {
            settings.auth.max_attempts = attempts;
        }
        if let Some(ms) = self.detect_interval_ms {
            settings.detection.interval_ms = ms;
        }
    }
}

/// Address the surface should dial: the bound IP, or the primary LAN address
/// when bound to all interfaces.
fn advertised_host(bind_addr: SocketAddr) -> IpAddr {
    if !bind_addr.ip().is_unspecified() {
        return bind_addr.ip();
    }
    // Connecting a UDP socket sends nothing; it only selects the outbound interface.
    UdpSocket::bind(("0.0.0.0", 0))
        .and_then(|socket| {
            socket.connect(("192.0.2.1", 9))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(bind_addr.ip())
}

fn announce_pairing(credential: &Credential, config: &CompanionConfig) {
    if !config.auth.enabled {
        warn!("authentication disabled: any client on the network can send input");
        return;
    }
    let host = advertised_host(config.bind_addr);
    info!("pairing PIN: {}", credential.pin);
    info!(
        "pairing URI: {}",
        credential.pairing_uri(&host.to_string(), config.bind_addr.port())
    );
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Settings ──────────────────────────────────────────────────────────────
    let settings_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("cannot locate the settings file")?,
    };
    let mut settings = load_settings(&settings_path)
        .with_context(|| format!("cannot load settings from {}", settings_path.display()))?;

    // ── Logging ───────────────────────────────────────────────────────────────
    //
    // RUST_LOG wins; otherwise the settings file's log level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.general.log_level)),
        )
        .init();

    // First run: leave an editable settings file behind.
    if !settings_path.exists() {
        match save_settings(&settings_path, &settings) {
            Ok(()) => info!("wrote default settings to {}", settings_path.display()),
            Err(e) => warn!("could not write default settings: {e}"),
        }
    }

    cli.apply_to(&mut settings);
    let config = settings.to_config();
    info!(
        "ArtRemote companion starting: bind={}, auth={}, settings={}",
        config.bind_addr,
        if config.auth.enabled { "on" } else { "off" },
        settings_path.display()
    );

    // ── Credential ────────────────────────────────────────────────────────────
    let credential_dir = match &config.credential_dir {
        Some(dir) => dir.clone(),
        None => CredentialStore::default_dir().context("cannot locate the credential directory")?,
    };
    let store = CredentialStore::new(credential_dir);
    let prepared = if cli.regenerate_credentials {
        store.regenerate()
    } else {
        store.load_or_create()
    };
    let credential = prepared
        .with_context(|| format!("cannot prepare credential at {}", store.path().display()))?;
    announce_pairing(&credential, &config);

    // ── Core services ─────────────────────────────────────────────────────────
    let platform = Platform::current();
    let catalog = Arc::new(AppCatalog::for_platform(platform));

    let (injection, _injection_thread) =
        InjectionQueue::spawn(platform_injector(), config.injection_queue_depth)
            .context("cannot start the input injection thread")?;

    let resolver = Arc::new(ShortcutResolver::new(
        Arc::new(CspStore::new(config.csp_data_dir.clone())),
        Arc::new(KritaPresetScanner::new(config.krita_resource_dir.clone())),
        Arc::new(KritaShortcutFile::new(config.krita_config_dir.clone(), platform)),
        platform,
    ));

    if cli.install_krita_shortcuts {
        match resolver.generate_and_install().await {
            Ok(report) => info!(
                "Krita preset shortcuts: {} installed, {} failed",
                report.installed,
                report.failed.len()
            ),
            Err(e) => error!("Krita preset shortcut generation failed: {e}"),
        }
    }

    // ── Background tasks ──────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));

    let (state_tx, state_rx) = watch::channel(Arc::new(DetectedAppState::undetected()));
    let _detector = spawn_detector(
        Box::new(SystemProbe::new()),
        Arc::clone(&catalog),
        config.detect_interval,
        state_tx,
        Arc::clone(&running),
    );

    let (notice_tx, notice_rx) = watch::channel(None);
    let _notifier = spawn_notifier(
        state_rx.clone(),
        Arc::clone(&catalog),
        Arc::clone(&resolver),
        notice_tx,
    );

    let router = Arc::new(ActionRouter::new(catalog, injection, resolver, state_rx));

    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Server ────────────────────────────────────────────────────────────────
    let ctx = ServerContext {
        credential: Arc::new(credential),
        auth: config.auth,
        router,
        notices: notice_rx,
    };
    run_server(config.bind_addr, ctx, running).await?;

    info!("ArtRemote companion stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config_from(args: &[&str]) -> CompanionConfig {
        let cli = Cli::parse_from(args);
        let mut settings = CompanionSettings::default();
        cli.apply_to(&mut settings);
        settings.to_config()
    }

    #[test]
    fn test_cli_defaults_leave_settings_untouched() {
        // Arrange
        let cli = Cli::parse_from(["artremote-companion"]);
        let mut settings = CompanionSettings::default();

        // Act
        cli.apply_to(&mut settings);

        // Assert
        assert_eq!(settings, CompanionSettings::default());
        assert!(!cli.regenerate_credentials);
        assert!(!cli.install_krita_shortcuts);
    }

    #[test]
    fn test_cli_port_override() {
        let config = config_from(&["artremote-companion", "--port", "9999"]);
        assert_eq!(config.bind_addr.port(), 9999);
    }

    #[test]
    fn test_cli_local_bind_scope_uses_loopback() {
        let config = config_from(&["artremote-companion", "--bind-scope", "local"]);
        assert!(config.bind_addr.ip().is_loopback());
    }

    #[test]
    fn test_cli_no_auth_disables_authentication() {
        let config = config_from(&["artremote-companion", "--no-auth"]);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn test_cli_auth_overrides() {
        let config = config_from(&[
            "artremote-companion",
            "--auth-timeout",
            "5",
            "--max-auth-attempts",
            "7",
        ]);
        assert_eq!(config.auth.timeout, Duration::from_secs(5));
        assert_eq!(config.auth.max_attempts, 7);
    }

    #[test]
    fn test_cli_huge_auth_timeout_is_clamped() {
        let config = config_from(&["artremote-companion", "--auth-timeout", "18446744073709551615"]);
        assert_eq!(
            config.auth.timeout,
            Duration::from_secs(artremote_companion::infrastructure::storage::config::MAX_AUTH_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_cli_detect_interval_override() {
        let config = config_from(&["artremote-companion", "--detect-interval-ms", "500"]);
        assert_eq!(config.detect_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_cli_rejects_unknown_bind_scope() {
        let result = Cli::try_parse_from(["artremote-companion", "--bind-scope", "everywhere"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_advertised_host_keeps_specific_bind_ip() {
        let addr: SocketAddr = "127.0.0.1:8765".parse().unwrap();
        assert_eq!(advertised_host(addr), addr.ip());
    }
}
