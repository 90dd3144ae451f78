//! Serialized input injection.
//!
//! All synthetic input goes through one dedicated OS thread that owns the
//! platform [`InputInjector`].  Sessions submit an ordered list of
//! [`InjectionStep`]s as one job; jobs are executed strictly in submission
//! order and the steps of one job are never interleaved with another job's.
//!
//! ```text
//! session A ─┐                        ┌──────────────────────────────┐
//! session B ─┼─► mpsc (bounded) ────► │ "input-injection" thread     │
//! router    ─┘     InjectionJob       │  for step in job: injector.* │
//!                  + oneshot reply ◄──│  reply Ok / Err              │
//!                                     └──────────────────────────────┘
//! ```
//!
//! The thread is a plain `std::thread` because the platform injectors make
//! blocking OS calls (and on Linux hold a non-`Sync` X display handle).

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use artremote_core::{Direction, KeyCode, KeyCombo, Modifier};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Error type for injection operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),

    /// The OS refused synthetic input (e.g. macOS accessibility permission).
    #[error("input injection not permitted: {0}")]
    PermissionDenied(String),

    /// No injector exists for this host (e.g. no X display).
    #[error("input injection unavailable: {0}")]
    Unavailable(String),

    #[error("injection queue closed")]
    QueueClosed,
}

/// One key on the synthetic keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedKey {
    Modifier(Modifier),
    Key(KeyCode),
}

/// OS-level input primitives.
///
/// Each supported OS provides an implementation in the infrastructure layer.
/// Implementations are only ever called from the injection thread.
pub trait InputInjector: Send {
    /// Presses or releases one key.
    fn emit_key(&self, key: InjectedKey, pressed: bool) -> Result<(), InjectionError>;

    /// Scrolls `amount` wheel notches in `direction`.
    fn emit_scroll(&self, direction: Direction, amount: u32) -> Result<(), InjectionError>;

    /// Moves the pointer relative to its current position.
    fn emit_pointer_delta(&self, dx: i32, dy: i32) -> Result<(), InjectionError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// One unit of work inside a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionStep {
    KeyCombo(KeyCombo),
    Scroll { direction: Direction, amount: u32 },
    PointerDelta { dx: i32, dy: i32 },
    Pause(Duration),
}

struct InjectionJob {
    steps: Vec<InjectionStep>,
    reply: oneshot::Sender<Result<(), InjectionError>>,
}

/// Cloneable submission side of the queue.
#[derive(Clone)]
pub struct InjectionHandle {
    tx: mpsc::Sender<InjectionJob>,
}

impl InjectionHandle {
    /// Submits one job and waits until the injection thread has run it.
    ///
    /// Waits for queue capacity when the queue is full.
    pub async fn submit(&self, steps: Vec<InjectionStep>) -> Result<(), InjectionError> {
        if steps.is_empty() {
            return Ok(());
        }
        let (reply, done) = oneshot::channel();
        self.tx
            .send(InjectionJob { steps, reply })
            .await
            .map_err(|_| InjectionError::QueueClosed)?;
        done.await.map_err(|_| InjectionError::QueueClosed)?
    }
}

/// Owner of the injection thread.
pub struct InjectionQueue;

impl InjectionQueue {
    /// Starts the injection thread.
    ///
    /// The thread exits once every [`InjectionHandle`] has been dropped.
    pub fn spawn(
        injector: Box<dyn InputInjector>,
        depth: usize,
    ) -> io::Result<(InjectionHandle, JoinHandle<()>)> {
        let (tx, mut rx) = mpsc::channel::<InjectionJob>(depth.max(1));
        let worker = thread::Builder::new()
            .name("input-injection".to_string())
            .spawn(move || {
                debug!("injection thread started ({})", injector.name());
                while let Some(job) = rx.blocking_recv() {
                    let result = run_steps(injector.as_ref(), &job.steps);
                    if let Err(e) = &result {
                        warn!("injection failed: {e}");
                    }
                    // The submitter may have gone away; that is not an error here.
                    let _ = job.reply.send(result);
                }
                debug!("injection thread stopped");
            })?;
        Ok((InjectionHandle { tx }, worker))
    }
}

fn run_steps(injector: &dyn InputInjector, steps: &[InjectionStep]) -> Result<(), InjectionError> {
    for step in steps {
        trace!("inject {step:?}");
        match step {
            InjectionStep::KeyCombo(combo) => press_combo(injector, combo)?,
            InjectionStep::Scroll { direction, amount } => {
                injector.emit_scroll(*direction, *amount)?
            }
            InjectionStep::PointerDelta { dx, dy } => injector.emit_pointer_delta(*dx, *dy)?,
            InjectionStep::Pause(duration) => thread::sleep(*duration),
        }
    }
    Ok(())
}

/// Presses the modifiers in order, taps the key, then releases the modifiers
/// in reverse order.
///
/// Every modifier that went down is released even when a later event fails,
/// so a failed combo never leaves a modifier stuck.
fn press_combo(injector: &dyn InputInjector, combo: &KeyCombo) -> Result<(), InjectionError> {
    let modifiers = combo.modifiers.pressed();
    let mut held = Vec::with_capacity(modifiers.len());
    let mut result = Ok(());

    for modifier in modifiers {
        match injector.emit_key(InjectedKey::Modifier(modifier), true) {
            Ok(()) => held.push(modifier),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    if result.is_ok() {
        result = injector
            .emit_key(InjectedKey::Key(combo.key), true)
            .and_then(|()| injector.emit_key(InjectedKey::Key(combo.key), false));
    }

    for modifier in held.into_iter().rev() {
        if let Err(e) = injector.emit_key(InjectedKey::Modifier(modifier), false) {
            warn!("failed to release {modifier:?}: {e}");
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
