//! WebSocket server: accept loop and per-session tasks.
//!
//! Each connection runs in its own Tokio task:
//!
//! 1. Complete the WebSocket upgrade.
//! 2. Send `auth_required` (unless authentication is disabled) and arm the
//!    authentication deadline.
//! 3. Loop over three event sources with `select!`:
//!    - inbound frames, passed through the session's [`AuthGate`] and, once
//!      authenticated, to the shared [`ActionRouter`];
//!    - the authentication deadline, which closes the session;
//!    - `app_detected` notices from the notifier, forwarded only to
//!      authenticated sessions.
//!
//! Outbound frames go through a small channel to a writer task that owns the
//! WebSocket sink, so a slow client never stalls the notifier.  Requests of
//! one session are routed one at a time, in arrival order.
//!
//! Shutdown is driven by the shared `running` flag, set by the Ctrl+C handler
//! in `main.rs`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use artremote_core::{ClientMessage, ServerMessage};

use crate::application::action_router::ActionRouter;
use crate::application::auth_gate::{AuthGate, GateOutcome};
use crate::domain::config::AuthPolicy;
use crate::domain::credential::Credential;

/// Outbound frames buffered per session before the session loop waits.
const OUTBOUND_BUFFER: usize = 32;

/// Time the writer gets to flush the last frames of a closing session.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a session needs, shared by all sessions.
#[derive(Clone)]
pub struct ServerContext {
    pub credential: Arc<Credential>,
    pub auth: AuthPolicy,
    pub router: Arc<ActionRouter>,
    /// Latest `app_detected` notice; `None` until the notifier has run once.
    pub notices: watch::Receiver<Option<Arc<ServerMessage>>>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, no
/// permission).
pub async fn run_server(
    bind_addr: SocketAddr,
    ctx: ServerContext,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;

    info!("companion listening on ws://{bind_addr}");
    serve(listener, ctx, running).await
}

/// Accept loop over an already bound listener.
pub async fn serve(
    listener: TcpListener,
    ctx: ServerContext,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short accept timeout so the running flag is re-checked regularly.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, ctx).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(stream: TcpStream, peer_addr: SocketAddr, ctx: ServerContext) {
    let session_id = Uuid::new_v4();
    info!("session {session_id}: connection from {peer_addr}");
    match run_session(stream, peer_addr, session_id, ctx).await {
        Ok(()) => info!("session {session_id}: closed"),
        Err(e) => warn!("session {session_id}: closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    session_id: Uuid,
    ctx: ServerContext,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // ── Writer task ───────────────────────────────────────────────────────────
    let (out_tx, mut out_rx) = mpsc::channel::<WsMessage>(OUTBOUND_BUFFER);
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if ws_tx.send(frame).await.is_err() {
                debug!("session {session_id}: send failed (client gone)");
                return;
            }
        }
        // Sends the Close frame.
        let _ = ws_tx.close().await;
    });

    let mut gate = AuthGate::new(Arc::clone(&ctx.credential), ctx.auth, session_id.to_string());
    let mut notices = ctx.notices.clone();
    notices.borrow_and_update();
    let mut notices_open = true;

    if let Some(challenge) = gate.start() {
        send(&out_tx, session_id, &challenge).await;
    }
    if gate.is_authenticated() {
        send_current_notice(&out_tx, session_id, &notices).await;
    }
    let mut deadline = gate.deadline_from(Instant::now());

    loop {
        tokio::select! {
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                if let Some(frame) = gate.on_deadline() {
                    send(&out_tx, session_id, &frame).await;
                    break;
                }
            }

            changed = notices.changed(), if notices_open => {
                if changed.is_err() {
                    notices_open = false;
                    continue;
                }
                let notice = notices.borrow_and_update().clone();
                match notice {
                    Some(notice) if gate.is_authenticated() => {
                        send(&out_tx, session_id, &notice).await;
                    }
                    _ => {}
                }
            }

            inbound = ws_rx.next() => {
                let text = match inbound {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => {
                        debug!("session {session_id}: client closed");
                        break;
                    }
                    Some(Ok(WsMessage::Binary(_))) => {
                        warn!("session {session_id}: unexpected binary frame (ignored)");
                        continue;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => break,
                    Some(Err(e)) => {
                        warn!("session {session_id}: WebSocket error: {e}");
                        break;
                    }
                };

                let outcome = match ClientMessage::parse(&text) {
                    Ok(message) => {
                        debug!("session {session_id}: ← {}", message.kind());
                        gate.handle(message)
                    }
                    Err(e) => {
                        debug!("session {session_id}: undecodable frame: {e}");
                        gate.reject_undecodable(&e.to_string())
                    }
                };

                match outcome {
                    GateOutcome::Forward(request) => {
                        let reply = ctx.router.route(&request).await;
                        send(&out_tx, session_id, &reply).await;
                    }
                    GateOutcome::Reply(frame) => {
                        send(&out_tx, session_id, &frame).await;
                    }
                    GateOutcome::Authenticated(frame) => {
                        deadline = None;
                        send(&out_tx, session_id, &frame).await;
                        send_current_notice(&out_tx, session_id, &notices).await;
                    }
                    GateOutcome::ReplyAndClose(frame) => {
                        send(&out_tx, session_id, &frame).await;
                        break;
                    }
                    GateOutcome::Ignore => {}
                }
            }
        }
    }

    gate.close();
    drop(out_tx);
    finish_writer(writer, CLOSE_FLUSH_TIMEOUT, session_id).await;
    Ok(())
}

/// Waits up to `limit` for the writer to flush, then aborts it so a stalled
/// socket does not outlive the session.  Returns whether it finished in time.
async fn finish_writer(mut writer: JoinHandle<()>, limit: Duration, session_id: Uuid) -> bool {
    if timeout(limit, &mut writer).await.is_ok() {
        return true;
    }
    debug!("session {session_id}: writer did not finish flushing, aborting");
    writer.abort();
    false
}

async fn send_current_notice(
    out: &mpsc::Sender<WsMessage>,
    session_id: Uuid,
    notices: &watch::Receiver<Option<Arc<ServerMessage>>>,
) {
    let notice = notices.borrow().clone();
    if let Some(notice) = notice {
        send(out, session_id, &notice).await;
    }
}

/// Queues one frame for the writer.  Only the frame kind is logged.
async fn send(out: &mpsc::Sender<WsMessage>, session_id: Uuid, frame: &ServerMessage) {
    match frame.to_json() {
        Ok(json) => {
            debug!("session {session_id}: → {}", frame.kind());
            if out.send(WsMessage::Text(json)).await.is_err() {
                debug!("session {session_id}: writer gone, dropping {}", frame.kind());
            }
        }
        Err(e) => error!("session {session_id}: cannot serialize {}: {e}", frame.kind()),
    }
}
