//! Per-session authentication state machine.
//!
//! ```text
//!            start()                 correct token / PIN
//! AwaitingHello ──► AwaitingAuth{n} ─────────────────────► Authenticated
//!       │                 │  wrong, n+1 < max: stay            │
//!       │ auth disabled   │  wrong, n+1 = max ──► Rejected      │ close()
//!       └─────────────────┼──────────────────────────┐         ▼
//!                         │  deadline ──► Rejected   └──────► Closed
//! ```
//!
//! The gate is synchronous and owns no timers or sockets.  The session task
//! feeds it decoded frames and the deadline expiry, and it answers with a
//! [`GateOutcome`] telling the session what to send and whether to close.
//! Nothing reaches the action router unless the gate returns
//! [`GateOutcome::Forward`], which it does only in `Authenticated`.

use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use artremote_core::protocol::messages::AuthenticateRequest;
use artremote_core::{ActionRequest, ClientMessage, ServerMessage};

use crate::domain::config::AuthPolicy;
use crate::domain::credential::Credential;

/// Why a session is not (yet) authenticated.
///
/// The `Display` text is what the control surface sees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid authentication credentials")]
    InvalidCredentials { attempts_remaining: u8 },

    #[error("Too many failed authentication attempts")]
    TooManyAttempts,

    #[error("Authentication timed out")]
    TimedOut,

    #[error("Authentication required")]
    NotAuthenticated,
}

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHello,
    AwaitingAuth { attempts: u8 },
    Authenticated,
    Rejected,
    Closed,
}

/// What the session should do with one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Hand the action to the router.
    Forward(ActionRequest),
    /// Send this frame and keep reading.
    Reply(ServerMessage),
    /// The session just became authenticated; send this frame, then the
    /// current application notice.
    Authenticated(ServerMessage),
    /// Send this frame, then close the connection.
    ReplyAndClose(ServerMessage),
    /// Send nothing.
    Ignore,
}

/// Authentication gate for a single session.
pub struct AuthGate {
    credential: Arc<Credential>,
    policy: AuthPolicy,
    state: SessionState,
    peer: String,
}

impl AuthGate {
    pub fn new(credential: Arc<Credential>, policy: AuthPolicy, peer: impl Into<String>) -> Self {
        Self {
            credential,
            policy,
            state: SessionState::AwaitingHello,
            peer: peer.into(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Opens the session.
    ///
    /// Returns the `auth_required` challenge, or `None` when authentication is
    /// disabled and the session is already authenticated.
    pub fn start(&mut self) -> Option<ServerMessage> {
        if self.state != SessionState::AwaitingHello {
            return None;
        }
        if !self.policy.enabled {
            self.state = SessionState::Authenticated;
            info!("session {}: authentication disabled, session accepted", self.peer);
            return None;
        }
        self.state = SessionState::AwaitingAuth { attempts: 0 };
        Some(ServerMessage::auth_required())
    }

    /// Instant by which the session must authenticate, if it still has to.
    ///
    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn deadline_from(&self, started: Instant) -> Option<Instant> {
        match self.state {
            SessionState::AwaitingHello | SessionState::AwaitingAuth { .. } => {
                started.checked_add(self.policy.timeout)
            }
            _ => None,
        }
    }

    /// Processes one decoded inbound frame.
    pub fn handle(&mut self, message: ClientMessage) -> GateOutcome {
        match (self.state, message) {
            (SessionState::Rejected | SessionState::Closed, _) => GateOutcome::Ignore,

            (SessionState::Authenticated, ClientMessage::Action(request)) => {
                GateOutcome::Forward(request)
            }
            (SessionState::Authenticated, ClientMessage::Authenticate(_)) => {
                GateOutcome::Reply(ServerMessage::auth_response(true, "Already authenticated"))
            }

            (SessionState::AwaitingHello | SessionState::AwaitingAuth { .. }, ClientMessage::Action(_)) => {
                GateOutcome::Reply(ServerMessage::error(AuthError::NotAuthenticated.to_string()))
            }

            (SessionState::AwaitingHello, ClientMessage::Authenticate(request)) => {
                self.attempt(0, &request)
            }
            (SessionState::AwaitingAuth { attempts }, ClientMessage::Authenticate(request)) => {
                self.attempt(attempts, &request)
            }
        }
    }

    /// Answer for a frame that could not be decoded.
    ///
    /// Before authentication the decode error is not echoed back.
    pub fn reject_undecodable(&self, detail: &str) -> GateOutcome {
        match self.state {
            SessionState::Authenticated => GateOutcome::Reply(ServerMessage::error(detail)),
            SessionState::Rejected | SessionState::Closed => GateOutcome::Ignore,
            _ => GateOutcome::Reply(ServerMessage::error(AuthError::NotAuthenticated.to_string())),
        }
    }

    /// Called when the authentication deadline passes.
    ///
    /// Returns the frame to send before closing, or `None` if the session is
    /// already authenticated (the deadline is then meaningless).
    pub fn on_deadline(&mut self) -> Option<ServerMessage> {
        match self.state {
            SessionState::AwaitingHello | SessionState::AwaitingAuth { .. } => {
                self.state = SessionState::Rejected;
                warn!("session {}: authentication timed out", self.peer);
                Some(ServerMessage::auth_response(false, AuthError::TimedOut.to_string()))
            }
            _ => None,
        }
    }

    /// Marks the session closed.  Every later frame is ignored.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    fn attempt(&mut self, attempts: u8, request: &AuthenticateRequest) -> GateOutcome {
        if self
            .credential
            .verify(request.token.as_deref(), request.pin.as_deref())
        {
            self.state = SessionState::Authenticated;
            match &request.client_info {
                Some(client_info) => {
                    info!("session {}: authenticated ({client_info})", self.peer)
                }
                None => info!("session {}: authenticated", self.peer),
            }
            return GateOutcome::Authenticated(ServerMessage::auth_response(
                true,
                "Authentication successful",
            ));
        }

        let attempts = attempts.saturating_add(1);
        if attempts >= self.policy.max_attempts {
            self.state = SessionState::Rejected;
            warn!(
                "session {}: rejected after {attempts} failed authentication attempts",
                self.peer
            );
            return GateOutcome::ReplyAndClose(ServerMessage::auth_response(
                false,
                AuthError::TooManyAttempts.to_string(),
            ));
        }

        self.state = SessionState::AwaitingAuth { attempts };
        let err = AuthError::InvalidCredentials {
            attempts_remaining: self.policy.max_attempts - attempts,
        };
        warn!("session {}: {err} ({attempts} failed)", self.peer);
        GateOutcome::Reply(ServerMessage::auth_response(false, err.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use artremote_core::protocol::messages::ServerEvent;
    use std::time::Duration;

    fn policy() -> AuthPolicy {
        AuthPolicy {
            enabled: true,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
        }
    }

    fn make_gate(policy: AuthPolicy) -> (AuthGate, Arc<Credential>) {
        let credential = Arc::new(Credential::generate());
        (AuthGate::new(Arc::clone(&credential), policy, "test"), credential)
    }

    fn pin_message(pin: &str) -> ClientMessage {
        ClientMessage::Authenticate(AuthenticateRequest {
            token: None,
            pin: Some(pin.to_string()),
            client_info: None,
        })
    }

    fn action_message(name: &str) -> ClientMessage {
        ClientMessage::parse(&format!(r#"{{"action":"{name}"}}"#)).unwrap()
    }

    fn is_auth_response(outcome: &GateOutcome, expected: bool) -> bool {
        let msg = match outcome {
            GateOutcome::Reply(m) | GateOutcome::Authenticated(m) | GateOutcome::ReplyAndClose(m) => m,
            _ => return false,
        };
        matches!(
            msg,
            ServerMessage::Event(ServerEvent::AuthResponse { success, .. }) if *success == expected
        )
    }

    #[test]
    fn test_start_challenges_when_auth_enabled() {
        // Arrange
        let (mut gate, _) = make_gate(policy());

        // Act
        let challenge = gate.start();

        // Assert
        assert_eq!(challenge, Some(ServerMessage::auth_required()));
        assert_eq!(gate.state(), SessionState::AwaitingAuth { attempts: 0 });
    }

    #[test]
    fn test_start_authenticates_immediately_when_auth_disabled() {
        // Arrange
        let (mut gate, _) = make_gate(AuthPolicy {
            enabled: false,
            ..policy()
        });

        // Act
        let challenge = gate.start();

        // Assert
        assert!(challenge.is_none());
        assert!(gate.is_authenticated());
        assert!(gate.deadline_from(Instant::now()).is_none());
    }

    #[test]
    fn test_unrepresentable_timeout_yields_no_deadline() {
        // Arrange
        let (mut gate, _) = make_gate(AuthPolicy {
            timeout: Duration::from_secs(u64::MAX),
            ..policy()
        });
        gate.start();

        // Act
        let deadline = gate.deadline_from(Instant::now());

        // Assert
        assert!(deadline.is_none());
    }

    #[test]
    fn test_correct_pin_authenticates() {
        // Arrange
        let (mut gate, cred) = make_gate(policy());
        gate.start();

        // Act
        let outcome = gate.handle(pin_message(&cred.pin));

        // Assert
        assert!(matches!(outcome, GateOutcome::Authenticated(_)));
        assert!(is_auth_response(&outcome, true));
        assert!(gate.is_authenticated());
    }

    #[test]
    fn test_actions_before_authentication_are_never_forwarded() {
        // Arrange
        let (mut gate, _) = make_gate(policy());
        gate.start();

        // Act
        let outcome = gate.handle(action_message("undo"));

        // Assert
        assert_eq!(
            outcome,
            GateOutcome::Reply(ServerMessage::error("Authentication required"))
        );
        assert_eq!(gate.state(), SessionState::AwaitingAuth { attempts: 0 });
    }

    #[test]
    fn test_wrong_pin_replies_failure_and_allows_retry() {
        // Arrange
        let (mut gate, cred) = make_gate(policy());
        gate.start();

        // Act
        let first = gate.handle(pin_message("000000"));
        let second = gate.handle(pin_message(&cred.pin));

        // Assert
        assert!(matches!(first, GateOutcome::Reply(_)));
        assert!(is_auth_response(&first, false));
        assert!(matches!(second, GateOutcome::Authenticated(_)));
    }

    #[test]
    fn test_retry_bound_rejects_and_closes() {
        // Arrange
        let (mut gate, cred) = make_gate(policy());
        gate.start();

        // Act
        let a = gate.handle(pin_message("000001"));
        let b = gate.handle(pin_message("000002"));
        let c = gate.handle(pin_message("000003"));
        let after = gate.handle(pin_message(&cred.pin));

        // Assert
        assert!(matches!(a, GateOutcome::Reply(_)));
        assert!(matches!(b, GateOutcome::Reply(_)));
        assert!(matches!(c, GateOutcome::ReplyAndClose(_)));
        assert!(is_auth_response(&c, false));
        assert_eq!(gate.state(), SessionState::Rejected);
        assert_eq!(after, GateOutcome::Ignore);
    }

    #[test]
    fn test_deadline_rejects_and_later_pin_is_ignored() {
        // Arrange
        let (mut gate, cred) = make_gate(policy());
        gate.start();

        // Act
        let timeout_reply = gate.on_deadline();
        let late = gate.handle(pin_message(&cred.pin));

        // Assert
        assert_eq!(
            timeout_reply,
            Some(ServerMessage::auth_response(false, "Authentication timed out"))
        );
        assert_eq!(late, GateOutcome::Ignore);
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn test_deadline_after_success_is_a_no_op() {
        let (mut gate, cred) = make_gate(policy());
        gate.start();
        gate.handle(pin_message(&cred.pin));

        assert!(gate.on_deadline().is_none());
        assert!(gate.is_authenticated());
    }

    #[test]
    fn test_authenticated_actions_are_forwarded() {
        let (mut gate, cred) = make_gate(policy());
        gate.start();
        gate.handle(pin_message(&cred.pin));

        let outcome = gate.handle(action_message("redo"));

        assert!(matches!(outcome, GateOutcome::Forward(req) if req.action == "redo"));
    }

    #[test]
    fn test_reauthenticate_after_success_is_acknowledged() {
        let (mut gate, cred) = make_gate(policy());
        gate.start();
        gate.handle(pin_message(&cred.pin));

        let outcome = gate.handle(pin_message("garbage"));

        assert!(is_auth_response(&outcome, true));
        assert!(gate.is_authenticated());
    }

    #[test]
    fn test_token_authenticates() {
        let (mut gate, cred) = make_gate(policy());
        gate.start();

        let outcome = gate.handle(ClientMessage::Authenticate(AuthenticateRequest {
            token: Some(cred.token.clone()),
            pin: None,
            client_info: Some(serde_json::json!({"device": "tablet"})),
        }));

        assert!(matches!(outcome, GateOutcome::Authenticated(_)));
    }

    #[test]
    fn test_undecodable_frame_before_auth_does_not_echo_details() {
        let (mut gate, _) = make_gate(policy());
        gate.start();

        let outcome = gate.reject_undecodable("invalid JSON: expected value at line 1");

        assert_eq!(
            outcome,
            GateOutcome::Reply(ServerMessage::error("Authentication required"))
        );
    }

    #[test]
    fn test_closed_session_ignores_everything() {
        let (mut gate, _) = make_gate(policy());
        gate.start();
        gate.close();

        assert_eq!(gate.handle(action_message("undo")), GateOutcome::Ignore);
        assert!(gate.on_deadline().is_none());
    }
}
