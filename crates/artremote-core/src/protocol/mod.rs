//! JSON-over-WebSocket wire protocol between the control surface and the companion.

pub mod messages;

use thiserror::Error;

pub use messages::{
    Ack, ActionReply, AppDetectedNotice, AuthenticateRequest, ClientMessage, PresetFailure,
    ServerEvent, ServerMessage,
};

/// Errors produced while decoding an inbound frame.
///
/// None of these close the connection; the session answers with
/// `{"action":"error","message":...}` built from the `Display` text.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has neither an \"action\" nor a known \"type\" field")]
    MissingDiscriminant,

    #[error("unsupported message type \"{0}\"")]
    UnknownType(String),

    #[error("action \"{action}\" is missing parameter \"{param}\"")]
    MissingParam { action: String, param: &'static str },

    #[error("action \"{action}\" has an invalid \"{param}\": {reason}")]
    InvalidParam {
        action: String,
        param: &'static str,
        reason: &'static str,
    },
}
