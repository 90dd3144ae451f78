//! Message types for the control-surface WebSocket protocol.
//!
//! Every frame is a JSON text frame holding one object.  The two directions
//! use different discriminants, which the control surface depends on:
//!
//! ```text
//! surface → companion   {"type":"authenticate","pin":"123456"}
//!                       {"action":"undo"}
//! companion → surface   {"type":"auth_required"}
//!                       {"type":"auth_response","success":true,"message":"..."}
//!                       {"type":"app_detected","app":"krita",...}
//!                       {"action":"error","message":"..."}
//!                       {"action":"favorites_data","favorites":{...},"total_assigned":3}
//!                       {"status":"received","action":"undo"}
//! ```
//!
//! Inbound frames are decoded by hand from a `serde_json::Value` because the
//! discriminant may be either field.  Outbound frames are plain serde enums.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::ProtocolError;
use crate::domain::action::ActionRequest;
use crate::domain::app_profile::ToolKind;
use crate::domain::favorites::FavoriteCatalog;
use crate::domain::presets::PresetEntry;

// ── Surface → companion ───────────────────────────────────────────────────────

/// Credentials offered by the control surface.
#[derive(Clone, PartialEq)]
pub struct AuthenticateRequest {
    pub token: Option<String>,
    pub pin: Option<String>,
    /// Free-form device description, logged on success.
    pub client_info: Option<Value>,
}

// Credentials must never reach a log line through `{:?}`.
impl fmt::Debug for AuthenticateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticateRequest")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .field("client_info", &self.client_info)
            .finish()
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Authenticate(AuthenticateRequest),
    Action(ActionRequest),
}

impl ClientMessage {
    /// Decodes one text frame.
    pub fn parse(text: &str) -> Result<ClientMessage, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let msg_type = object.get("type").and_then(Value::as_str).map(str::to_owned);
        match msg_type.as_deref() {
            Some("authenticate") => Ok(ClientMessage::Authenticate(AuthenticateRequest {
                token: credential_field(&object, "token"),
                pin: credential_field(&object, "pin"),
                client_info: object.get("client_info").cloned(),
            })),
            _ if object.contains_key("action") => {
                Ok(ClientMessage::Action(ActionRequest::from_object(object)?))
            }
            Some(other) => Err(ProtocolError::UnknownType(other.to_string())),
            None => Err(ProtocolError::MissingDiscriminant),
        }
    }

    /// Short name for logging; never includes credentials or parameters.
    pub fn kind(&self) -> &str {
        match self {
            ClientMessage::Authenticate(_) => "authenticate",
            ClientMessage::Action(req) => &req.action,
        }
    }
}

/// Reads a credential that may have been sent as a string or a number.
fn credential_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

// ── Companion → surface ───────────────────────────────────────────────────────

/// Session and application events, discriminated by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    AuthRequired,
    AuthResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    AppDetected(AppDetectedNotice),
}

/// Payload of `{"type":"app_detected"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppDetectedNotice {
    /// Wire id (`"krita"`, `"clip_studio_paint"`) or `"none"`.
    pub app: String,
    pub app_name: String,
    pub has_favorites: bool,
    pub supported_tools: Vec<ToolKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<FavoriteCatalog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presets: Option<Vec<PresetEntry>>,
}

/// A preset that could not be given a shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetFailure {
    pub name: String,
    pub reason: String,
}

/// Replies to action requests, discriminated by `"action"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionReply {
    Error {
        message: String,
    },
    FavoritesData {
        favorites: FavoriteCatalog,
        total_assigned: usize,
    },
    PresetsData {
        presets: Vec<PresetEntry>,
        total: usize,
    },
    PresetsInstalled {
        installed: usize,
        failed: Vec<PresetFailure>,
        restart_required: bool,
    },
}

/// Acknowledgement of a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub status: String,
    pub action: String,
}

/// Any outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(ServerEvent),
    Reply(ActionReply),
    Ack(Ack),
}

impl ServerMessage {
    pub fn auth_required() -> Self {
        ServerMessage::Event(ServerEvent::AuthRequired)
    }

    pub fn auth_response(success: bool, message: impl Into<String>) -> Self {
        ServerMessage::Event(ServerEvent::AuthResponse {
            success,
            message: Some(message.into()),
        })
    }

    pub fn app_detected(notice: AppDetectedNotice) -> Self {
        ServerMessage::Event(ServerEvent::AppDetected(notice))
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Reply(ActionReply::Error {
            message: message.into(),
        })
    }

    pub fn received(action: impl Into<String>) -> Self {
        ServerMessage::Ack(Ack {
            status: "received".to_string(),
            action: action.into(),
        })
    }

    /// Serializes to the JSON text of one frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Event(ServerEvent::AuthRequired) => "auth_required",
            ServerMessage::Event(ServerEvent::AuthResponse { .. }) => "auth_response",
            ServerMessage::Event(ServerEvent::AppDetected(_)) => "app_detected",
            ServerMessage::Reply(ActionReply::Error { .. }) => "error",
            ServerMessage::Reply(ActionReply::FavoritesData { .. }) => "favorites_data",
            ServerMessage::Reply(ActionReply::PresetsData { .. }) => "presets_data",
            ServerMessage::Reply(ActionReply::PresetsInstalled { .. }) => "presets_installed",
            ServerMessage::Ack(_) => "received",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_authenticate_with_pin() {
        let msg = ClientMessage::parse(r#"{"type":"authenticate","pin":"123456"}"#).unwrap();
        let ClientMessage::Authenticate(req) = msg else {
            panic!("expected authenticate");
        };
        assert_eq!(req.pin.as_deref(), Some("123456"));
        assert!(req.token.is_none());
    }

    #[test]
    fn test_parse_authenticate_accepts_numeric_pin() {
        let msg = ClientMessage::parse(r#"{"type":"authenticate","pin":654321}"#).unwrap();
        let ClientMessage::Authenticate(req) = msg else {
            panic!("expected authenticate");
        };
        assert_eq!(req.pin.as_deref(), Some("654321"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let req = AuthenticateRequest {
            token: Some("super-secret".to_string()),
            pin: Some("123456".to_string()),
            client_info: None,
        };
        let text = format!("{req:?}");
        assert!(!text.contains("super-secret"));
        assert!(!text.contains("123456"));
    }

    #[test]
    fn test_parse_action() {
        let msg = ClientMessage::parse(r#"{"action":"undo"}"#).unwrap();
        assert_eq!(msg.kind(), "undo");
    }

    #[test]
    fn test_parse_rejects_non_objects_and_bad_json() {
        assert!(matches!(ClientMessage::parse("[1,2]"), Err(ProtocolError::NotAnObject)));
        assert!(matches!(ClientMessage::parse("{oops"), Err(ProtocolError::InvalidJson(_))));
        assert!(matches!(
            ClientMessage::parse(r#"{"hello":1}"#),
            Err(ProtocolError::MissingDiscriminant)
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"ping"}"#),
            Err(ProtocolError::UnknownType(_))
        ));
    }

    #[test]
    fn test_auth_required_serializes_with_type_discriminant() {
        let json = ServerMessage::auth_required().to_json().unwrap();
        assert_eq!(json, r#"{"type":"auth_required"}"#);
    }

    #[test]
    fn test_auth_response_shape() {
        let value = serde_json::to_value(ServerMessage::auth_response(false, "nope")).unwrap();
        assert_eq!(value, json!({"type": "auth_response", "success": false, "message": "nope"}));
    }

    #[test]
    fn test_error_reply_uses_action_discriminant() {
        let value = serde_json::to_value(ServerMessage::error("Unknown action: x")).unwrap();
        assert_eq!(value, json!({"action": "error", "message": "Unknown action: x"}));
    }

    #[test]
    fn test_ack_shape() {
        let value = serde_json::to_value(ServerMessage::received("undo")).unwrap();
        assert_eq!(value, json!({"status": "received", "action": "undo"}));
    }

    #[test]
    fn test_app_detected_omits_absent_catalogs() {
        let notice = AppDetectedNotice {
            app: "krita".to_string(),
            app_name: "Krita".to_string(),
            has_favorites: false,
            supported_tools: vec![ToolKind::Brush, ToolKind::Eraser],
            favorites: None,
            presets: Some(Vec::new()),
        };
        let value = serde_json::to_value(ServerMessage::app_detected(notice)).unwrap();
        assert_eq!(value["type"], "app_detected");
        assert_eq!(value["supported_tools"], json!(["brush", "eraser"]));
        assert!(value.get("favorites").is_none());
        assert_eq!(value["presets"], json!([]));
    }

    #[test]
    fn test_favorites_data_counts_assigned() {
        let reply = ServerMessage::Reply(ActionReply::FavoritesData {
            favorites: FavoriteCatalog::unassigned(),
            total_assigned: 0,
        });
        let value = serde_json::to_value(reply).unwrap();
        assert_eq!(value["action"], "favorites_data");
        assert_eq!(value["favorites"]["F7"]["assigned"], false);
        assert_eq!(value["total_assigned"], 0);
    }
}
