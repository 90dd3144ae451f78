//! The closed vocabulary of control-surface commands.
//!
//! An inbound `{action, value?}` message decodes into exactly one [`Action`].
//! Names the server does not know become [`Action::Unrecognized`] so the
//! session can answer with an error instead of dropping the connection;
//! known names with unusable parameters are a [`ProtocolError`].
//!
//! # Parameter forms
//!
//! The control surface has sent parameters three different ways over time,
//! all of which are accepted:
//!
//! ```text
//! {"action": "zoom", "value": {"direction": "in"}}     JSON object
//! {"action": "zoom", "value": "{direction=in}"}        legacy key=value string
//! {"action": "zoom", "direction": "in"}                top-level fields
//! ```
//!
//! A bare scalar `value` (`{"action": "brush_size", "value": 5}`) is stored
//! under the key `value` and used by actions with one obvious parameter.

use serde_json::{Map, Value};

use super::app_profile::ToolKind;
use super::favorites::FAVORITE_SLOT_COUNT;
use crate::protocol::ProtocolError;

/// Repetitions of `layer_down` used to reach the first layer.
pub const LAYER_GOTO_FIRST_STEPS: u32 = 20;

/// Upper bound on repeated brush-size key presses from one command.
pub const MAX_BRUSH_SIZE_STEPS: u32 = 10;

/// Default scroll magnitude in wheel notches.
pub const DEFAULT_SCROLL_AMOUNT: u32 = 3;

/// Default canvas pan distance in pixels.
pub const DEFAULT_PAN_DISTANCE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Direction for scrolling and panning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn from_name(name: &str) -> Option<Direction> {
        match name.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit pointer vector for this direction (screen coordinates, y down).
    pub fn unit_vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOp {
    New,
    Delete,
    Duplicate,
    Folder,
    Merge,
    Up,
    Down,
    GotoFirst,
}

impl LayerOp {
    fn from_name(name: &str) -> Option<LayerOp> {
        let op = match name.trim().to_ascii_lowercase().as_str() {
            "new" | "add" => LayerOp::New,
            "delete" | "remove" => LayerOp::Delete,
            "duplicate" => LayerOp::Duplicate,
            "folder" | "group" => LayerOp::Folder,
            "merge" | "merge_down" => LayerOp::Merge,
            "up" | "next" => LayerOp::Up,
            "down" | "previous" => LayerOp::Down,
            "goto_first" | "first" => LayerOp::GotoFirst,
            _ => return None,
        };
        Some(op)
    }

    /// Key of this operation in a profile's shortcut table.
    pub fn shortcut_name(self) -> &'static str {
        match self {
            LayerOp::New => "layer_new",
            LayerOp::Delete => "layer_delete",
            LayerOp::Duplicate => "layer_duplicate",
            LayerOp::Folder => "layer_folder",
            LayerOp::Merge => "layer_merge",
            LayerOp::Up => "layer_up",
            LayerOp::Down | LayerOp::GotoFirst => "layer_down",
        }
    }
}

/// A decoded control-surface command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Zoom(ZoomDirection),
    Rotate(RotateDirection),
    ResetCanvas,
    Undo,
    Redo,
    Tool(ToolKind),
    Layer(LayerOp),
    /// Signed step count; positive grows the brush.
    BrushSize(i32),
    /// A raw combo string, parsed against the host platform by the router.
    KeyCombo(String),
    /// Clip Studio Paint favorite slot, 1-based.
    SelectFavorite(u8),
    /// Krita preset by name.
    SelectPreset(String),
    Scroll {
        direction: Direction,
        amount: u32,
    },
    PointerDelta {
        dx: i32,
        dy: i32,
    },
    CanvasPan {
        direction: Direction,
        distance: i32,
    },
    GetFavorites,
    GetPresets,
    InstallPresetShortcuts,
    Unrecognized(String),
}

impl Action {
    /// Returns `true` for actions answered with data rather than injected input.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Action::GetFavorites | Action::GetPresets | Action::InstallPresetShortcuts
        )
    }
}

/// An inbound action message with its parameters flattened into one map.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub action: String,
    pub params: Map<String, Value>,
}

impl ActionRequest {
    /// Builds a request from the message object, which must contain `action`.
    pub fn from_object(mut object: Map<String, Value>) -> Result<Self, ProtocolError> {
        let action = match object.remove("action") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(ProtocolError::MissingDiscriminant),
        };

        let value = object.remove("value");
        let mut params = object;
        match value {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => params.extend(map),
            Some(Value::String(s)) if s.trim_start().starts_with('{') => {
                params.extend(parse_legacy_params(&s));
            }
            Some(other) => {
                params.insert("value".to_string(), other);
            }
        }
        Ok(Self { action, params })
    }

    /// Decodes the request into an [`Action`].
    pub fn decode(&self) -> Result<Action, ProtocolError> {
        let name = self.action.to_ascii_lowercase();
        let action = match name.as_str() {
            "zoom" => {
                let dir = self.required_str(&["direction", "value"])?;
                Action::Zoom(self.zoom_direction("direction", &dir)?)
            }
            "zoom_in" => Action::Zoom(ZoomDirection::In),
            "zoom_out" => Action::Zoom(ZoomDirection::Out),
            "rotate" => Action::Rotate(self.rotate_direction()?),
            "rotate_left" => Action::Rotate(RotateDirection::Left),
            "rotate_right" => Action::Rotate(RotateDirection::Right),
            "reset_canvas" | "rotate_reset" => Action::ResetCanvas,
            "undo" => Action::Undo,
            "redo" => Action::Redo,
            "tool" => {
                let tool = self.required_str(&["name", "tool", "value"])?;
                Action::Tool(self.tool_kind("name", &tool)?)
            }
            "layer" => {
                let op = self.required_str(&["action", "op", "value"])?;
                Action::Layer(self.layer_op("action", &op)?)
            }
            "brush_size" => Action::BrushSize(self.required_i64(&["delta", "value"])?.clamp(
                i64::from(i32::MIN),
                i64::from(i32::MAX),
            ) as i32),
            "brush_size_up" => Action::BrushSize(1),
            "brush_size_down" => Action::BrushSize(-1),
            "key_combo" | "shortcut" => {
                Action::KeyCombo(self.required_str(&["keys", "combo", "value"])?)
            }
            "select_favorite" => Action::SelectFavorite(self.favorite_slot()?),
            "select_brush" | "select_subtool" | "select_tool" => self.decode_select()?,
            "select_preset" => Action::SelectPreset(self.required_str(&["name", "preset", "value"])?),
            "scroll" => {
                let dir = self.required_str(&["direction", "value"])?;
                let amount = match self.optional_i64(&["amount"])? {
                    Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
                    Some(_) => return Err(self.invalid("amount", "must be positive")),
                    None => DEFAULT_SCROLL_AMOUNT,
                };
                Action::Scroll {
                    direction: self.direction("direction", &dir)?,
                    amount,
                }
            }
            "pointer_delta" | "mouse_move" => Action::PointerDelta {
                dx: self.required_i32(&["dx"])?,
                dy: self.required_i32(&["dy"])?,
            },
            "canvas_pan" | "pan" => {
                let dir = self.required_str(&["direction", "value"])?;
                let distance = match self.optional_i64(&["distance"])? {
                    Some(n) => i32::try_from(n).map_err(|_| self.invalid("distance", "out of range"))?,
                    None => DEFAULT_PAN_DISTANCE,
                };
                Action::CanvasPan {
                    direction: self.direction("direction", &dir)?,
                    distance,
                }
            }
            "get_favorites" => Action::GetFavorites,
            "get_presets" => Action::GetPresets,
            "install_preset_shortcuts" => Action::InstallPresetShortcuts,
            other => decode_prefixed(other).unwrap_or_else(|| Action::Unrecognized(self.action.clone())),
        };
        Ok(action)
    }

    fn decode_select(&self) -> Result<Action, ProtocolError> {
        if let Some(slot) = self.find(&["subtool_uuid", "slot"]) {
            return match slot_from_value(slot) {
                Some(n) => Ok(Action::SelectFavorite(n)),
                None => Err(self.invalid("slot", "expected F1..F12")),
            };
        }
        let group = self.required_str(&["group", "tool", "name", "value"])?;
        if let Some(n) = slot_from_str(&group) {
            return Ok(Action::SelectFavorite(n));
        }
        Ok(Action::Tool(self.tool_kind("group", &group)?))
    }

    fn favorite_slot(&self) -> Result<u8, ProtocolError> {
        let value = self
            .find(&["slot", "value"])
            .ok_or_else(|| self.missing("slot"))?;
        slot_from_value(value).ok_or_else(|| self.invalid("slot", "expected 1..12 or F1..F12"))
    }

    fn rotate_direction(&self) -> Result<RotateDirection, ProtocolError> {
        if let Some(v) = self.find(&["degrees", "angle"]) {
            let degrees = v
                .as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
                .ok_or_else(|| self.invalid("degrees", "expected a number"))?;
            return if degrees > 0.0 {
                Ok(RotateDirection::Right)
            } else if degrees < 0.0 {
                Ok(RotateDirection::Left)
            } else {
                Err(self.invalid("degrees", "must be non-zero"))
            };
        }
        let dir = self.required_str(&["direction", "value"])?;
        match dir.to_ascii_lowercase().as_str() {
            "left" | "ccw" | "counterclockwise" => Ok(RotateDirection::Left),
            "right" | "cw" | "clockwise" => Ok(RotateDirection::Right),
            _ => Err(self.invalid("direction", "expected left or right")),
        }
    }

    fn zoom_direction(&self, param: &'static str, text: &str) -> Result<ZoomDirection, ProtocolError> {
        match text.to_ascii_lowercase().as_str() {
            "in" | "+" => Ok(ZoomDirection::In),
            "out" | "-" => Ok(ZoomDirection::Out),
            _ => Err(self.invalid(param, "expected in or out")),
        }
    }

    fn direction(&self, param: &'static str, text: &str) -> Result<Direction, ProtocolError> {
        Direction::from_name(text).ok_or_else(|| self.invalid(param, "expected up, down, left or right"))
    }

    fn tool_kind(&self, param: &'static str, text: &str) -> Result<ToolKind, ProtocolError> {
        ToolKind::from_name(text).ok_or_else(|| self.invalid(param, "unknown tool"))
    }

    fn layer_op(&self, param: &'static str, text: &str) -> Result<LayerOp, ProtocolError> {
        LayerOp::from_name(text).ok_or_else(|| self.invalid(param, "unknown layer operation"))
    }

    // ── Parameter access ─────────────────────────────────────────────────────

    fn find(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.params.get(*k))
            .find(|v| !v.is_null())
    }

    fn required_str(&self, keys: &[&'static str]) -> Result<String, ProtocolError> {
        let value = self.find(keys).ok_or_else(|| self.missing(keys[0]))?;
        match value {
            Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.invalid(keys[0], "expected a string")),
        }
    }

    fn optional_i64(&self, keys: &[&'static str]) -> Result<Option<i64>, ProtocolError> {
        match self.find(keys) {
            None => Ok(None),
            Some(v) => value_as_i64(v)
                .map(Some)
                .ok_or_else(|| self.invalid(keys[0], "expected an integer")),
        }
    }

    fn required_i64(&self, keys: &[&'static str]) -> Result<i64, ProtocolError> {
        self.optional_i64(keys)?.ok_or_else(|| self.missing(keys[0]))
    }

    fn required_i32(&self, keys: &[&'static str]) -> Result<i32, ProtocolError> {
        let n = self.required_i64(keys)?;
        i32::try_from(n).map_err(|_| self.invalid(keys[0], "out of range"))
    }

    fn missing(&self, param: &'static str) -> ProtocolError {
        ProtocolError::MissingParam {
            action: self.action.clone(),
            param,
        }
    }

    fn invalid(&self, param: &'static str, reason: &'static str) -> ProtocolError {
        ProtocolError::InvalidParam {
            action: self.action.clone(),
            param,
            reason,
        }
    }
}

/// Single-word actions of the form `tool_<name>` and `layer_<op>`.
fn decode_prefixed(name: &str) -> Option<Action> {
    if let Some(tool) = name.strip_prefix("tool_") {
        return ToolKind::from_name(tool).map(Action::Tool);
    }
    if let Some(op) = name.strip_prefix("layer_") {
        return LayerOp::from_name(op).map(Action::Layer);
    }
    None
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn slot_from_value(value: &Value) -> Option<u8> {
    match value {
        Value::String(s) => slot_from_str(s),
        other => value_as_i64(other)
            .and_then(|n| u8::try_from(n).ok())
            .filter(|n| (1..=FAVORITE_SLOT_COUNT).contains(n)),
    }
}

/// Accepts `"F5"`, `"f5"` or `"5"`.
fn slot_from_str(text: &str) -> Option<u8> {
    let text = text.trim();
    let digits = text
        .strip_prefix('F')
        .or_else(|| text.strip_prefix('f'))
        .unwrap_or(text);
    digits
        .parse::<u8>()
        .ok()
        .filter(|n| (1..=FAVORITE_SLOT_COUNT).contains(n))
}

/// Parses the legacy `"{key=value, key2=value2}"` parameter string.
///
/// Values that parse as integers become JSON numbers; everything else stays a
/// string.  Malformed pairs are skipped.
pub fn parse_legacy_params(text: &str) -> Map<String, Value> {
    let inner = text
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}');
    let mut params = Map::new();
    for pair in inner.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"');
        if key.is_empty() {
            continue;
        }
        let json = match value.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(value.to_string()),
        };
        params.insert(key.to_string(), json);
    }
    params
}
