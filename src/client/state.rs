//! Debug session state received from a server.
//!
//! Server payloads are untyped, every entity here is reconstructed by looking at which fields
//! are present. All values are immutable copies made per query.

use crate::client::expression::{is_truthy, to_display_string};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};

/// Value of the `target` field that marks a message exchange in progress.
const EXCHANGING_TARGET: &str = "exchanging";

/// Return string itself or its `field` (if value is an object).
fn field_or_string<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    match value {
        Value::String(_) => Some(value),
        Value::Object(fields) => fields.get(field),
        _ => None,
    }
}

fn present(value: Option<&Value>) -> bool {
    value.map(is_truthy).unwrap_or(false)
}

fn display_or_undefined(value: Option<&Value>) -> String {
    value
        .map(to_display_string)
        .unwrap_or_else(|| "undefined".to_string())
}

fn key_value_lines(fields: &Map<String, Value>) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), to_display_string(value)))
        .collect()
}

/// Single entry of a message map: where a message is (or will be) delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Actor {
        target_path: String,
        handler_path: String,
        parameters: Vec<(String, String)>,
    },
    MapReference {
        map_id: String,
    },
    Exchanging,
    /// Unknown target shape, all own fields in server order.
    Opaque(Vec<(String, String)>),
}

impl Target {
    pub fn from_value(value: &Value) -> Self {
        let target = value.get("target");
        let handler = value.get("handler");

        if present(target) && present(handler) {
            let parameters = value
                .get("parameters")
                .and_then(Value::as_object)
                .map(key_value_lines)
                .unwrap_or_default();

            return Target::Actor {
                target_path: display_or_undefined(target.and_then(|t| field_or_string(t, "path"))),
                handler_path: display_or_undefined(
                    handler.and_then(|h| field_or_string(h, "path")),
                ),
                parameters,
            };
        }

        if let Some(map_id) = value.get("messageMapId").filter(|id| is_truthy(id)) {
            return Target::MapReference {
                map_id: display_or_undefined(field_or_string(map_id, "id")),
            };
        }

        let target_path = target
            .and_then(|t| field_or_string(t, "path"))
            .and_then(Value::as_str);
        if target_path == Some(EXCHANGING_TARGET) {
            return Target::Exchanging;
        }

        Target::Opaque(value.as_object().map(key_value_lines).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Display, EnumString)]
pub enum BreakpointMode {
    #[default]
    #[strum(serialize = "point")]
    Point,
    #[strum(serialize = "trace")]
    Trace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub name: String,
    pub active: bool,
    pub break_before: bool,
    pub break_after: bool,
    pub mode: BreakpointMode,
    pub target_id: Option<u64>,
}

impl Breakpoint {
    /// Build a breakpoint from its entry in a state breakpoint table.
    /// Missing flags are treated as `false`.
    pub fn from_value(name: &str, value: Option<&Value>) -> Self {
        let flag = |field: &str| {
            value
                .and_then(|v| v.get(field))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };

        Self {
            name: name.to_string(),
            active: flag("active"),
            break_before: flag("breakBefore"),
            break_after: flag("breakAfter"),
            mode: value
                .and_then(|v| v.get("breakpointMode"))
                .and_then(Value::as_str)
                .and_then(|mode| mode.parse().ok())
                .unwrap_or_default(),
            target_id: value.and_then(|v| v.get("targetId")).and_then(Value::as_u64),
        }
    }
}

/// Message map target with names of attached breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTarget {
    pub target: Target,
    pub breakpoints: Vec<String>,
}

impl MapTarget {
    fn from_value(value: &Value) -> Self {
        Self {
            target: Target::from_value(value),
            breakpoints: value
                .get("breakpoints")
                .and_then(Value::as_array)
                .map(|names| names.iter().map(to_display_string).collect())
                .unwrap_or_default(),
        }
    }
}

/// Server-side snapshot of a map, made by the `make dump` command.
#[derive(Debug, Clone, PartialEq)]
pub struct Dump {
    pub reason: String,
    pub map_index: Option<usize>,
    pub targets: Vec<Target>,
    pub message_content: Value,
}

impl Dump {
    fn from_value(value: &Value) -> Self {
        Self {
            reason: display_or_undefined(value.get("reason")),
            map_index: value
                .get("mapIndex")
                .and_then(Value::as_u64)
                .map(|idx| idx as usize),
            targets: value
                .get("mapTargets")
                .and_then(Value::as_array)
                .map(|targets| targets.iter().map(Target::from_value).collect())
                .unwrap_or_default(),
            message_content: value.get("messageContent").cloned().unwrap_or(Value::Null),
        }
    }

    /// Target at which the dump was captured.
    pub fn current_target(&self) -> Option<&Target> {
        self.map_index.and_then(|idx| self.targets.get(idx))
    }
}

/// Debug session state (`getState` response).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapSnapshot {
    pub targets: Vec<MapTarget>,
    pub cursor: Option<usize>,
    pub finished: bool,
    pub last_exception: Option<Value>,
    pub message_content: Option<Value>,
    pub dumps: Vec<Dump>,
    pub breakpoints: IndexMap<String, Value>,
}

impl MapSnapshot {
    pub fn from_value(state: &Value) -> Self {
        let non_null = |field: &str| state.get(field).filter(|v| !v.is_null()).cloned();

        Self {
            targets: state
                .get("mapTargets")
                .and_then(Value::as_array)
                .map(|targets| targets.iter().map(MapTarget::from_value).collect())
                .unwrap_or_default(),
            cursor: state
                .get("mapIndex")
                .and_then(Value::as_u64)
                .map(|idx| idx as usize),
            finished: state
                .get("finished")
                .map(is_truthy)
                .unwrap_or(false),
            last_exception: non_null("lastDebugException"),
            message_content: non_null("messageContent"),
            dumps: state
                .get("messageDumps")
                .and_then(Value::as_array)
                .map(|dumps| dumps.iter().map(Dump::from_value).collect())
                .unwrap_or_default(),
            breakpoints: state
                .get("breakpoints")
                .and_then(Value::as_object)
                .map(|table| {
                    table
                        .iter()
                        .map(|(name, bp)| (name.clone(), bp.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Return breakpoint by its name, unknown names produce a breakpoint with default flags.
    pub fn breakpoint(&self, name: &str) -> Breakpoint {
        Breakpoint::from_value(name, self.breakpoints.get(name))
    }

    pub fn has_map(&self) -> bool {
        !self.targets.is_empty()
    }
}
