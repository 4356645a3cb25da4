//! Event command helpers shared by the map and common-event handlers.

use super::ExtractError;
use crate::path::{PathExpr, Segment};
use serde_json::{Map, Value};

pub const CODE_SHOW_TEXT: i64 = 401;
pub const CODE_SHOW_CHOICES: i64 = 102;
pub const CODE_WHEN_CHOICE: i64 = 402;

/// Which kind of translatable command this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// 401: one line of message text in `parameters[0]`
    Text,
    /// 102: list of choices in `parameters[0]`
    Choices,
    /// 402: `[choice index, answer text]`
    Answer,
}

/// Classify a command by code and parameter shape. Anything else is not
/// translatable and does not take part in ordinals.
pub fn classify(command: &Value) -> Option<CommandKind> {
    let code = command.get("code")?.as_i64()?;
    let params = command.get("parameters")?.as_array()?;
    match code {
        CODE_SHOW_TEXT if params.first().is_some_and(Value::is_string) => Some(CommandKind::Text),
        CODE_SHOW_CHOICES if params.first().is_some_and(Value::is_array) => {
            Some(CommandKind::Choices)
        }
        CODE_WHEN_CHOICE if params.len() == 2 && params[1].is_string() => {
            Some(CommandKind::Answer)
        }
        _ => None,
    }
}

/// Position of one string inside a command's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Text,
    Choice(usize),
    Answer,
}

impl Slot {
    /// Path suffix appended after `command[n]` / `common_event[n]`
    pub fn extend(self, path: PathExpr) -> PathExpr {
        match self {
            Slot::Text => path.key("text"),
            Slot::Choice(j) => path.key("choice").index(j),
            Slot::Answer => path.key("answer"),
        }
    }

    pub fn from_segments(segments: &[Segment]) -> Option<Self> {
        match segments {
            [Segment::Key(k)] if k == "text" => Some(Slot::Text),
            [Segment::Key(k)] if k == "answer" => Some(Slot::Answer),
            [Segment::Key(k), Segment::Index(j)] if k == "choice" => Some(Slot::Choice(*j)),
            _ => None,
        }
    }

    pub fn get_mut(self, command: &mut Value) -> Option<&mut Value> {
        let params = command.get_mut("parameters")?.as_array_mut()?;
        match self {
            Slot::Text => params.get_mut(0),
            Slot::Answer => params.get_mut(1),
            Slot::Choice(j) => params.get_mut(0)?.as_array_mut()?.get_mut(j),
        }
    }
}

/// Non-blank strings of a classified command, in parameter order.
pub fn slots(kind: CommandKind, command: &Value) -> Vec<(Slot, String)> {
    let Some(params) = command.get("parameters").and_then(Value::as_array) else {
        return Vec::new();
    };

    let candidates: Vec<(Slot, Option<&str>)> = match kind {
        CommandKind::Text => vec![(Slot::Text, params.first().and_then(Value::as_str))],
        CommandKind::Answer => vec![(Slot::Answer, params.get(1).and_then(Value::as_str))],
        CommandKind::Choices => params
            .first()
            .and_then(Value::as_array)
            .map(|choices| {
                choices
                    .iter()
                    .enumerate()
                    .map(|(j, c)| (Slot::Choice(j), c.as_str()))
                    .collect()
            })
            .unwrap_or_default(),
    };

    candidates
        .into_iter()
        .filter_map(|(slot, text)| match text {
            Some(t) if !t.trim().is_empty() => Some((slot, t.to_string())),
            _ => None,
        })
        .collect()
}

/// Elements of an array-valued field. A missing or null field is empty.
pub fn array_field_mut<'a>(
    owner: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut [Value], ExtractError> {
    match owner.get_mut(key) {
        None | Some(Value::Null) => Ok(&mut []),
        Some(Value::Array(items)) => Ok(items.as_mut_slice()),
        Some(other) => Err(ExtractError::Shape(format!(
            "'{}' should be an array, found {}",
            key,
            type_name(other)
        ))),
    }
}

/// Commands of a `list` field, skipping null placeholders.
pub fn commands_mut<'a>(
    owner: &'a mut Map<String, Value>,
    out: &mut Vec<&'a mut Value>,
) -> Result<(), ExtractError> {
    for command in array_field_mut(owner, "list")? {
        if command.is_null() {
            continue;
        }
        if !command.is_object() {
            return Err(ExtractError::Shape(format!(
                "command should be an object, found {}",
                type_name(command)
            )));
        }
        out.push(command);
    }
    Ok(())
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
