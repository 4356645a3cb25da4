//! Map files: `events[].pages[].list[]` command streams.

use super::commands::{self, array_field_mut, classify, type_name, CommandKind, Slot};
use super::{ExtractError, Field, FileReport, TranslateContext};
use crate::job::LogKind;
use crate::path::PathExpr;
use serde_json::Value;

/// Every translatable command of the document, in event/page/list order.
///
/// The position in this list is the ordinal used in `command[n]` paths.
pub(crate) fn eligible_mut(doc: &mut Value) -> Result<Vec<(CommandKind, &mut Value)>, ExtractError> {
    let root = match doc {
        Value::Object(root) => root,
        other => {
            return Err(ExtractError::Shape(format!(
                "expected an object with an 'events' array, found {}",
                type_name(other)
            )))
        }
    };

    let mut all = Vec::new();
    for event in array_field_mut(root, "events")? {
        if event.is_null() {
            continue;
        }
        if !event.is_object() {
            return Err(ExtractError::Shape(format!(
                "event should be an object, found {}",
                type_name(event)
            )));
        }
        let Some(event) = event.as_object_mut() else {
            continue;
        };

        for page in array_field_mut(event, "pages")? {
            if page.is_null() {
                continue;
            }
            if !page.is_object() {
                return Err(ExtractError::Shape(format!(
                    "page should be an object, found {}",
                    type_name(page)
                )));
            }
            let Some(page) = page.as_object_mut() else {
                continue;
            };
            commands::commands_mut(page, &mut all)?;
        }
    }

    Ok(all
        .into_iter()
        .filter_map(|command| classify(command).map(|kind| (kind, command)))
        .collect())
}

/// Translate messages, choices and choice answers of a map.
///
/// `wrap_width` applies to message text only; choices stay on one line.
pub async fn translate(
    doc: &mut Value,
    ctx: &TranslateContext<'_>,
    wrap_width: Option<usize>,
) -> Result<FileReport, ExtractError> {
    let mut report = FileReport::default();

    let work: Vec<(usize, &mut Value, Vec<(Slot, String)>)> = eligible_mut(doc)?
        .into_iter()
        .enumerate()
        .map(|(ordinal, (kind, command))| {
            let slots = commands::slots(kind, command);
            (ordinal, command, slots)
        })
        .filter(|(_, _, slots)| !slots.is_empty())
        .collect();
    let total = work.len();

    for (position, (ordinal, command, slots)) in work.into_iter().enumerate() {
        for (slot, raw) in slots {
            let field = Field {
                kind: LogKind::Dialog,
                path: slot.extend(PathExpr::new().key("command").index(ordinal)),
                index: position + 1,
                total,
                wrap_width: if slot == Slot::Text { wrap_width } else { None },
            };

            if let Some(text) = ctx.translate_field(&mut report, field, &raw).await {
                if let Some(value) = slot.get_mut(command) {
                    *value = Value::String(text);
                }
            }
        }
    }

    Ok(report)
}
