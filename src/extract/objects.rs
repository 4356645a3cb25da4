//! Database files made of named records (actors, items, skills, ...).

use super::commands::type_name;
use super::{ExtractError, Field, FileReport, TranslateContext};
use crate::job::LogKind;
use crate::path::PathExpr;
use crate::wrap::DESCRIPTION_WIDTH;
use serde_json::Value;
use tracing::debug;

/// Translatable record fields, in processing order
const FIELDS: [&str; 7] = [
    "name",
    "description",
    "profile",
    "message1",
    "message2",
    "message3",
    "message4",
];

fn wrap_width(field: &str) -> Option<usize> {
    matches!(field, "description" | "profile").then_some(DESCRIPTION_WIDTH)
}

fn eligible_fields(record: &serde_json::Map<String, Value>) -> Vec<&'static str> {
    FIELDS
        .into_iter()
        .filter(|field| {
            record
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty())
        })
        .collect()
}

pub async fn translate(
    doc: &mut Value,
    ctx: &TranslateContext<'_>,
) -> Result<FileReport, ExtractError> {
    let mut report = FileReport::default();

    let records = match doc {
        Value::Array(records) => records,
        Value::Object(_) => {
            debug!("Object document has no record list, leaving it unchanged");
            return Ok(report);
        }
        other => {
            return Err(ExtractError::Shape(format!(
                "expected an array of records, found {}",
                type_name(other)
            )))
        }
    };

    if let Some(bad) = records.iter().find(|r| !r.is_null() && !r.is_object()) {
        return Err(ExtractError::Shape(format!(
            "record should be an object, found {}",
            type_name(bad)
        )));
    }

    for (i, record) in records.iter_mut().enumerate() {
        let Some(record) = record.as_object_mut() else {
            continue;
        };

        let fields = eligible_fields(record);
        let total = fields.len();

        for (n, field) in fields.into_iter().enumerate() {
            let Some(raw) = record.get(field).and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };

            let slot = Field {
                kind: LogKind::Object,
                path: PathExpr::new().key("object").index(i).key(field),
                index: n + 1,
                total,
                wrap_width: wrap_width(field),
            };

            if let Some(text) = ctx.translate_field(&mut report, slot, &raw).await {
                if let Some(value) = record.get_mut(field) {
                    *value = Value::String(text);
                }
            }
        }
    }

    Ok(report)
}
