//! `CommonEvents.json`: an array of events, each with its own command list.

use super::commands::{self, classify, type_name, CommandKind, Slot};
use super::{ExtractError, Field, FileReport, TranslateContext};
use crate::job::LogKind;
use crate::path::PathExpr;
use serde_json::Value;

/// Message commands (401) of every common event, in array order.
pub(crate) fn eligible_mut(doc: &mut Value) -> Result<Vec<&mut Value>, ExtractError> {
    let records = match doc {
        Value::Array(records) => records,
        other => {
            return Err(ExtractError::Shape(format!(
                "expected an array of common events, found {}",
                type_name(other)
            )))
        }
    };

    let mut all = Vec::new();
    for record in records.iter_mut() {
        if record.is_null() {
            continue;
        }
        if !record.is_object() {
            return Err(ExtractError::Shape(format!(
                "common event should be an object, found {}",
                type_name(record)
            )));
        }
        let Some(record) = record.as_object_mut() else {
            continue;
        };
        commands::commands_mut(record, &mut all)?;
    }

    Ok(all
        .into_iter()
        .filter(|command| classify(command) == Some(CommandKind::Text))
        .collect())
}

pub async fn translate(
    doc: &mut Value,
    ctx: &TranslateContext<'_>,
) -> Result<FileReport, ExtractError> {
    let mut report = FileReport::default();

    let work: Vec<(usize, &mut Value, String)> = eligible_mut(doc)?
        .into_iter()
        .enumerate()
        .filter_map(|(ordinal, command)| {
            let raw = commands::slots(CommandKind::Text, command)
                .into_iter()
                .next()
                .map(|(_, raw)| raw)?;
            Some((ordinal, command, raw))
        })
        .collect();
    let total = work.len();

    for (position, (ordinal, command, raw)) in work.into_iter().enumerate() {
        let field = Field {
            kind: LogKind::CommonEvent,
            path: Slot::Text.extend(PathExpr::new().key("common_event").index(ordinal)),
            index: position + 1,
            total,
            wrap_width: None,
        };

        if let Some(text) = ctx.translate_field(&mut report, field, &raw).await {
            if let Some(value) = Slot::Text.get_mut(command) {
                *value = Value::String(text);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::testing::{translator, ScriptedProvider};
    use serde_json::json;
    use std::sync::Arc;

    async fn run(
        doc: &mut Value,
        provider: ScriptedProvider,
    ) -> (Result<FileReport, ExtractError>, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let translator = translator(provider.clone());
        let ctx = TranslateContext {
            translator: &translator,
            source: "it",
            target: "en",
        };
        (translate(doc, &ctx).await, provider)
    }

    #[tokio::test]
    async fn test_only_message_commands_are_translated() {
        let mut doc = json!([
            null,
            {"id": 1, "name": "Intro", "list": [
                {"code": 101, "parameters": ["", 0, 0, 2]},
                {"code": 401, "parameters": ["Benvenuto"]},
                {"code": 102, "parameters": [["Sì"], 0]},
                {"code": 0, "parameters": []}
            ]},
            {"id": 2, "name": "Outro", "list": [
                {"code": 401, "parameters": ["Addio"]}
            ]}
        ]);
        let provider = ScriptedProvider::new()
            .reply("Benvenuto", "Welcome")
            .reply("Addio", "Farewell");

        let (report, provider) = run(&mut doc, provider).await;
        let report = report.unwrap();

        assert_eq!(provider.call_count(), 2);
        let paths: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.path.clone().unwrap(), e.index.unwrap(), e.total.unwrap()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("common_event[0].text".to_string(), 1, 2),
                ("common_event[1].text".to_string(), 2, 2),
            ]
        );
        assert!(report.entries.iter().all(|e| e.kind == LogKind::CommonEvent));
        assert_eq!(doc[1]["list"][1]["parameters"][0], "Welcome");
        assert_eq!(doc[1]["list"][2]["parameters"][0], json!(["Sì"]));
        assert_eq!(doc[2]["list"][0]["parameters"][0], "Farewell");
        // Names of common events are not player-facing
        assert_eq!(doc[1]["name"], "Intro");
    }

    #[tokio::test]
    async fn test_null_records_do_not_shift_counts() {
        let mut with_nulls = json!([null, null, {"list": [{"code": 401, "parameters": ["Ciao"]}]}]);
        let mut without = json!([{"list": [{"code": 401, "parameters": ["Ciao"]}]}]);

        let (a, _) = run(&mut with_nulls, ScriptedProvider::new()).await;
        let (b, _) = run(&mut without, ScriptedProvider::new()).await;

        assert_eq!(a.unwrap().entries, b.unwrap().entries);
    }

    #[tokio::test]
    async fn test_failures_and_shapes() {
        let mut doc = json!([{"list": [{"code": 401, "parameters": ["Ciao"]}]}]);
        let (report, _) = run(&mut doc, ScriptedProvider::new().fail_on("Ciao")).await;
        let report = report.unwrap();
        assert_eq!(report.entries[0].kind, LogKind::Anomaly);
        assert_eq!(doc[0]["list"][0]["parameters"][0], "Ciao");

        let (report, _) = run(&mut json!({"list": []}), ScriptedProvider::new()).await;
        assert!(matches!(report, Err(ExtractError::Shape(_))));

        let (report, _) = run(&mut json!([true]), ScriptedProvider::new()).await;
        assert!(report.is_err());
    }
}
