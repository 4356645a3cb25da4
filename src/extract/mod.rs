//! Per-format text extraction and reinsertion.
//!
//! Each handler walks a parsed document of a known shape, translates every
//! eligible string in place and returns one [`LogEntry`] per string touched.
//! Paths in those entries resolve back to the same strings through
//! [`locate_mut`].

pub mod commands;
pub mod common_events;
pub mod dialogs;
pub mod objects;

use crate::job::{LogEntry, LogKind};
use crate::path::{walk_mut, PathError, PathExpr, Segment};
use crate::translation::TextTranslator;
use crate::wrap;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unexpected document shape: {0}")]
    Shape(String),
}

/// Result of translating one document.
#[derive(Debug, Default)]
pub struct FileReport {
    pub entries: Vec<LogEntry>,
    /// Strings translated successfully
    pub translations: usize,
}

/// Which handler a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `Map*.json`: events with pages of commands, dialog wrapping enabled
    Map,
    /// `CommonEvents.json`
    CommonEvents,
    /// Database files holding named records
    Objects,
}

const OBJECT_FILES: [&str; 9] = [
    "Actors.json",
    "Classes.json",
    "Skills.json",
    "Items.json",
    "Weapons.json",
    "Armors.json",
    "Enemies.json",
    "States.json",
    "System.json",
];

impl DocumentKind {
    pub fn for_file_name(name: &str) -> Option<Self> {
        if name.starts_with("Map") && name.ends_with(".json") {
            Some(DocumentKind::Map)
        } else if name == "CommonEvents.json" {
            Some(DocumentKind::CommonEvents)
        } else if OBJECT_FILES.contains(&name) {
            Some(DocumentKind::Objects)
        } else {
            None
        }
    }

    pub async fn translate(
        self,
        doc: &mut Value,
        ctx: &TranslateContext<'_>,
    ) -> Result<FileReport, ExtractError> {
        match self {
            DocumentKind::Map => dialogs::translate(doc, ctx, Some(wrap::DIALOG_WIDTH)).await,
            DocumentKind::CommonEvents => common_events::translate(doc, ctx).await,
            DocumentKind::Objects => objects::translate(doc, ctx).await,
        }
    }
}

/// Translator plus language pair for one job.
pub struct TranslateContext<'a> {
    pub translator: &'a TextTranslator,
    pub source: &'a str,
    pub target: &'a str,
}

/// Where a string sits and how it is reported.
pub(crate) struct Field {
    pub kind: LogKind,
    pub path: PathExpr,
    pub index: usize,
    pub total: usize,
    pub wrap_width: Option<usize>,
}

impl TranslateContext<'_> {
    /// Translate `raw`, record the outcome, and return the text to write back.
    /// `None` means the original stays in place.
    pub(crate) async fn translate_field(
        &self,
        report: &mut FileReport,
        field: Field,
        raw: &str,
    ) -> Option<String> {
        let outcome = self.translator.translate(raw, self.source, self.target).await;
        let path = field.path.to_string();

        if !outcome.succeeded {
            report
                .entries
                .push(LogEntry::anomaly(path, field.index, field.total, raw));
            return None;
        }

        let text = match field.wrap_width {
            Some(width) => wrap::wrap(&outcome.text, width),
            None => outcome.text,
        };

        report.translations += 1;
        report.entries.push(LogEntry::translated(
            field.kind,
            path,
            field.index,
            field.total,
            raw,
            &text,
        ));
        Some(text)
    }
}

/// Resolve a logged path to the string it addresses.
///
/// Handler-emitted paths (`object[i].field`, `command[n]...`,
/// `common_event[n].text`) are mapped with the handlers' own eligibility
/// rules; any other path is walked literally.
pub fn locate_mut<'a>(doc: &'a mut Value, path: &PathExpr) -> Result<&'a mut Value, PathError> {
    match path.segments() {
        [Segment::Key(root), Segment::Index(i), Segment::Key(field)] if root == "object" => doc
            .as_array_mut()
            .and_then(|records| records.get_mut(*i))
            .and_then(Value::as_object_mut)
            .and_then(|record| record.get_mut(field.as_str()))
            .ok_or_else(|| path.unresolved(format!("no record field '{}' at {}", field, i))),
        [Segment::Key(root), Segment::Index(n), rest @ ..] if root == "command" => {
            let slot = commands::Slot::from_segments(rest)
                .ok_or_else(|| path.unresolved("unknown command slot"))?;
            let command = dialogs::eligible_mut(doc)
                .map_err(|e| path.unresolved(e.to_string()))?
                .into_iter()
                .nth(*n)
                .map(|(_, command)| command)
                .ok_or_else(|| path.unresolved(format!("no dialog command {}", n)))?;
            slot.get_mut(command)
                .ok_or_else(|| path.unresolved("command has no such parameter"))
        }
        [Segment::Key(root), Segment::Index(n), Segment::Key(slot)]
            if root == "common_event" && slot == "text" =>
        {
            let command = common_events::eligible_mut(doc)
                .map_err(|e| path.unresolved(e.to_string()))?
                .into_iter()
                .nth(*n)
                .ok_or_else(|| path.unresolved(format!("no common event command {}", n)))?;
            commands::Slot::Text
                .get_mut(command)
                .ok_or_else(|| path.unresolved("command has no text parameter"))
        }
        segments => walk_mut(doc, segments, path),
    }
}
