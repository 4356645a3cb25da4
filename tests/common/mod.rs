//! Helpers shared by the integration test binaries.

#![allow(dead_code)]

use anyhow::Result;
use futures::future::BoxFuture;
use rpgm_translator::job::{JobStatus, JobState};
use rpgm_translator::pipeline::Pipeline;
use rpgm_translator::retry::RetryConfig;
use rpgm_translator::store::{InMemoryStatusStore, StatusStore};
use rpgm_translator::translation::{TextTranslator, TranslationProvider};
use rpgm_translator::workspace::Workspace;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Provider with canned answers. Unknown strings come back as
/// `"{text} ({target})"`; strings marked failing always error.
#[derive(Default)]
pub struct FakeProvider {
    replies: HashMap<String, String>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, text: &str, translated: &str) -> Self {
        self.replies.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TranslationProvider for FakeProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        _source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if self.failing.contains(text) {
                anyhow::bail!("service unavailable");
            }
            Ok(self
                .replies
                .get(text)
                .cloned()
                .unwrap_or_else(|| format!("{} ({})", text, target)))
        })
    }
}

pub fn fast_translator(provider: Arc<FakeProvider>) -> TextTranslator {
    TextTranslator::new(provider).with_retry_config(RetryConfig::fixed(3, Duration::from_millis(1)))
}

/// A pipeline over a temporary upload directory.
pub struct Harness {
    pub temp: TempDir,
    pub store: Arc<InMemoryStatusStore>,
    pub provider: Arc<FakeProvider>,
    pub pipeline: Arc<Pipeline>,
}

impl Harness {
    pub fn new(provider: FakeProvider) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let store = Arc::new(InMemoryStatusStore::new());
        let provider = Arc::new(provider);
        let workspace = Workspace::new(temp.path().join("uploads")).expect("workspace");
        let pipeline = Arc::new(Pipeline::new(
            store.clone(),
            fast_translator(provider.clone()),
            workspace,
        ));
        Self {
            temp,
            store,
            provider,
            pipeline,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.pipeline.workspace()
    }

    /// Upload a file the way the HTTP handler does and return the job id.
    pub fn upload(&self, filename: &str, bytes: &[u8]) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.workspace()
            .save_upload(&job_id, filename, bytes)
            .expect("save upload");
        self.store.put(&job_id, JobStatus::uploaded(filename));
        job_id
    }

    pub fn status(&self, job_id: &str) -> JobStatus {
        self.store.get(job_id)
    }

    pub fn translated_json(&self, job_id: &str, relative: &str) -> serde_json::Value {
        let path = self
            .workspace()
            .translated_dir(job_id)
            .expect("translated dir")
            .join(relative);
        rpgm_translator::workspace::read_json(&path).expect("translated file")
    }
}

/// Build an in-memory zip from `(name, contents)` pairs. Names ending in `/`
/// become directories.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).expect("add dir");
        } else {
            zip.start_file(*name, options).expect("start file");
            zip.write_all(contents.as_bytes()).expect("write file");
        }
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Read one entry of an in-memory zip as a string.
pub fn zip_entry(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut file = archive.by_name(name).ok()?;
    let mut body = String::new();
    file.read_to_string(&mut body).ok()?;
    Some(body)
}

pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();
    names
}

pub fn is_terminal(state: JobState) -> bool {
    matches!(state, JobState::Completed | JobState::Error)
}
