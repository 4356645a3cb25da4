//! On-disk layout of jobs: `{root}/{job_id}/` holds the upload, a
//! `translated/` mirror of the translated files, and the final bundle.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const TRANSLATED_DIR: &str = "translated";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create upload directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a job. Identifiers must be UUIDs so they can never
    /// escape the upload root.
    pub fn job_dir(&self, job_id: &str) -> Result<PathBuf> {
        if uuid::Uuid::parse_str(job_id).is_err() {
            bail!("Invalid job id '{}'", job_id);
        }
        Ok(self.root.join(job_id))
    }

    pub fn translated_dir(&self, job_id: &str) -> Result<PathBuf> {
        Ok(self.job_dir(job_id)?.join(TRANSLATED_DIR))
    }

    /// Store an uploaded file for a job. Zip archives are extracted in place
    /// and removed; anything else is kept as is. On failure nothing of the
    /// job is left on disk.
    pub fn save_upload(&self, job_id: &str, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let job_dir = self.job_dir(job_id)?;
        if let Err(e) = store_upload(&job_dir, job_id, filename, bytes) {
            if let Err(cleanup) = self.remove_job(job_id) {
                warn!("Failed to clean up rejected upload for job {}: {:#}", job_id, cleanup);
            }
            return Err(e);
        }
        Ok(job_dir)
    }

    /// Find a translated file by name anywhere below `translated/`.
    pub fn find_translated(&self, job_id: &str, file_name: &str) -> Result<Option<PathBuf>> {
        if Path::new(file_name).file_name().and_then(|n| n.to_str()) != Some(file_name) {
            return Ok(None);
        }

        let translated = self.translated_dir(job_id)?;
        let direct = translated.join(file_name);
        if direct.is_file() {
            return Ok(Some(direct));
        }

        Ok(WalkDir::new(&translated)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
            .map(|entry| entry.into_path()))
    }

    pub fn remove_job(&self, job_id: &str) -> Result<()> {
        let job_dir = self.job_dir(job_id)?;
        if job_dir.exists() {
            fs::remove_dir_all(&job_dir)
                .with_context(|| format!("Failed to remove {}", job_dir.display()))?;
            debug!("Removed job directory {}", job_dir.display());
        }
        Ok(())
    }
}

fn store_upload(job_dir: &Path, job_id: &str, filename: &str, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(job_dir)
        .with_context(|| format!("Failed to create job directory {}", job_dir.display()))?;

    let filename = sanitize_filename(filename);
    let file_path = job_dir.join(&filename);
    fs::write(&file_path, bytes)
        .with_context(|| format!("Failed to write upload {}", file_path.display()))?;
    info!("Received file {} for job {}", filename, job_id);

    if filename.to_lowercase().ends_with(".zip") {
        extract_archive(&file_path, job_dir)?;
        fs::remove_file(&file_path)
            .with_context(|| format!("Failed to remove archive {}", file_path.display()))?;
        info!("Extracted archive {} for job {}", filename, job_id);
    } else if !filename.to_lowercase().ends_with(".json") {
        info!(
            "Upload {} is neither zip nor json and will be ignored by translation",
            filename
        );
    }
    Ok(())
}

/// Reduce an uploaded filename to a safe final path component.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = unsafe_chars.replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `.json` files directly inside `dir`, sorted by name.
fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Locate the game's data files under a job directory.
///
/// First match wins: `data/*.json`, then `*.json` at the root, then
/// `{only subdirectory}/data/*.json`. The job's own `translated/` output
/// does not count as a subdirectory.
pub fn discover_input_files(job_dir: &Path) -> Result<Vec<PathBuf>> {
    let files = json_files_in(&job_dir.join("data"))?;
    if !files.is_empty() {
        debug!("Found {} files in the data directory", files.len());
        return Ok(files);
    }

    let files = json_files_in(job_dir)?;
    if !files.is_empty() {
        debug!("Found {} files in the job root", files.len());
        return Ok(files);
    }

    let mut subdirs = Vec::new();
    for entry in fs::read_dir(job_dir).with_context(|| format!("Failed to list {}", job_dir.display()))? {
        let path = entry?.path();
        if path.is_dir() && !path.ends_with(TRANSLATED_DIR) {
            subdirs.push(path);
        }
    }

    if let [only] = subdirs.as_slice() {
        let files = json_files_in(&only.join("data"))?;
        if !files.is_empty() {
            debug!("Found {} files in {}/data", files.len(), only.display());
            return Ok(files);
        }
    }

    Ok(Vec::new())
}

/// Parse a JSON file, tolerating a UTF-8 byte-order mark.
pub fn read_json(path: &Path) -> Result<Value> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    serde_json::from_slice(body).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Write pretty-printed JSON, creating parent directories as needed.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

/// Zip every file below `dir` into `dest`, with paths relative to `dir`.
pub fn zip_directory(dir: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name.as_str(), options)
            .with_context(|| format!("Failed to add {} to archive", name))?;
        let data = fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        zip.write_all(&data)
            .with_context(|| format!("Failed to write {} to archive", name))?;
    }

    zip.finish().context("Failed to finish archive")?;
    Ok(dest.to_path_buf())
}

/// Extract a zip archive into `dir`. Entries that would land outside `dir`
/// are rejected.
pub fn extract_archive(archive: &Path, dir: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = ZipArchive::new(file).context("Failed to read zip archive")?;
    zip.extract(dir)
        .with_context(|| format!("Failed to extract {}", archive.display()))
}
