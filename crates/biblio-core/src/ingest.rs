//! Document discovery and text extraction.
//!
//! One bad file never aborts an ingestion pass: unreadable or unparsable
//! files are recorded in [`IngestOutcome::skipped`] and everything else
//! proceeds.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::chunk::{chunk_text, ChunkingConfig};
use crate::types::{IngestOutcome, Passage, SkippedFile};

/// Extensions the ingestor accepts, matched case-insensitively.
const SUPPORTED_EXTENSIONS: [&str; 2] = ["txt", "pdf"];

// pdf-extract separates pages with form feeds in its output.
const PAGE_SEPARATOR: char = '\x0c';

/// Read every supported file under `path` and chunk it into passages.
///
/// `path` may be a single `.txt`/`.pdf` file or a directory, which is
/// scanned non-recursively. Each chunk is tagged with its file's base
/// name as `source`; passages are grouped by file in name order, and
/// within a file in chunk order.
pub fn load_and_chunk(path: &Path, config: &ChunkingConfig) -> Result<IngestOutcome> {
    config.validate()?;
    let mut outcome = IngestOutcome::default();
    let files = discover_files(path, &mut outcome.skipped);
    debug!(path = %path.display(), files = files.len(), "discovered ingestion sources");

    for file in &files {
        match extract_text(file) {
            Ok(text) => {
                let source = base_name(file);
                for chunk in chunk_text(&text, config)? {
                    outcome.passages.push(Passage { text: chunk, source: source.clone() });
                }
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping unreadable file");
                outcome.skipped.push(SkippedFile {
                    path: file.clone(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }
    Ok(outcome)
}

/// Files to ingest under `path`, in deterministic name order.
///
/// A path that is neither a supported file nor a directory yields no
/// files and one skip record, so callers can see why nothing was read.
fn discover_files(path: &Path, skipped: &mut Vec<SkippedFile>) -> Vec<PathBuf> {
    if path.is_file() {
        if is_supported(path) {
            return vec![path.to_path_buf()];
        }
        skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason: "unsupported file type".to_string(),
        });
        return Vec::new();
    }
    if path.is_dir() {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| is_supported(p))
            .collect();
        files.sort();
        return files;
    }
    skipped.push(SkippedFile {
        path: path.to_path_buf(),
        reason: "path does not exist".to_string(),
    });
    Vec::new()
}

fn is_supported(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)),
        None => false,
    }
}

fn extract_text(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => extract_pdf_text(path),
        _ => read_text_file(path),
    }
}

fn read_text_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

/// Per-page text of a PDF, joined with newlines. A page that produced no
/// extractable text contributes an empty line; only a document that fails
/// to parse at all bubbles up as an error (and becomes a skip record).
fn extract_pdf_text(path: &Path) -> Result<String> {
    let raw = pdf_extract::extract_text(path)?;
    let pages: Vec<&str> = raw.split(PAGE_SEPARATOR).map(str::trim_end).collect();
    Ok(pages.join("\n"))
}

fn base_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().to_string(),
    )
}
