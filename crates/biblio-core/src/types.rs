//! Domain types shared across the retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A bounded excerpt of a source document, the unit of retrieval.
///
/// - `text`: the chunk payload, whitespace-trimmed and never empty
/// - `source`: base name of the file the chunk came from
///
/// Passages are immutable once created; the ordered corpus they form is
/// the ground truth for index positions (vector `i` belongs to passage
/// `i`), so they are only ever replaced wholesale by a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub source: String,
}

/// A passage returned for one query, with its similarity score.
///
/// `score` is the inner product of unit-normalized vectors (equal to
/// cosine similarity); higher is better. Produced per query and never
/// persisted.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub score: f32,
    pub text: String,
    pub source: String,
}

/// A file the ingestor could not use, and why.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything one ingestion pass produced.
///
/// Bad files do not abort ingestion; they end up in `skipped` so callers
/// can report them instead of guessing why passages are missing.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub passages: Vec<Passage>,
    pub skipped: Vec<SkippedFile>,
}
