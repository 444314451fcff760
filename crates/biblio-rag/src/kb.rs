//! Knowledge-base lifecycle: cold-start builds and warm-start reloads.
//!
//! Both paths converge to the same serving state: an immutable
//! `(index, corpus, embedder)` triple that answers `retrieve` calls.
//! There is no partially-loaded state: reload is all-or-nothing, and a
//! cache miss of any kind falls back to a full rebuild.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use biblio_core::chunk::ChunkingConfig;
use biblio_core::config::{expand_path, Config};
use biblio_core::ingest::load_and_chunk;
use biblio_core::traits::Embedder;
use biblio_core::types::{Passage, RetrievedChunk, SkippedFile};
use biblio_index::{load_pair, normalize_l2, save_pair, FlatIndex};

/// File names of the paired artifacts inside the cache directory.
pub const INDEX_FILE: &str = "biblio.idx";
pub const CORPUS_FILE: &str = "corpus.json";

// Passages per embedding request during a build.
const EMBED_BATCH_SIZE: usize = 64;

/// Where the knowledge base reads documents and keeps its artifacts.
#[derive(Debug, Clone)]
pub struct KbConfig {
    pub docs_path: PathBuf,
    pub index_path: PathBuf,
    pub corpus_path: PathBuf,
    pub chunking: ChunkingConfig,
}

impl KbConfig {
    pub fn from_config(config: &Config) -> Self {
        let docs_path = expand_path(
            config
                .get::<String>("data.docs_path")
                .unwrap_or_else(|_| "docs".to_string()),
        );
        let cache_dir = expand_path(
            config
                .get::<String>("data.cache_dir")
                .unwrap_or_else(|_| ".biblio".to_string()),
        );
        let chunking = config.get::<ChunkingConfig>("chunking").unwrap_or_default();
        Self {
            docs_path,
            index_path: cache_dir.join(INDEX_FILE),
            corpus_path: cache_dir.join(CORPUS_FILE),
            chunking,
        }
    }
}

/// An immutable, query-ready index/corpus pair with the embedder that
/// produced (and will query) its vector space.
pub struct KnowledgeBase {
    index: FlatIndex,
    corpus: Vec<Passage>,
    embedder: Box<dyn Embedder>,
    skipped: Vec<SkippedFile>,
}

impl KnowledgeBase {
    /// Warm start from the persisted pair when possible, otherwise a
    /// cold-start rebuild. A persisted index whose dimension disagrees
    /// with the embedder is unusable and counts as a cache miss.
    pub fn open_or_build(config: &KbConfig, embedder: Box<dyn Embedder>) -> Result<Self> {
        if let Some((index, corpus)) = load_pair(&config.index_path, &config.corpus_path) {
            if index.dim() == embedder.dim() {
                info!(passages = corpus.len(), "loaded persisted knowledge base");
                return Ok(Self { index, corpus, embedder, skipped: Vec::new() });
            }
            info!(
                index_dim = index.dim(),
                embedder_dim = embedder.dim(),
                "persisted index has the wrong dimension; rebuilding"
            );
        }
        Self::build(config, embedder)
    }

    /// Cold start: ingest the documents, embed, index, persist. A failed
    /// persist is logged and the in-memory state stays fully usable;
    /// only durability is lost.
    ///
    /// An empty corpus is served but never persisted, so the next start
    /// rescans the documents instead of warm-starting from nothing.
    pub fn build(config: &KbConfig, embedder: Box<dyn Embedder>) -> Result<Self> {
        config.chunking.validate()?;
        let outcome = load_and_chunk(&config.docs_path, &config.chunking)?;
        info!(
            passages = outcome.passages.len(),
            skipped = outcome.skipped.len(),
            "ingestion finished"
        );
        let mut kb = Self::from_corpus(outcome.passages, embedder)?;
        kb.skipped = outcome.skipped;
        if kb.corpus.is_empty() {
            return Ok(kb);
        }
        if let Err(e) = save_pair(&kb.index, &kb.corpus, &config.index_path, &config.corpus_path) {
            warn!(error = %e, "could not persist the index pair; continuing in memory");
        }
        Ok(kb)
    }

    /// Index an already-chunked corpus. An empty corpus produces a valid
    /// empty knowledge base of the embedder's dimensionality.
    pub fn from_corpus(corpus: Vec<Passage>, embedder: Box<dyn Embedder>) -> Result<Self> {
        let mut index = FlatIndex::new(embedder.dim());
        if corpus.is_empty() {
            info!("no passages to index; knowledge base starts empty");
            return Ok(Self { index, corpus, embedder, skipped: Vec::new() });
        }

        let texts: Vec<String> = corpus.iter().map(|p| p.text.clone()).collect();
        info!(passages = texts.len(), dim = embedder.dim(), "embedding corpus");
        let pb = ProgressBar::new(texts.len() as u64);
        let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} passages";
        if let Ok(style) = ProgressStyle::with_template(template) {
            pb.set_style(style.progress_chars("#>-"));
        }
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let embedded = embedder.embed_batch(batch)?;
            ensure!(
                embedded.len() == batch.len(),
                "embedder returned {} vectors for {} passages",
                embedded.len(),
                batch.len()
            );
            for mut vector in embedded {
                ensure!(
                    vector.len() == embedder.dim(),
                    "embedder returned a {}-dim vector, expected {}",
                    vector.len(),
                    embedder.dim()
                );
                normalize_l2(&mut vector);
                index.add(&vector)?;
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        Ok(Self { index, corpus, embedder, skipped: Vec::new() })
    }

    /// Top-`k` passages for `query`; empty when the knowledge base is.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        crate::retrieve::retrieve(query, &self.index, self.embedder.as_ref(), &self.corpus, k)
    }

    /// Number of passages in the corpus.
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Number of stored vectors; equals [`Self::len`] by construction.
    pub fn vector_count(&self) -> usize {
        self.index.len()
    }

    /// Files the last build skipped. Empty after a warm start.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }
}
