use anyhow::{anyhow, Result};
use tracing::debug;

use biblio_core::traits::Embedder;
use biblio_core::types::{Passage, RetrievedChunk};
use biblio_index::{normalize_l2, FlatIndex};

/// Top-`k` passages for `query`, best first.
///
/// An empty corpus or index yields an empty result: a cold or empty
/// knowledge base answers with "nothing found", never an error. Hit
/// positions that fall outside the corpus (possible only when the
/// artifacts have gone out of step) are dropped rather than surfaced.
/// The result holds at most `k` chunks, fewer when the index is smaller.
pub fn retrieve(
    query: &str,
    index: &FlatIndex,
    embedder: &dyn Embedder,
    corpus: &[Passage],
    k: usize,
) -> Result<Vec<RetrievedChunk>> {
    if corpus.is_empty() || index.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    let mut query_vec = embedder
        .embed_batch(&[query.to_string()])?
        .pop()
        .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
    normalize_l2(&mut query_vec);

    let hits = index.search(&query_vec, k)?;
    debug!(hits = hits.len(), "similarity search finished");
    let chunks = hits
        .into_iter()
        .filter_map(|(position, score)| {
            corpus.get(position).map(|p| RetrievedChunk {
                score,
                text: p.text.clone(),
                source: p.source.clone(),
            })
        })
        .collect();
    Ok(chunks)
}
