use anyhow::Result;
use tracing::{info, warn};

use biblio_core::config::Config;
use biblio_core::traits::Embedder;

pub mod hashed;
pub mod remote;

pub use hashed::HashedEmbedder;
pub use remote::{EmbeddingConfig, RemoteEmbedder};

/// Embedding width used when nothing else is configured. The width of
/// MiniLM-class sentence embedding models.
pub const DEFAULT_DIM: usize = 384;

/// Pick the embedder for the current environment.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the offline hashed embedder. A
/// missing `embedding.api_key` also falls back to it, with a warning,
/// since running fully offline is supported.
pub fn default_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    let settings = EmbeddingConfig::from_config(config);
    anyhow::ensure!(settings.dim > 0, "embedding.dim must be positive");
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        info!(dim = settings.dim, "using hashed offline embedder");
        return Ok(Box::new(HashedEmbedder::new(settings.dim)));
    }
    if settings.api_key.is_none() {
        warn!(
            dim = settings.dim,
            "embedding.api_key is not set; falling back to the hashed offline embedder"
        );
        return Ok(Box::new(HashedEmbedder::new(settings.dim)));
    }
    info!(model = %settings.model, "using remote embedding service");
    Ok(Box::new(RemoteEmbedder::new(settings)?))
}
