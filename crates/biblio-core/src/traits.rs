/// Maps text to fixed-dimension vectors. The same implementation must
/// embed both the corpus and the queries so the two share one vector
/// space.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// One-shot text completion against an external language model.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
