use biblio_core::traits::Embedder;
use biblio_embed::{HashedEmbedder, DEFAULT_DIM};

#[test]
fn hashed_embedder_shapes_and_determinism() {
    let embedder = HashedEmbedder::new(DEFAULT_DIM);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn different_texts_embed_differently() {
    let embedder = HashedEmbedder::new(64);
    let embs = embedder
        .embed_batch(&["hello world".to_string(), "goodbye moon".to_string()])
        .expect("embed_batch");

    assert_ne!(embs[0], embs[1]);
}

#[test]
fn empty_text_embeds_to_the_zero_vector() {
    let embedder = HashedEmbedder::new(16);
    let embs = embedder.embed_batch(&[String::new()]).expect("embed_batch");

    // No tokens means nothing to normalize; the guard keeps it at zero
    // instead of dividing into NaNs.
    assert_eq!(embs[0], vec![0.0; 16]);
}

#[test]
fn reported_dim_matches_output_width() {
    let embedder = HashedEmbedder::new(32);
    assert_eq!(embedder.dim(), 32);

    let embs = embedder
        .embed_batch(&["one two three".to_string()])
        .expect("embed_batch");
    assert_eq!(embs[0].len(), embedder.dim());
}
