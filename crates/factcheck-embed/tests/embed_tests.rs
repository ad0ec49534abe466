use factcheck_core::settings::EmbeddingSettings;
use factcheck_core::traits::Embedder;
use factcheck_embed::{cosine_similarity, default_embedder, l2_normalize, tokens, HashingEmbedder};

#[test]
fn hashing_embedder_shapes_and_determinism() {
    let embedder = default_embedder(&EmbeddingSettings { dim: 256 }).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256, "embedding dim follows settings");
    assert_eq!(embedder.embedder_id(), "hashing:xxh64:d256");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn zero_dim_is_rejected() {
    assert!(default_embedder(&EmbeddingSettings { dim: 0 }).is_err());
    assert!(matches!(HashingEmbedder::new(0), Err(factcheck_core::Error::Configuration(_))));
}

#[test]
fn punctuation_and_case_do_not_change_embedding() {
    let e = HashingEmbedder::new(128).expect("embedder");
    let a = e.embed_text("Global temperature, risen!");
    let b = e.embed_text("global TEMPERATURE risen");
    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
}

#[test]
fn overlapping_texts_score_higher_than_disjoint_ones() {
    let e = HashingEmbedder::new(512).expect("embedder");
    let claim = e.embed_text("sea level rise accelerating");
    let related = e.embed_text("observations show sea level rise is accelerating");
    let unrelated = e.embed_text("volcanic ash grounded flights");
    assert!(cosine_similarity(&claim, &related) > cosine_similarity(&claim, &unrelated));
}

#[test]
fn vector_helpers_handle_degenerate_input() {
    let mut zero = vec![0.0f32; 4];
    l2_normalize(&mut zero);
    assert_eq!(zero, vec![0.0; 4]);
    assert_eq!(cosine_similarity(&zero, &[1.0, 0.0, 0.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    let toks: Vec<String> = tokens("  (Hello), -- world's ").collect();
    assert_eq!(toks, vec!["hello", "world's"]);
}
