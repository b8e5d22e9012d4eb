use super::*;
use anyhow::Result as AnyResult;

/// Embedder with a fixed lookup table so distances are fully predictable.
struct TableEmbedder;

impl Embedder for TableEmbedder {
    fn embed_batch(&self, texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| match t.as_str() {
                "near origin" => Ok(vec![0.1, 0.0]),
                "on x axis" => Ok(vec![1.0, 0.0]),
                _ => Ok(vec![0.0, 0.0]),
            })
            .collect()
    }

    fn model_id(&self) -> &str {
        "table-test-model"
    }
}

fn meta(
    complaint_id: &str,
    product: Option<&str>,
    market: Option<&str>,
    text: &str,
) -> ChunkMetadata {
    ChunkMetadata {
        complaint_id: complaint_id.to_string(),
        product: product.map(str::to_string),
        market: market.map(str::to_string),
        date: None,
        channel: None,
        severity: None,
        raw_text: text.to_string(),
        raw_text_length: text.chars().count(),
    }
}

/// Corpus of four chunks at increasing distance from the origin.
fn test_corpus() -> Corpus {
    let mut corpus = Corpus::new(2, "table-test-model");
    corpus
        .append(
            &[
                vec![0.0, 0.1],
                vec![0.0, 0.2],
                vec![0.0, 0.3],
                vec![0.0, 0.4],
            ],
            vec![
                meta("C-1", Some("Credit Cards"), Some("Uganda"), "chunk one"),
                meta("C-2", Some("BNPL"), None, "chunk two"),
                meta("C-3", Some("Credit Cards"), Some("Kenya"), "chunk three"),
                meta("C-4", None, None, "chunk four"),
            ],
        )
        .expect("should append");
    corpus
}

fn filters(pairs: &[(&str, &str)]) -> Filters {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn returns_at_most_k_in_ascending_distance_order() {
    let corpus = test_corpus();
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let chunks = retriever
        .retrieve("anything", 3, &Filters::new())
        .expect("should retrieve");

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].metadata.complaint_id, "C-1");
    for pair in chunks.windows(2) {
        assert!(pair[0].score <= pair[1].score);
    }
}

#[test]
fn absent_filter_key_does_not_exclude_a_chunk() {
    let corpus = test_corpus();
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let chunks = retriever
        .retrieve("anything", 4, &filters(&[("market", "Kenya")]))
        .expect("should retrieve");

    let ids: Vec<&str> = chunks
        .iter()
        .map(|c| c.metadata.complaint_id.as_str())
        .collect();

    // C-2 and C-4 have no market field and are kept; C-3 matches Kenya;
    // C-1 is Uganda and is the only exclusion.
    assert!(ids.contains(&"C-2"));
    assert!(ids.contains(&"C-3"));
    assert!(ids.contains(&"C-4"));
    assert!(!ids.contains(&"C-1"));
}

#[test]
fn mismatched_filter_value_excludes_a_chunk() {
    let corpus = test_corpus();
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let chunks = retriever
        .retrieve("anything", 4, &filters(&[("product", "Credit Cards")]))
        .expect("should retrieve");

    let ids: Vec<&str> = chunks
        .iter()
        .map(|c| c.metadata.complaint_id.as_str())
        .collect();

    // C-2 is explicitly BNPL and excluded; C-4 has no product and is kept.
    assert_eq!(ids, vec!["C-1", "C-3", "C-4"]);
}

#[test]
fn over_fetch_fills_k_past_filtered_out_nearest_neighbors() {
    let corpus = test_corpus();
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    // Nearest chunk (C-1, Uganda) fails the filter; the over-fetched set
    // still yields one accepted chunk.
    let chunks = retriever
        .retrieve("anything", 1, &filters(&[("market", "Kenya")]))
        .expect("should retrieve");

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.complaint_id, "C-2");
}

#[test]
fn under_fill_is_not_an_error() {
    let corpus = test_corpus();
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let chunks = retriever
        .retrieve("anything", 4, &filters(&[("product", "Nonexistent")]))
        .expect("should retrieve");

    // Only the untagged chunk survives
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.complaint_id, "C-4");
}

#[test]
fn empty_corpus_returns_no_chunks() {
    let corpus = Corpus::new(2, "table-test-model");
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let chunks = retriever
        .retrieve("anything", 5, &Filters::new())
        .expect("should retrieve");
    assert!(chunks.is_empty());
}

#[test]
fn embedding_failure_maps_to_retrieval_error() {
    struct FailingEmbedder;
    impl Embedder for FailingEmbedder {
        fn embed_batch(&self, _texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
            Err(anyhow::anyhow!("connection refused"))
        }
        fn model_id(&self) -> &str {
            "failing-model"
        }
    }

    let corpus = test_corpus();
    let embedder = FailingEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let result = retriever.retrieve("anything", 3, &Filters::new());
    assert!(matches!(result, Err(RagError::Retrieval(_))));
}

#[test]
fn retrieved_chunk_text_matches_metadata_raw_text() {
    let corpus = test_corpus();
    let embedder = TableEmbedder;
    let retriever = Retriever::new(&corpus, &embedder);

    let chunks = retriever
        .retrieve("anything", 1, &Filters::new())
        .expect("should retrieve");
    assert_eq!(chunks[0].text, chunks[0].metadata.raw_text);
}
