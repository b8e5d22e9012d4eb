use super::*;

#[test]
fn add_assigns_consecutive_positions() {
    let mut index = FlatIndex::new(2);
    index
        .add(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]])
        .expect("should add vectors");

    assert_eq!(index.len(), 3);
    assert_eq!(index.dimension(), 2);
}

#[test]
fn rejects_dimension_mismatch_on_add() {
    let mut index = FlatIndex::new(3);
    let result = index.add(&[vec![1.0, 0.0]]);
    assert!(matches!(result, Err(RagError::Indexing(_))));
}

#[test]
fn rejects_dimension_mismatch_on_search() {
    let index = FlatIndex::new(3);
    let result = index.search(&[1.0], 5);
    assert!(matches!(result, Err(RagError::Retrieval(_))));
}

#[test]
fn exact_match_returns_stored_position_with_zero_distance() {
    let mut index = FlatIndex::new(3);
    index
        .add(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 5.0, 0.0],
            vec![0.0, 0.0, 9.0],
        ])
        .expect("should add vectors");

    let results = index
        .search(&[0.0, 5.0, 0.0], 1)
        .expect("search should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, 1);
    assert!(results[0].1.abs() < f32::EPSILON);
}

#[test]
fn results_are_ascending_by_distance() {
    let mut index = FlatIndex::new(1);
    index
        .add(&[vec![10.0], vec![1.0], vec![5.0], vec![2.0]])
        .expect("should add vectors");

    let results = index.search(&[0.0], 4).expect("search should succeed");

    let positions: Vec<usize> = results.iter().map(|r| r.0).collect();
    assert_eq!(positions, vec![1, 3, 2, 0]);
    for pair in results.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
}

#[test]
fn search_is_bounded_by_k_and_corpus_size() {
    let mut index = FlatIndex::new(1);
    index
        .add(&[vec![1.0], vec![2.0], vec![3.0]])
        .expect("should add vectors");

    assert_eq!(index.search(&[0.0], 2).expect("search ok").len(), 2);
    assert_eq!(index.search(&[0.0], 10).expect("search ok").len(), 3);
    assert!(index.search(&[0.0], 0).expect("search ok").is_empty());
}

#[test]
fn ties_break_by_ascending_position() {
    let mut index = FlatIndex::new(1);
    index
        .add(&[vec![1.0], vec![-1.0], vec![1.0]])
        .expect("should add vectors");

    let results = index.search(&[0.0], 3).expect("search should succeed");
    let positions: Vec<usize> = results.iter().map(|r| r.0).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn empty_index_returns_no_results() {
    let index = FlatIndex::new(4);
    assert!(index
        .search(&[0.0, 0.0, 0.0, 0.0], 5)
        .expect("search ok")
        .is_empty());
}

#[test]
fn survives_serde_round_trip() {
    let mut index = FlatIndex::new(2);
    index
        .add(&[vec![1.0, 2.0], vec![3.0, 4.0]])
        .expect("should add vectors");

    let encoded = serde_json::to_string(&index).expect("should serialize");
    let decoded: FlatIndex = serde_json::from_str(&encoded).expect("should deserialize");
    assert_eq!(decoded, index);
}
