use seekdex_core::{IndexBuilder, IndexConfig, QueryEngine, SearchConfig, SearchHit};
use tempfile::{tempdir, TempDir};

fn corpus() -> Vec<(u64, &'static str, &'static str)> {
    vec![
        (1, "Apple", "apple banana"),
        (2, "Banana", "banana cherry"),
        (3, "Cherry", "apple cherry"),
        (4, "Form", "application form"),
        (5, "Orchard", "An orchard grows [[Apple|apples]] and [[Cherry]] trees."),
        (6, "Cider", "Cider is pressed from [[Apple]]s."),
    ]
}

fn build(config: IndexConfig) -> TempDir {
    let dir = tempdir().unwrap();
    let mut builder = IndexBuilder::create(dir.path(), config).unwrap();
    for (id, title, text) in corpus() {
        builder.index_page(id, title, text).unwrap();
    }
    builder.finish().unwrap();
    dir
}

fn engine(dir: &TempDir) -> QueryEngine {
    QueryEngine::open(dir.path(), SearchConfig::default()).unwrap()
}

fn ids(hits: &[SearchHit]) -> Vec<u64> {
    hits.iter().map(|h| h.doc_id).collect()
}

#[test]
fn three_document_scenario() {
    let dir = tempdir().unwrap();
    let mut builder = IndexBuilder::create(dir.path(), IndexConfig::default()).unwrap();
    builder.index_page(1, "Doc 1", "apple banana").unwrap();
    builder.index_page(2, "Doc 2", "banana cherry").unwrap();
    builder.index_page(3, "Doc 3", "apple cherry").unwrap();
    builder.index_page(4, "Doc 4", "application").unwrap();
    builder.finish().unwrap();
    let engine = engine(&dir);

    assert_eq!(ids(&engine.search("apple", 10, 0).unwrap()), vec![1, 3]);
    assert_eq!(ids(&engine.search("apple AND cherry", 10, 0).unwrap()), vec![3]);
    assert_eq!(ids(&engine.search("apple*", 10, 0).unwrap()), vec![1, 3, 4]);
}

#[test]
fn keyword_query_ranks_by_term_frequency() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    let hits = engine.search("apple", 10, 0).unwrap();
    // doc 5 mentions apple twice, the others tie and fall back to id order
    assert_eq!(ids(&hits), vec![5, 1, 3, 6]);
    assert!(hits.iter().all(|h| h.score.is_some_and(|s| s > 0.0)));
    assert_eq!(hits[1].title, "Apple");
    assert_eq!(hits[1].snippet.as_deref(), Some("apple banana"));
}

#[test]
fn boolean_queries_combine_document_sets() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    assert_eq!(ids(&engine.search("apple AND cherry", 10, 0).unwrap()), vec![3, 5]);
    assert_eq!(ids(&engine.search("banana OR form", 10, 0).unwrap()), vec![1, 2, 4]);
    assert_eq!(ids(&engine.search("apple BUT NOT banana", 10, 0).unwrap()), vec![3, 5, 6]);
    assert_eq!(ids(&engine.search("apple OR cherry BUT NOT banana", 10, 0).unwrap()), vec![3, 5, 6]);
    assert_eq!(ids(&engine.search("orchard trees AND apple*", 10, 0).unwrap()), vec![5]);
    assert!(engine.search("apple AND cherry", 10, 0).unwrap().iter().all(|h| h.score.is_none()));
}

#[test]
fn prefix_query_unions_matching_terms() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    assert_eq!(ids(&engine.search("apple*", 10, 0).unwrap()), vec![1, 3, 4, 5, 6]);
    assert!(engine.search("zzz*", 10, 0).unwrap().is_empty());
}

#[test]
fn phrase_query_requires_adjacent_terms() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    assert_eq!(ids(&engine.search("\"apple banana\"", 10, 0).unwrap()), vec![1]);
    assert!(engine.search("'banana apple'", 10, 0).unwrap().is_empty());
}

#[test]
fn link_query_lists_linking_pages() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    let hits = engine.search("LINKTO Apple", 10, 0).unwrap();
    // ordered by normalized linking title: "cider" before "orchard"
    assert_eq!(ids(&hits), vec![6, 5]);
    assert_eq!(hits[0].title, "Cider");
    assert_eq!(ids(&engine.search("LINKTO cherry", 10, 0).unwrap()), vec![5]);
    assert!(engine.search("LINKTO Nowhere", 10, 0).unwrap().is_empty());
}

#[test]
fn feedback_expands_keyword_queries() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    let plain = ids(&engine.search("banana", 10, 0).unwrap());
    assert_eq!(plain, vec![1, 2]);

    // the top document "Apple" contributes "appl", pulling in pages without "banana"
    let expanded = ids(&engine.search("banana", 10, 1).unwrap());
    assert_eq!(expanded[0], 1);
    assert!(expanded.contains(&3));
    assert!(expanded.len() > plain.len());
}

#[test]
fn punctuation_only_title_does_not_break_link_queries() {
    let dir = tempdir().unwrap();
    let mut builder = IndexBuilder::create(dir.path(), IndexConfig::default()).unwrap();
    builder.index_page(1, "Apple", "apple").unwrap();
    builder.index_page(2, "Orchard", "grows [[Apple]]").unwrap();
    builder.index_page(3, "...", "dots").unwrap();
    builder.finish().unwrap();

    let engine = engine(&dir);
    assert_eq!(ids(&engine.search("LINKTO Apple", 10, 0).unwrap()), vec![2]);
    assert_eq!(engine.handler().doc_id_for_title("Orchard"), Some(2));
    assert_eq!(engine.handler().title(3), Some("..."));
}

#[test]
fn invalid_queries_return_nothing() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    assert!(engine.search("", 10, 0).unwrap().is_empty());
    assert!(engine.search("apple", 0, 0).unwrap().is_empty());
    assert!(engine.search("the and of", 10, 0).unwrap().is_empty());
    assert!(engine.search("''", 10, 0).unwrap().is_empty());
}

#[test]
fn results_are_capped_at_top_k() {
    let dir = build(IndexConfig::default());
    let engine = engine(&dir);
    assert_eq!(engine.search("apple", 2, 0).unwrap().len(), 2);
    assert_eq!(engine.search("apple*", 1, 0).unwrap().len(), 1);
}

#[test]
fn flushing_does_not_change_the_final_index() {
    let whole = build(IndexConfig::default());
    let tiny = IndexConfig { flush_threshold_bytes: 16, ..IndexConfig::default() };
    let flushed = build(tiny);

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(flushed.path().join("meta.json")).unwrap()).unwrap();
    assert!(meta["num_segments"].as_u64().unwrap() > 1);

    for file in ["index.txt", "index_seeklist.bin", "link_index.txt", "texts.txt", "titlesToIds.txt"] {
        assert_eq!(
            std::fs::read(whole.path().join(file)).unwrap(),
            std::fs::read(flushed.path().join(file)).unwrap(),
            "{file} differs"
        );
    }
}
