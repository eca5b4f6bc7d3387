use std::sync::Arc;

use lapsearch_core::catalog::Catalog;
use lapsearch_core::config::{ScoreNormalization, SearchSettings};
use lapsearch_core::traits::{CandidateStore, Reranker};
use lapsearch_core::{Error, LaptopFields, Stage};
use lapsearch_embed::{FakeEmbedder, FakeReranker};
use lapsearch_hybrid::{HybridSearchEngine, SearchOptions};
use lapsearch_query::RegexQueryParser;
use lapsearch_text::TfIdfRetriever;
use lapsearch_vector::{LanceStore, MemoryStore, ProvisionOptions, ProvisionOutcome};

const DIM: usize = 128;
const QUERY: &str = "16GB RAM laptop with Intel processor under 60000";

#[allow(clippy::too_many_arguments)]
fn laptop(company: &str, type_name: &str, ram: u32, cpu: &str, ssd: u32, hdd: u32, gpu: &str, os: &str, price: f64) -> LaptopFields {
    LaptopFields {
        company: Some(company.into()),
        type_name: Some(type_name.into()),
        ram_gb: Some(ram),
        cpu_brand: Some(cpu.into()),
        ssd_gb: ssd,
        hdd_gb: hdd,
        gpu_brand: Some(gpu.into()),
        os: Some(os.into()),
        price: Some(price),
    }
}

fn catalog() -> Catalog {
    Catalog::from_fields(vec![
        laptop("Dell", "Notebook", 16, "Intel", 512, 0, "Nvidia", "Windows", 55000.0),
        laptop("HP", "Notebook", 8, "AMD", 256, 0, "AMD", "Windows", 45000.0),
        laptop("Asus", "Ultrabook", 8, "AMD", 512, 0, "AMD", "Windows", 65000.0),
        laptop("Lenovo", "Gaming", 16, "Intel", 512, 0, "Nvidia", "Windows", 90000.0),
        laptop("Acer", "Notebook", 4, "AMD", 0, 1000, "AMD", "Linux", 25000.0),
    ])
}

fn engine_with<S: CandidateStore>(store: S, reranker: Box<dyn Reranker>, cat: Catalog, settings: SearchSettings) -> HybridSearchEngine<TfIdfRetriever, S> {
    HybridSearchEngine::new(
        TfIdfRetriever,
        store,
        Box::new(FakeEmbedder::new(DIM)),
        reranker,
        Box::new(RegexQueryParser::new().expect("patterns")),
        Arc::new(cat),
        settings,
    )
}

fn provisioned(reranker: Box<dyn Reranker>) -> HybridSearchEngine<TfIdfRetriever, MemoryStore> {
    let engine = engine_with(MemoryStore::new(DIM), reranker, catalog(), SearchSettings::default());
    engine.provision(&ProvisionOptions::default()).expect("provision");
    engine
}

struct FailingReranker;
impl Reranker for FailingReranker {
    fn batch_score(&self, _pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> { Err(anyhow::anyhow!("model crashed")) }
}

struct ShortReranker;
impl Reranker for ShortReranker {
    fn batch_score(&self, _pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> { Ok(vec![1.0]) }
}

#[test]
fn ram_and_cpu_query_surfaces_matching_laptops() {
    let engine = provisioned(Box::new(FakeReranker));
    let response = engine.search(QUERY, &engine.default_options()).expect("search");

    assert!(response.query_sentence.contains("16 GB of RAM and a Intel processor"));
    assert_eq!(response.fields.price, Some(60000.0));
    assert!(response.results.len() <= 5);
    assert!(response.is_relevant());
    for r in &response.results[..2] {
        assert!(r.text.contains("16 GB of RAM"), "{}", r.text);
        assert!(r.text.contains("Intel processor"), "{}", r.text);
    }
}

#[test]
fn results_are_bounded_sorted_and_deterministic() {
    let engine = provisioned(Box::new(FakeReranker));
    let opts = engine.default_options().with_limit(3);
    let first = engine.search(QUERY, &opts).unwrap();
    let second = engine.search(QUERY, &opts).unwrap();
    assert_eq!(first.results.len(), 3);
    assert!(first.results.windows(2).all(|w| w[0].final_score >= w[1].final_score));
    assert_eq!(first.results, second.results);
}

#[test]
fn alpha_zero_ranks_by_lexical_score_only() {
    let engine = provisioned(Box::new(FakeReranker));
    let opts = engine.default_options().with_alpha(0.0);
    let response = engine.search("Lenovo Gaming laptop", &opts).unwrap();
    assert!(response.results[0].text.starts_with("The Lenovo Gaming"));
    assert!(response.results.iter().all(|r| (0.0..=1.0 + 1e-6).contains(&r.final_score)));
}

#[test]
fn query_matching_no_field_still_runs() {
    let engine = provisioned(Box::new(FakeReranker));
    let response = engine.search("something light for travel", &engine.default_options()).unwrap();
    assert_eq!(response.fields, LaptopFields::default());
    assert!(response.query_sentence.contains("N/A"));
    assert!(!response.results.is_empty());
}

#[test]
fn floor_flags_irrelevant_results() {
    let settings = SearchSettings { relevance_floor: 50.0, ..SearchSettings::default() };
    let engine = engine_with(MemoryStore::new(DIM), Box::new(FakeReranker), catalog(), settings);
    engine.provision(&ProvisionOptions::default()).unwrap();
    let response = engine.search(QUERY, &engine.default_options()).unwrap();
    assert!(!response.results.is_empty());
    assert!(!response.is_relevant());
}

#[test]
fn reranker_failure_is_retryable_without_fallback() {
    let engine = provisioned(Box::new(FailingReranker));
    let err = engine.search(QUERY, &engine.default_options()).unwrap_err();
    assert!(matches!(err, Error::RerankerUnavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(err.failed_stage(), Some(Stage::Rerank));

    let short = provisioned(Box::new(ShortReranker));
    assert!(matches!(short.search(QUERY, &short.default_options()), Err(Error::RerankerUnavailable(_))));
}

#[test]
fn embedder_width_must_match_index() {
    let store = MemoryStore::new(DIM * 2);
    store.ensure_index().unwrap();
    let engine = engine_with(store, Box::new(FakeReranker), catalog(), SearchSettings::default());
    let err = engine.search(QUERY, &engine.default_options()).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected, actual } if expected == DIM * 2 && actual == DIM));
}

#[test]
fn empty_corpus_fails_fast() {
    let engine = engine_with(MemoryStore::new(DIM), Box::new(FakeReranker), Catalog::default(), SearchSettings::default());
    assert_eq!(engine.provision(&ProvisionOptions::default()).unwrap(), ProvisionOutcome::Created { loaded: 0 });
    assert!(matches!(engine.search(QUERY, &engine.default_options()), Err(Error::EmptyCorpus)));
}

#[test]
fn single_document_corpus_is_searchable() {
    let cat = Catalog::from_fields(vec![laptop("Dell", "Notebook", 16, "Intel", 512, 0, "Nvidia", "Windows", 55000.0)]);
    let engine = engine_with(MemoryStore::new(DIM), Box::new(FakeReranker), cat, SearchSettings::default());
    engine.provision(&ProvisionOptions::default()).unwrap();
    let response = engine.search(QUERY, &engine.default_options()).unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].id, "id-0");
}

#[test]
fn invalid_alpha_is_rejected() {
    let engine = provisioned(Box::new(FakeReranker));
    let opts = SearchOptions::default().with_alpha(1.5);
    assert!(matches!(engine.search(QUERY, &opts), Err(Error::InvalidConfig(_))));
}

#[test]
fn min_max_normalization_keeps_scores_in_unit_range() {
    let settings = SearchSettings { normalization: ScoreNormalization::MinMax, relevance_floor: 0.0, ..SearchSettings::default() };
    let engine = engine_with(MemoryStore::new(DIM), Box::new(FakeReranker), catalog(), settings);
    engine.provision(&ProvisionOptions::default()).unwrap();
    let response = engine.search(QUERY, &engine.default_options()).unwrap();
    assert!(response.results.iter().all(|r| (0.0..=1.0).contains(&r.final_score)));
    assert!(response.results[0].text.contains("16 GB of RAM"));
}

#[test]
fn lance_backed_engine_end_to_end() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceStore::open(&tmp.path().to_string_lossy(), "laptop-hybrid-search-v2", DIM)?;
    let engine = engine_with(store, Box::new(FakeReranker), catalog(), SearchSettings::default());
    assert_eq!(engine.provision(&ProvisionOptions::default())?, ProvisionOutcome::Created { loaded: 5 });
    assert_eq!(engine.provision(&ProvisionOptions::default())?, ProvisionOutcome::Skipped { existing: 5 });
    let response = engine.search(QUERY, &engine.default_options())?;
    assert!(response.results[0].text.contains("Intel processor"));
    Ok(())
}
