use lapsearch_core::catalog::Catalog;
use lapsearch_core::traits::{CorpusSource, LexicalRetriever};
use lapsearch_core::{Error, LaptopFields};
use lapsearch_text::{top_k, TfIdfRetriever};
use proptest::prelude::*;

fn laptop(company: &str, ram: u32, cpu: &str) -> LaptopFields {
    LaptopFields {
        company: Some(company.into()),
        type_name: Some("Notebook".into()),
        ram_gb: Some(ram),
        cpu_brand: Some(cpu.into()),
        ssd_gb: 256,
        gpu_brand: Some("Intel".into()),
        os: Some("Windows".into()),
        price: Some(50000.0),
        ..LaptopFields::default()
    }
}

#[test]
fn retriever_ranks_matching_brand_first() {
    let catalog = Catalog::from_fields(vec![laptop("Dell", 8, "AMD"), laptop("Lenovo", 16, "Intel"), laptop("HP", 4, "AMD")]);
    let hits = TfIdfRetriever.search(catalog.documents(), "Lenovo laptop with 16 GB of RAM", 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "id-1");
    assert_eq!(hits[0].text, catalog.documents()[1].sentence);
    assert!(hits[0].score >= hits[1].score);
}

#[test]
fn retriever_rejects_empty_corpus() {
    let err = TfIdfRetriever.search(&[], "anything", 5).unwrap_err();
    assert!(matches!(err, Error::EmptyCorpus));
}

#[test]
fn retriever_handles_single_document() {
    let catalog = Catalog::from_fields(vec![laptop("Dell", 8, "AMD")]);
    let doc = &catalog.documents()[0];
    let hits = TfIdfRetriever.search(catalog.documents(), &doc.sentence, 5).expect("search");
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
}

proptest! {
    #[test]
    fn top_k_is_bounded_and_descending(scores in proptest::collection::vec(0.0f32..1.0, 0..40), k in 0usize..50) {
        let ranked = top_k(&scores, k);
        prop_assert!(ranked.len() <= k.min(scores.len()));
        for w in ranked.windows(2) { prop_assert!(w[0].1 >= w[1].1); }
    }
}
