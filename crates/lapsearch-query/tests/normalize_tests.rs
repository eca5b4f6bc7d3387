use lapsearch_core::traits::QueryParser;
use lapsearch_core::{render, LaptopFields};
use lapsearch_query::{normalize, RegexQueryParser};
use proptest::prelude::*;

#[test]
fn extracts_ram_cpu_and_price_ceiling() {
    let parser = RegexQueryParser::new().expect("patterns compile");
    let q = normalize(&parser, "16GB RAM laptop with Intel processor under 60000");
    assert_eq!(q.fields.ram_gb, Some(16));
    assert_eq!(q.fields.cpu_brand.as_deref(), Some("Intel"));
    assert_eq!(q.fields.gpu_brand.as_deref(), Some("Intel"));
    assert_eq!(q.fields.price, Some(60000.0));
    assert_eq!((q.fields.ssd_gb, q.fields.hdd_gb), (0, 0));
    assert_eq!(q.fields.company, None);
    assert_eq!(q.fields.type_name, None);
    assert!(q.sentence.contains("16 GB of RAM and a Intel processor"));
    assert!(q.sentence.ends_with("priced at \u{20b9}60000."));
}

#[test]
fn storage_brand_and_rupee_price() {
    let parser = RegexQueryParser::new().unwrap();
    let f = parser.parse("Dell with 512 GB SSD and 1000gb hdd running Windows under ₹75000");
    assert_eq!(f.company.as_deref(), Some("Dell"));
    assert_eq!(f.ssd_gb, 512);
    assert_eq!(f.hdd_gb, 1000);
    assert_eq!(f.os.as_deref(), Some("Windows"));
    assert_eq!(f.price, Some(75000.0));
}

#[test]
fn query_matching_nothing_still_renders() {
    let parser = RegexQueryParser::new().unwrap();
    let q = normalize(&parser, "something light for travel");
    assert_eq!(q.fields, LaptopFields::default());
    assert_eq!(q.sentence, render(&LaptopFields::default()));
    assert!(q.sentence.contains("N/A GB of RAM"));
    assert!(q.sentence.contains("no storage"));
}

proptest! {
    #[test]
    fn parse_never_panics_and_is_deterministic(text in "\\PC{0,80}") {
        let parser = RegexQueryParser::new().unwrap();
        prop_assert_eq!(parser.parse(&text), parser.parse(&text));
    }
}
