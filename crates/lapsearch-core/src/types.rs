//! Domain types shared by the retrieval, fusion and ranking stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = String;
pub type Meta = HashMap<String, String>;

/// Placeholder rendered for any text or numeric field that is absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Structured attributes of one laptop, either from a catalog row or parsed
/// out of a free-text query.
///
/// Absent text and numeric fields are `None`; storage capacities default to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaptopFields {
    pub company: Option<String>,
    pub type_name: Option<String>,
    pub ram_gb: Option<u32>,
    pub cpu_brand: Option<String>,
    pub ssd_gb: u32,
    pub hdd_gb: u32,
    pub gpu_brand: Option<String>,
    pub os: Option<String>,
    pub price: Option<f64>,
}

impl LaptopFields {
    /// Flattens the fields into the string metadata stored next to vectors.
    pub fn to_metadata(&self) -> Meta {
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let num = |v: Option<u32>| v.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string());
        let mut meta = Meta::new();
        meta.insert("brand".into(), text(&self.company));
        meta.insert("type".into(), text(&self.type_name));
        meta.insert("ram".into(), num(self.ram_gb));
        meta.insert("cpu".into(), text(&self.cpu_brand));
        meta.insert("ssd".into(), self.ssd_gb.to_string());
        meta.insert("hdd".into(), self.hdd_gb.to_string());
        meta.insert("gpu".into(), text(&self.gpu_brand));
        meta.insert("os".into(), text(&self.os));
        meta.insert("price".into(), self.price.map_or_else(|| NOT_AVAILABLE.to_string(), format_price));
        meta
    }

    /// Rebuilds fields from stored metadata. Unknown or unparseable values
    /// come back absent (or 0 for storage).
    pub fn from_metadata(meta: &Meta) -> Self {
        let text = |key: &str| meta.get(key).map(|s| s.trim()).filter(|s| !s.is_empty() && *s != NOT_AVAILABLE).map(str::to_string);
        let storage = |key: &str| text(key).and_then(|s| parse_whole(&s)).unwrap_or(0);
        Self {
            company: text("brand"),
            type_name: text("type"),
            ram_gb: text("ram").and_then(|s| parse_whole(&s)),
            cpu_brand: text("cpu"),
            ssd_gb: storage("ssd"),
            hdd_gb: storage("hdd"),
            gpu_brand: text("gpu"),
            os: text("os"),
            price: text("price").and_then(|s| s.parse::<f64>().ok()).filter(|p| p.is_finite()),
        }
    }
}

/// Accepts "16" as well as "16.0"; rejects negatives and fractions.
pub fn parse_whole(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
        return Some(f as u32);
    }
    None
}

/// Whole prices print without a decimal point, anything else as written.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{price:.0}")
    } else {
        price.to_string()
    }
}

/// One catalog item: identity, canonical sentence and its source fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub sentence: String,
    pub fields: LaptopFields,
}

impl Document {
    /// Builds a document whose sentence is rendered from `fields`.
    pub fn new(id: impl Into<DocId>, fields: LaptopFields) -> Self {
        let sentence = crate::sentence::render(&fields);
        Self { id: id.into(), sentence, fields }
    }

    pub fn metadata(&self) -> Meta {
        self.fields.to_metadata()
    }
}

/// A lexical retrieval hit. `score` is the TF-IDF dot product; higher is
/// better. Semantic retrieval returns [`StoreMatch`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub text: String,
}

/// A row written to a candidate store.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: DocId,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Meta,
}

/// A nearest-neighbour match returned by a candidate store.
#[derive(Debug, Clone)]
pub struct StoreMatch {
    pub id: DocId,
    pub similarity: f32,
    pub text: String,
    pub metadata: Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub count: usize,
}

/// Which retrieval paths surfaced a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sources {
    pub semantic: bool,
    pub lexical: bool,
}

/// A document being scored within a single search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: DocId,
    pub text: String,
    pub sources: Sources,
    pub semantic_score: f32,
    pub lexical_score: f32,
    pub final_score: f32,
}

impl Candidate {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sources: Sources::default(),
            semantic_score: 0.0,
            lexical_score: 0.0,
            final_score: 0.0,
        }
    }
}

/// One row of a completed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocId,
    pub final_score: f32,
    pub text: String,
}

impl From<Candidate> for SearchResult {
    fn from(c: Candidate) -> Self {
        Self { id: c.id, final_score: c.final_score, text: c.text }
    }
}
