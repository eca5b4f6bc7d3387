//! Laptop catalog loaded from the cleaned CSV export.
//!
//! Row `i` becomes document `id-i`. Empty or unparseable cells are treated as
//! absent values instead of failing the whole load, but every column the
//! sentence template reads must be present in the header.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::CorpusSource;
use crate::types::{parse_whole, Document, LaptopFields, NOT_AVAILABLE};

/// Header names a catalog export must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = ["Company", "TypeName", "Ram", "Price", "Cpu_brand", "HDD", "SSD", "Gpu_brand", "Os"];

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Company", default)]
    company: Option<String>,
    #[serde(rename = "TypeName", default)]
    type_name: Option<String>,
    #[serde(rename = "Ram", default)]
    ram: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "Cpu_brand", default)]
    cpu_brand: Option<String>,
    #[serde(rename = "HDD", default)]
    hdd: Option<String>,
    #[serde(rename = "SSD", default)]
    ssd: Option<String>,
    #[serde(rename = "Gpu_brand", default)]
    gpu_brand: Option<String>,
    #[serde(rename = "Os", default)]
    os: Option<String>,
}

fn cell(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty() && s != NOT_AVAILABLE)
}

impl From<CatalogRow> for LaptopFields {
    fn from(row: CatalogRow) -> Self {
        Self {
            company: cell(row.company),
            type_name: cell(row.type_name),
            ram_gb: cell(row.ram).and_then(|s| parse_whole(&s)),
            cpu_brand: cell(row.cpu_brand),
            ssd_gb: cell(row.ssd).and_then(|s| parse_whole(&s)).unwrap_or(0),
            hdd_gb: cell(row.hdd).and_then(|s| parse_whole(&s)).unwrap_or(0),
            gpu_brand: cell(row.gpu_brand),
            os: cell(row.os),
            price: cell(row.price).and_then(|s| s.parse::<f64>().ok()).filter(|p| p.is_finite()),
        }
    }
}

pub fn doc_id(row: usize) -> String {
    format!("id-{row}")
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Catalog(format!("cannot open {}: {}", path.display(), e)))?;
        let catalog = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), documents = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers().map_err(|e| Error::Catalog(format!("header: {e}")))?;
        let missing: Vec<&str> = REQUIRED_COLUMNS.into_iter().filter(|c| !headers.iter().any(|h| h == *c)).collect();
        if !missing.is_empty() {
            return Err(Error::Catalog(format!("missing column(s): {}", missing.join(", "))));
        }
        let mut fields = Vec::new();
        for (line, row) in rdr.deserialize::<CatalogRow>().enumerate() {
            let row = row.map_err(|e| Error::Catalog(format!("row {line}: {e}")))?;
            fields.push(LaptopFields::from(row));
        }
        Ok(Self::from_fields(fields))
    }

    /// Builds a catalog from already structured rows, numbering them in order.
    pub fn from_fields<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = LaptopFields>,
    {
        let documents: Vec<Document> = rows
            .into_iter()
            .enumerate()
            .map(|(i, f)| Document::new(doc_id(i), f))
            .collect();
        let by_id = documents.iter().enumerate().map(|(i, d)| (d.id.clone(), i)).collect();
        Self { documents, by_id }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl CorpusSource for Catalog {
    fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|&i| &self.documents[i])
    }
}
