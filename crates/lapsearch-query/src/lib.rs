//! Free-text query normalisation.
//!
//! A [`RegexQueryParser`] pulls laptop attributes out of the query and the
//! shared renderer turns them into a sentence shaped like the catalog's.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use lapsearch_core::traits::QueryParser;
use lapsearch_core::{render, LaptopFields};

/// Case-insensitive patterns; each captures the value in group 1.
pub struct RegexQueryParser {
    ram: Regex,
    cpu: Regex,
    ssd: Regex,
    hdd: Regex,
    gpu: Regex,
    os: Regex,
    price: Regex,
    brand: Regex,
}

fn pattern(re: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(re).case_insensitive(true).build()
}

impl RegexQueryParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            ram: pattern(r"(\d+)\s*GB\s*RAM")?,
            cpu: pattern(r"(Intel|AMD)")?,
            ssd: pattern(r"(\d+)\s*GB\s*SSD")?,
            hdd: pattern(r"(\d+)\s*GB\s*HDD")?,
            gpu: pattern(r"(NVIDIA|AMD|Intel)")?,
            os: pattern(r"(Windows|Mac|Linux|Ubuntu)")?,
            price: pattern(r"under\s*₹?(\d+)")?,
            brand: pattern(r"(Apple|Dell|HP|Lenovo|Acer|Asus|MSI|Microsoft|Razer|Samsung|Toshiba|Fujitsu|Google)")?,
        })
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

impl QueryParser for RegexQueryParser {
    fn parse(&self, text: &str) -> LaptopFields {
        let word = |re: &Regex| capture(re, text).map(str::to_string);
        let number = |re: &Regex| capture(re, text).and_then(|s| s.parse::<u32>().ok());
        LaptopFields {
            company: word(&self.brand),
            type_name: None,
            ram_gb: number(&self.ram),
            cpu_brand: word(&self.cpu),
            ssd_gb: number(&self.ssd).unwrap_or(0),
            hdd_gb: number(&self.hdd).unwrap_or(0),
            gpu_brand: word(&self.gpu),
            os: word(&self.os),
            price: capture(&self.price, text).and_then(|s| s.parse::<f64>().ok()),
        }
    }
}

/// A query after field extraction and rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedQuery {
    pub fields: LaptopFields,
    pub sentence: String,
}

pub fn normalize(parser: &dyn QueryParser, text: &str) -> NormalizedQuery {
    let fields = parser.parse(text);
    let sentence = render(&fields);
    tracing::debug!(query = text, sentence = %sentence, "normalized query");
    NormalizedQuery { fields, sentence }
}
