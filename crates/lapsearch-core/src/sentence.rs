//! Canonical descriptive sentence for a laptop.
//!
//! Catalog ingestion and query normalisation both go through [`render`], so
//! the semantic and lexical stages always compare text of the same shape.

use crate::types::{format_price, LaptopFields, NOT_AVAILABLE};

pub fn render(fields: &LaptopFields) -> String {
    let text = |v: &Option<String>| v.as_deref().unwrap_or(NOT_AVAILABLE).to_string();
    let ram = fields.ram_gb.map_or_else(|| NOT_AVAILABLE.to_string(), |r| r.to_string());
    let price = fields.price.map_or_else(|| NOT_AVAILABLE.to_string(), format_price);
    format!(
        "The {} {} is a laptop equipped with {} GB of RAM and a {} processor. \
         It offers {} for your files and applications. \
         For graphics, it uses a {} GPU. \
         The laptop runs on {} and is priced at \u{20b9}{}.",
        text(&fields.company),
        text(&fields.type_name),
        ram,
        text(&fields.cpu_brand),
        storage_phrase(fields.ssd_gb, fields.hdd_gb),
        text(&fields.gpu_brand),
        text(&fields.os),
        price,
    )
}

fn storage_phrase(ssd_gb: u32, hdd_gb: u32) -> String {
    let mut parts = Vec::with_capacity(2);
    if ssd_gb > 0 {
        parts.push(format!("{ssd_gb} GB SSD storage"));
    }
    if hdd_gb > 0 {
        parts.push(format!("{hdd_gb} GB HDD storage"));
    }
    if parts.is_empty() {
        "no storage".to_string()
    } else {
        parts.join(" and ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dell() -> LaptopFields {
        LaptopFields {
            company: Some("Dell".into()),
            type_name: Some("Notebook".into()),
            ram_gb: Some(16),
            cpu_brand: Some("Intel".into()),
            ssd_gb: 512,
            hdd_gb: 1000,
            gpu_brand: Some("Nvidia".into()),
            os: Some("Windows".into()),
            price: Some(55000.0),
        }
    }

    #[test]
    fn renders_full_row() {
        assert_eq!(
            render(&dell()),
            "The Dell Notebook is a laptop equipped with 16 GB of RAM and a Intel processor. \
             It offers 512 GB SSD storage and 1000 GB HDD storage for your files and applications. \
             For graphics, it uses a Nvidia GPU. The laptop runs on Windows and is priced at \u{20b9}55000."
        );
    }

    #[test]
    fn empty_fields_render_placeholders() {
        let s = render(&LaptopFields::default());
        assert!(s.starts_with("The N/A N/A is a laptop equipped with N/A GB of RAM"));
        assert!(s.contains("It offers no storage for your files"));
        assert!(s.ends_with("priced at \u{20b9}N/A."));
    }

    #[test]
    fn single_storage_kind_has_no_conjunction() {
        let fields = LaptopFields { hdd_gb: 0, ..dell() };
        assert!(render(&fields).contains("It offers 512 GB SSD storage for"));
    }
}
