#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod sentence;
pub mod traits;
pub mod types;

pub use error::{Error, Result, Stage};
pub use sentence::render;
pub use types::{Candidate, Document, LaptopFields, SearchHit, SearchResult};
