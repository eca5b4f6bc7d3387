pub mod memory;
pub mod provision;
pub mod schema;
pub mod store;
pub mod table;

pub use memory::MemoryStore;
pub use provision::{provision, ProvisionOptions, ProvisionOutcome};
pub use store::LanceStore;
