mod catalog_cache;
mod document;
mod fare_catalog;

pub use catalog_cache::CatalogCache;
pub use document::FareTableDocument;
pub use fare_catalog::{FareCatalog, FareQuote};
