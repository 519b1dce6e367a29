//! The symbol index.
//!
//! - `api_map` holds the per-file pin buckets and answers lookups
//! - `store` builds the derived tables (paths, children, ancestry) for one generation
//! - `catalogue` provides the shared, read-only standard catalogue

pub mod api_map;
pub mod catalogue;
mod store;

pub use api_map::ApiMap;
pub use catalogue::{core, CoreCatalogue, CORE_FILENAME};

#[cfg(test)]
mod tests;
