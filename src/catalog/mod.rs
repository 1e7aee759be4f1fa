//! Trigger catalog
//!
//! Per-channel metadata fetched from an external service, served through a
//! single-flight, rate-limited cache.

pub mod cache;

pub mod loader;

pub use cache::{CacheLookup, KeyNormalizer, ResourceCache, SharedFetch, TriggerCatalog};
pub use loader::{loader_fn, FnLoader, HttpCatalogLoader, ResourceLoader, TriggerCatalogEntry};
