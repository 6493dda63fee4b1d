//! Core engine: collection, indexing, reconciliation and catalog writing.
//!
//! - `collect` finds translation references in PHP, Fusion and NodeType files
//! - `reference_index` deduplicates them by key
//! - `catalog` reads and writes XLIFF files byte-stably
//! - `catalog_index` indexes existing catalog entries per locale
//! - `reconcile` compares both sides
//! - `mutation` and `llm` produce and apply new catalog entries

pub mod catalog;
pub mod catalog_index;
pub mod collect;
pub mod context;
pub mod file_scanner;
pub mod key;
pub mod llm;
pub mod mutation;
pub mod reconcile;
pub mod reference_index;
pub mod resolve;

pub use context::ScanContext;
pub use key::{TranslationKey, TranslationReference};
