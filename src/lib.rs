//! l10nguy - translation reference checker for Neos/Flow projects
//!
//! l10nguy scans PHP, Fusion/AFX and YAML sources for translation references,
//! reconciles them against the project's XLIFF catalogs, and reports missing,
//! unused and inconsistent entries. It can also create missing entries, delete
//! unused ones and rewrite catalogs in a canonical format.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (argument parsing, commands, reports)
//! - `config`: Configuration file loading and parsing
//! - `core`: Reference collection, catalog indexing, reconciliation and writing
//! - `issues`: Issue type definitions and reporting
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod issues;
pub mod utils;
