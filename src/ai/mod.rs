//! Asks a generative model about the CVEs found in scan results.

pub mod analyzer;

pub use analyzer::{CveAnalyzer, CveAnswer, Finding};
