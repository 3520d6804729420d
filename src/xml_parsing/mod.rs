//! Streaming ingestion of PNML documents.

pub mod pnml;
pub mod utils;

pub use pnml::{read_pnml, read_pnml_file, ParsedNet, PnmlError, ValidationIssue};
