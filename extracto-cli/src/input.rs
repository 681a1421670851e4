//! Loads text already extracted from a statement PDF (`pdftotext -layout`).

use anyhow::{Context, Result};
use extracto_core::RawLine;
use extracto_finance::StatementParser;
use std::fs;
use std::path::Path;

/// Read a statement text file into ordered lines. Invalid UTF-8 (Latin-1
/// output from older extractors) is replaced rather than rejected.
pub fn read_statement(path: &Path) -> Result<Vec<RawLine>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(StatementParser::split_text(&text))
}
