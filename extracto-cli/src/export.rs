//! CSV and JSON output for parsed statements.

use anyhow::{Context, Result};
use extracto_core::{Diagnostic, StatementHeader, Transaction};
use extracto_finance::{ParsedStatement, StatementSummary};
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One CSV row per transaction plus a diagnostics JSON file
    Csv,
    /// One JSON document with everything
    Json,
}

#[derive(Debug, Serialize)]
pub struct StatementReport<'a> {
    pub source: String,
    pub header: &'a StatementHeader,
    pub summary: StatementSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<&'a [Transaction]>,
    pub diagnostics: &'a [Diagnostic],
}

fn leading_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}\s+\p{L}{3}\s+\d{4})").expect("leading date regex"))
}

fn embedded_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})\s*(\p{L}{3})\s*(\d{4})").expect("embedded date regex")
    })
}

/// Base name for outputs. A date in the input name ("15 Mar 2024 card.txt")
/// is kept so monthly exports sort and stay recognisable.
pub fn output_stem(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "statement".to_string());

    if let Some(caps) = leading_date_re().captures(&stem) {
        return caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
    }
    if let Some(caps) = embedded_date_re().captures(&stem) {
        return format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    }
    stem
}

pub struct OutputPaths {
    pub primary: PathBuf,
    pub diagnostics: Option<PathBuf>,
}

pub fn output_paths(input: &Path, out_dir: &Path, format: Format) -> OutputPaths {
    let stem = output_stem(input);
    match format {
        Format::Csv => OutputPaths {
            primary: out_dir.join(format!("{stem}_extracto.csv")),
            diagnostics: Some(out_dir.join(format!("{stem}_extracto.diagnostics.json"))),
        },
        Format::Json => OutputPaths {
            primary: out_dir.join(format!("{stem}_extracto.json")),
            diagnostics: None,
        },
    }
}

pub fn write_csv(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for t in transactions {
        wtr.serialize(t).with_context(|| format!("write {}", path.display()))?;
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, value)
        .with_context(|| format!("write {}", path.display()))?;
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Write every output for one statement, returning the primary file.
pub fn export(input: &Path, parsed: &ParsedStatement, out_dir: &Path, format: Format) -> Result<PathBuf> {
    let paths = output_paths(input, out_dir, format);
    let source = input.display().to_string();
    let summary = parsed.summary();

    match format {
        Format::Csv => {
            write_csv(&paths.primary, &parsed.transactions)?;
            if let Some(diag_path) = &paths.diagnostics {
                let report = StatementReport {
                    source,
                    header: &parsed.header,
                    summary,
                    transactions: None,
                    diagnostics: &parsed.diagnostics,
                };
                write_json(diag_path, &report)?;
            }
        }
        Format::Json => {
            let report = StatementReport {
                source,
                header: &parsed.header,
                summary,
                transactions: Some(&parsed.transactions),
                diagnostics: &parsed.diagnostics,
            };
            write_json(&paths.primary, &report)?;
        }
    }

    Ok(paths.primary)
}
