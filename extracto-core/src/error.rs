use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Rejected configuration, reported when a parser is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern `{pattern}` in {field}: {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{pattern}` in {field} must define the named group `{group}`")]
    MissingGroup {
        field: &'static str,
        pattern: String,
        group: &'static str,
    },

    #[error("invalid date format `{0}`")]
    InvalidDateFormat(String),

    #[error("at least one date format is required")]
    NoDateFormats,
}

/// Failure confined to a single block. The block is excluded, the document
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("unparseable or implausible date `{0}`")]
    DateParse(String),

    #[error("no recognizable amount in `{0}`")]
    AmountParse(String),

    #[error("block has no description text")]
    MissingDescription,
}

/// Document-level failure.
#[derive(Debug, Clone, Error)]
pub enum StatementError {
    #[error("no parseable transactions in document ({} diagnostics)", .diagnostics.len())]
    NoTransactions { diagnostics: Vec<Diagnostic> },
}
