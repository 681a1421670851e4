//! Non-fatal findings attached to a parsed statement.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Block closed without an amount token.
    NoAmount,
    /// Lines with no transaction date in front of them.
    NoDate,
    MissingDescription,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NoAmount => "no amount",
            SkipReason::NoDate => "no date",
            SkipReason::MissingDescription => "no description",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    SkippedBlock {
        page: usize,
        line: usize,
        reason: SkipReason,
        text: String,
    },
    DateParse {
        page: usize,
        line: usize,
        date_text: String,
    },
    /// Installment marker with only part of the index/count pair.
    AmbiguousInstallmentMarker {
        page: usize,
        line: usize,
        marker: String,
    },
    /// `index` is the position of the later transaction in the output.
    BalanceMismatch {
        index: usize,
        expected: Decimal,
        declared: Decimal,
        difference: Decimal,
    },
    PossibleDuplicate {
        first: usize,
        second: usize,
    },
}

impl Diagnostic {
    pub fn is_skipped_block(&self) -> bool {
        matches!(self, Diagnostic::SkippedBlock { .. })
    }

    /// Findings about data that did make it into the output.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::AmbiguousInstallmentMarker { .. }
                | Diagnostic::BalanceMismatch { .. }
                | Diagnostic::PossibleDuplicate { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SkippedBlock { page, line, reason, text } => {
                write!(f, "p{}:l{} skipped block ({}): {}", page + 1, line + 1, reason, text)
            }
            Diagnostic::DateParse { page, line, date_text } => {
                write!(f, "p{}:l{} unparseable date `{}`", page + 1, line + 1, date_text)
            }
            Diagnostic::AmbiguousInstallmentMarker { page, line, marker } => write!(
                f,
                "p{}:l{} ambiguous installment marker `{}` (kept as regular transaction)",
                page + 1,
                line + 1,
                marker
            ),
            Diagnostic::BalanceMismatch { index, expected, declared, difference } => write!(
                f,
                "row {}: balance {} does not match expected {} (off by {})",
                index + 1,
                declared,
                expected,
                difference
            ),
            Diagnostic::PossibleDuplicate { first, second } => {
                write!(f, "rows {} and {} look like duplicates", first + 1, second + 1)
            }
        }
    }
}
