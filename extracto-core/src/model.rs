//! Statement data model: raw lines in, canonical transactions out.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of text as delivered by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    pub text: String,
    pub page_index: usize,
    pub line_index: usize,
}

impl RawLine {
    pub fn new(page_index: usize, line_index: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_index,
            line_index,
        }
    }

    /// Build page-0 lines from plain strings. Mostly useful in tests.
    pub fn from_strs(lines: &[&str]) -> Vec<RawLine> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| RawLine::new(0, i, *text))
            .collect()
    }
}

/// Refinement of noise lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseShape {
    Blank,
    /// Page headers, column titles, page numbers. Does not end a block.
    Boilerplate,
    /// Running totals and section titles. Ends the current block.
    SectionBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    TransactionStart,
    Continuation,
    Noise(NoiseShape),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub line: RawLine,
    pub kind: LineKind,
}

/// Which column an amount was read from in debit/credit layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountColumn {
    Debit,
    Credit,
}

/// Figures printed on a transaction's lines besides its amount and balance.
/// The installment ones come from multi-column installment rows
/// (`total pending principal interest charge`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFigures {
    pub installment_total: Option<String>,
    pub installment_pending: Option<String>,
    pub installment_principal: Option<String>,
    pub installment_interest: Option<String>,
    pub service_fee: Option<String>,
}

/// Lines of one transaction, grouped but not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransactionBlock {
    pub date_text: String,
    pub description_lines: Vec<String>,
    pub amount_text: String,
    pub balance_text: Option<String>,
    pub amount_column: Option<AmountColumn>,
    pub figures: BlockFigures,
    pub source_page: usize,
    pub source_line: usize,
}

impl RawTransactionBlock {
    /// Description fragments joined with single spaces.
    pub fn description(&self) -> String {
        self.description_lines
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One installment occurrence of a purchase split over several periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionatedGroup {
    pub base_description: String,
    pub installment_index: u32,
    pub installment_count: u32,
    /// Charge billed in this period. Never the purchase total.
    pub partial_amount: Decimal,
    pub total_amount: Option<Decimal>,
    /// Outstanding amount after this installment, when the statement prints it.
    pub remaining_after: Option<Decimal>,
    /// Principal part of this period's charge.
    pub principal: Option<Decimal>,
    pub interest: Option<Decimal>,
}

impl FractionatedGroup {
    pub fn installments_left(&self) -> u32 {
        self.installment_count.saturating_sub(self.installment_index)
    }

    /// Statement-printed remaining amount, or `partial * installments_left`.
    pub fn projected_outstanding(&self) -> Decimal {
        self.remaining_after
            .unwrap_or_else(|| self.partial_amount * Decimal::from(self.installments_left()))
    }
}

/// Canonical, export-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Negative = debit, positive = credit.
    pub amount: Decimal,
    pub balance_after: Option<Decimal>,
    pub category: String,
    pub is_installment: bool,
    pub installment_index: Option<u32>,
    pub installment_count: Option<u32>,
    pub installment_total: Option<Decimal>,
    pub installment_remaining: Option<Decimal>,
    pub installment_principal: Option<Decimal>,
    pub installment_interest: Option<Decimal>,
    /// Service charge printed alongside the operation ("Importe servicios").
    /// Not included in `amount`.
    pub service_fee: Option<Decimal>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// Statement-level facts printed alongside the transaction table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementHeader {
    pub holder: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub credit_limit: Option<Decimal>,
}
