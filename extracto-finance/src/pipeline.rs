//! One statement, end to end: classify, assemble, resolve installments,
//! normalize, then check balances and duplicates.
//!
//! A [`StatementParser`] compiles its configuration once and holds no mutable
//! state, so one instance can be shared across threads for batch work.

use extracto_core::{
    BlockError, CompiledConfig, ConfigError, Diagnostic, ParserConfig, RawLine,
    RawTransactionBlock, SkipReason, StatementError, StatementHeader, Transaction,
};
use extracto_ingest::{
    Assembly, FractionatedOperationResolver, LineClassifier, TransactionAssembler, extract_header,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::balance::validate_balances;
use crate::duplicates::find_duplicates;
use crate::normalizer::TransactionNormalizer;
use crate::summary::StatementSummary;

/// Page separator in `pdftotext` output.
pub const PAGE_BREAK: char = '\x0c';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub header: StatementHeader,
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedStatement {
    pub fn summary(&self) -> StatementSummary {
        StatementSummary::from_transactions(&self.transactions)
    }

    pub fn skipped_blocks(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_skipped_block()).count()
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }
}

#[derive(Debug, Clone)]
pub struct StatementParser {
    config: CompiledConfig,
}

impl StatementParser {
    pub fn new(config: &ParserConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: CompiledConfig::compile(config)?,
        })
    }

    /// Split extracted text into lines: pages on form feed, lines on newline.
    pub fn split_text(text: &str) -> Vec<RawLine> {
        text.split(PAGE_BREAK)
            .enumerate()
            .flat_map(|(page, page_text)| {
                page_text
                    .lines()
                    .enumerate()
                    .map(move |(line, line_text)| RawLine::new(page, line, line_text))
            })
            .collect()
    }

    pub fn parse_text(&self, text: &str) -> Result<ParsedStatement, StatementError> {
        self.parse_lines(&Self::split_text(text))
    }

    pub fn parse_lines(&self, lines: &[RawLine]) -> Result<ParsedStatement, StatementError> {
        let header = extract_header(lines, &self.config.date_formats);
        let reference = self.config.reference_date.or(header.period_end);
        debug!(?reference, ?header, "statement header");

        let classified = LineClassifier::new(&self.config).classify_all(lines);
        let Assembly { blocks, skipped } = TransactionAssembler::new(&self.config).assemble(&classified);
        let mut diagnostics = skipped;

        let resolver = FractionatedOperationResolver::new(&self.config);
        let normalizer = TransactionNormalizer::new(&self.config, reference);
        let mut transactions = Vec::with_capacity(blocks.len());

        for block in &blocks {
            let resolution = match resolver.resolve(block) {
                Ok(resolution) => resolution,
                Err(err) => {
                    diagnostics.push(block_diagnostic(block, &err));
                    continue;
                }
            };
            if let Some(marker) = resolution.ambiguity {
                warn!(
                    page = block.source_page,
                    line = block.source_line,
                    %marker,
                    "ambiguous installment marker, keeping as regular transaction"
                );
                diagnostics.push(Diagnostic::AmbiguousInstallmentMarker {
                    page: block.source_page,
                    line: block.source_line,
                    marker,
                });
            }

            match normalizer.normalize(block, resolution.group.as_ref()) {
                Ok(transaction) => transactions.push(transaction),
                Err(err) => diagnostics.push(block_diagnostic(block, &err)),
            }
        }

        diagnostics.extend(validate_balances(&transactions, self.config.balance_tolerance));
        diagnostics.extend(find_duplicates(&transactions));

        if transactions.is_empty() {
            warn!(diagnostics = diagnostics.len(), "no transactions found");
            return Err(StatementError::NoTransactions { diagnostics });
        }

        info!(
            lines = lines.len(),
            transactions = transactions.len(),
            diagnostics = diagnostics.len(),
            "parsed statement"
        );
        Ok(ParsedStatement {
            header,
            transactions,
            diagnostics,
        })
    }
}

fn block_diagnostic(block: &RawTransactionBlock, err: &BlockError) -> Diagnostic {
    debug!(page = block.source_page, line = block.source_line, %err, "dropping block");
    let page = block.source_page;
    let line = block.source_line;
    match err {
        BlockError::DateParse(date_text) => Diagnostic::DateParse {
            page,
            line,
            date_text: date_text.clone(),
        },
        BlockError::AmountParse(text) => Diagnostic::SkippedBlock {
            page,
            line,
            reason: SkipReason::NoAmount,
            text: text.clone(),
        },
        BlockError::MissingDescription => Diagnostic::SkippedBlock {
            page,
            line,
            reason: SkipReason::MissingDescription,
            text: format!("{} {}", block.date_text, block.amount_text),
        },
    }
}
