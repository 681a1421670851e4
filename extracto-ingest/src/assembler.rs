//! Groups classified lines into raw transaction blocks.
//!
//! At most one block is open at a time. Its description fragments are
//! append-only; the block becomes an immutable [`RawTransactionBlock`] only
//! when it is closed by the next start line, a section break, or the end of
//! input. Blocks that never picked up a date or an amount are reported as
//! skipped and dropped.
//!
//! In the single-column layout the balance is read from the line that
//! carried the amount, or from a line holding nothing but figures right
//! after it. Figures in later footnotes never become the balance.

use std::ops::Range;

use extracto_core::{
    AmountColumn, AmountLayout, BlockFigures, ClassifiedLine, CompiledConfig, Diagnostic, LineKind,
    NoiseShape, RawTransactionBlock, SkipReason, matches_date_format, scan_line,
};
use regex::Regex;
use tracing::debug;

use crate::classifier::date_prefix;

/// Result of assembling one document.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub blocks: Vec<RawTransactionBlock>,
    pub skipped: Vec<Diagnostic>,
}

#[derive(Debug)]
struct OpenBlock {
    /// `None` for orphan lines that showed up with no start line before them.
    date_text: Option<String>,
    fragments: Vec<String>,
    amount: Option<(String, Option<AmountColumn>)>,
    balance: Option<String>,
    /// The previous absorbed line supplied the amount but no balance.
    balance_may_follow: bool,
    figures: BlockFigures,
    page: usize,
    line: usize,
    raw: Vec<String>,
}

impl OpenBlock {
    fn new(date_text: Option<String>, page: usize, line: usize) -> Self {
        Self {
            date_text,
            fragments: Vec::new(),
            amount: None,
            balance: None,
            balance_may_follow: false,
            figures: BlockFigures::default(),
            page,
            line,
            raw: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Open(OpenBlock),
}

pub struct TransactionAssembler<'a> {
    config: &'a CompiledConfig,
}

impl<'a> TransactionAssembler<'a> {
    pub fn new(config: &'a CompiledConfig) -> Self {
        Self { config }
    }

    pub fn assemble(&self, lines: &[ClassifiedLine]) -> Assembly {
        let mut out = Assembly::default();
        let mut state = State::Idle;

        for classified in lines {
            let line = &classified.line;
            match classified.kind {
                LineKind::Noise(NoiseShape::SectionBreak) => {
                    close(std::mem::replace(&mut state, State::Idle), &mut out);
                }
                LineKind::Noise(_) => {}
                LineKind::TransactionStart => {
                    close(std::mem::replace(&mut state, State::Idle), &mut out);
                    let date = date_prefix(&line.text).map(|(date, _)| date.to_string());
                    let mut block = OpenBlock::new(date, line.page_index, line.line_index);
                    self.absorb(&mut block, &line.text, true);
                    state = State::Open(block);
                }
                LineKind::Continuation => {
                    if let State::Idle = state {
                        state = State::Open(OpenBlock::new(None, line.page_index, line.line_index));
                    }
                    if let State::Open(block) = &mut state {
                        self.absorb(block, &line.text, false);
                    }
                }
            }
        }
        close(state, &mut out);

        out
    }

    /// Append one line to the open block, picking up amount and balance
    /// tokens until both are known.
    fn absorb(&self, block: &mut OpenBlock, text: &str, starts_with_date: bool) {
        block.raw.push(text.trim().to_string());

        let mut line = text.to_string();
        if let Some(fee) = take_figure(&self.config.service_fees, &mut line, "amount") {
            block.figures.service_fee.get_or_insert(fee);
        }

        let row_matched = block.amount.is_none() && self.take_installment_row(block, &mut line);

        // A bare date under a block still waiting for its amount is a value
        // date column. It is neither an amount nor description.
        let value_date = !starts_with_date
            && block.amount.is_none()
            && date_prefix(&line).is_some_and(|(date, rest)| {
                !rest.chars().any(char::is_alphabetic)
                    && matches_date_format(date, &self.config.date_formats)
            });
        let skip_first_word = starts_with_date || value_date;

        let scanned = scan_line(&line);
        let mut consumed: Vec<Range<usize>> = Vec::new();
        if skip_first_word {
            consumed.push(0..1);
        }

        let figures_only = {
            let mut all = consumed.clone();
            all.extend(scanned.amounts.iter().map(|t| t.words.clone()));
            scanned.text_without(&all).is_empty()
        };
        let balance_may_follow = std::mem::take(&mut block.balance_may_follow);
        let mut amount_on_this_line = false;

        if !row_matched && !self.config.is_installment_annotation(&line) {
            for token in &scanned.amounts {
                if skip_first_word && token.words.start == 0 {
                    continue;
                }
                let taken = match self.config.layout {
                    AmountLayout::Single { with_balance } => {
                        if block.amount.is_none() {
                            block.amount = Some((token.text.clone(), None));
                            amount_on_this_line = true;
                            true
                        } else if with_balance
                            && block.balance.is_none()
                            && (amount_on_this_line || (balance_may_follow && figures_only))
                        {
                            block.balance = Some(token.text.clone());
                            true
                        } else {
                            false
                        }
                    }
                    AmountLayout::DebitCredit {
                        credit_column,
                        balance_column,
                    } => {
                        if balance_column.is_some_and(|col| token.offset >= col) {
                            if block.balance.is_none() {
                                block.balance = Some(token.text.clone());
                                true
                            } else {
                                false
                            }
                        } else if block.amount.is_none() {
                            let column = if token.offset >= credit_column {
                                AmountColumn::Credit
                            } else {
                                AmountColumn::Debit
                            };
                            block.amount = Some((token.text.clone(), Some(column)));
                            true
                        } else {
                            false
                        }
                    }
                };
                if taken {
                    consumed.push(token.words.clone());
                }
            }
        }
        block.balance_may_follow = amount_on_this_line && block.balance.is_none();

        if value_date {
            return;
        }
        let fragment = scanned.text_without(&consumed);
        if !fragment.is_empty() {
            block.fragments.push(fragment);
        }
    }

    /// Installment rows print the purchase total, the pending amount, the
    /// principal, the interest and the period charge side by side. The
    /// charge is the amount; the rest are kept as figures.
    fn take_installment_row(&self, block: &mut OpenBlock, line: &mut String) -> bool {
        let Some((caps_text, spans)) = self.config.installment_rows.iter().find_map(|re| {
            let caps = re.captures(line.as_str())?;
            let charge = caps.name("charge")?;
            let mut texts = [None, None, None, None];
            let mut spans = vec![charge.range()];
            for (slot, name) in texts.iter_mut().zip(["total", "pending", "principal", "interest"]) {
                if let Some(m) = caps.name(name) {
                    *slot = Some(m.as_str().to_string());
                    spans.push(m.range());
                }
            }
            Some(((charge.as_str().to_string(), texts), spans))
        }) else {
            return false;
        };

        let (charge, [total, pending, principal, interest]) = caps_text;
        block.amount = Some((charge, None));
        block.figures.installment_total = total;
        block.figures.installment_pending = pending;
        block.figures.installment_principal = principal;
        block.figures.installment_interest = interest;
        mask(line, &spans);
        true
    }
}

/// First match of `patterns` in `line`: returns its `group` text and blanks
/// the whole match out of `line`.
fn take_figure(patterns: &[Regex], line: &mut String, group: &str) -> Option<String> {
    let (value, span) = patterns.iter().find_map(|re| {
        let caps = re.captures(line.as_str())?;
        Some((caps.name(group)?.as_str().to_string(), caps.get(0)?.range()))
    })?;
    mask(line, &[span]);
    Some(value)
}

/// Replace every char inside the byte spans with a space, keeping char
/// offsets stable for column layouts.
fn mask(line: &mut String, spans: &[Range<usize>]) {
    *line = line
        .char_indices()
        .map(|(i, c)| if spans.iter().any(|s| s.contains(&i)) { ' ' } else { c })
        .collect();
}

fn close(state: State, out: &mut Assembly) {
    let State::Open(block) = state else {
        return;
    };

    match (block.date_text, block.amount) {
        (Some(date_text), Some((amount_text, amount_column))) => {
            out.blocks.push(RawTransactionBlock {
                date_text,
                description_lines: block.fragments,
                amount_text,
                balance_text: block.balance,
                amount_column,
                figures: block.figures,
                source_page: block.page,
                source_line: block.line,
            });
        }
        (date_text, _) => {
            let reason = if date_text.is_none() {
                SkipReason::NoDate
            } else {
                SkipReason::NoAmount
            };
            let text = block.raw.join(" | ");
            debug!(page = block.page, line = block.line, %reason, %text, "skipping block");
            out.skipped.push(Diagnostic::SkippedBlock {
                page: block.page,
                line: block.line,
                reason,
                text,
            });
        }
    }
}
