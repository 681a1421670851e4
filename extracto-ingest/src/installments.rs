//! Installment ("fractionated operation") detection.
//!
//! The amount printed next to an installment line is the charge for this
//! period only. The resolver pulls the index/count pair out of the
//! description, keeps that partial charge as the group's amount, and records
//! the purchase total and pending amount when the statement prints them.
//! Annotation lines win over the figures of a five-column installment row.

use extracto_core::{
    BlockError, CompiledConfig, FractionatedGroup, RawTransactionBlock, parse_amount,
    parse_decimal,
};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub base_description: String,
    pub group: Option<FractionatedGroup>,
    /// Marker text that matched without a usable index/count pair.
    pub ambiguity: Option<String>,
}

struct MarkerMatch {
    start: usize,
    end: usize,
    index: Option<u32>,
    count: Option<u32>,
}

impl MarkerMatch {
    fn valid_pair(&self) -> Option<(u32, u32)> {
        match (self.index, self.count) {
            (Some(index), Some(count)) if index >= 1 && index <= count => Some((index, count)),
            _ => None,
        }
    }
}

pub struct FractionatedOperationResolver<'a> {
    config: &'a CompiledConfig,
}

impl<'a> FractionatedOperationResolver<'a> {
    pub fn new(config: &'a CompiledConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, block: &RawTransactionBlock) -> Result<Resolution, BlockError> {
        let description = block.description();

        // Annotations and due-date notes carry numbers and words ("plazo")
        // the marker patterns would otherwise pick up.
        let mut cleaned = description.clone();
        for re in self
            .config
            .installment_totals
            .iter()
            .chain(&self.config.installment_remaining)
            .chain(&self.config.installment_details)
        {
            cleaned = re.replace_all(&cleaned, " ").into_owned();
        }

        let Some(marker) = find_marker(&self.config.installment_markers, &cleaned) else {
            return Ok(Resolution {
                base_description: description,
                group: None,
                ambiguity: None,
            });
        };

        let Some((index, count)) = marker.valid_pair() else {
            return Ok(Resolution {
                base_description: description,
                group: None,
                ambiguity: Some(cleaned[marker.start..marker.end].trim().to_string()),
            });
        };

        let figures = &block.figures;
        let partial_amount = parse_amount(&block.amount_text)
            .ok_or_else(|| BlockError::AmountParse(block.amount_text.clone()))?
            .magnitude;

        let without_marker = format!("{} {}", &cleaned[..marker.start], &cleaned[marker.end..]);
        let mut base_description = tidy(&without_marker);
        if base_description.is_empty() {
            base_description = tidy(&cleaned);
        }

        Ok(Resolution {
            group: Some(FractionatedGroup {
                base_description: base_description.clone(),
                installment_index: index,
                installment_count: count,
                partial_amount,
                total_amount: captured_amount(&self.config.installment_totals, &description)
                    .or_else(|| figure(&figures.installment_total)),
                remaining_after: captured_amount(&self.config.installment_remaining, &description)
                    .or_else(|| figure(&figures.installment_pending)),
                principal: figure(&figures.installment_principal),
                interest: figure(&figures.installment_interest),
            }),
            base_description,
            ambiguity: None,
        })
    }
}

/// First marker match that captured at least one of index/count. Matches
/// with neither ("CUOTA ANUAL") are not installment markers at all.
fn find_marker(patterns: &[Regex], text: &str) -> Option<MarkerMatch> {
    for re in patterns {
        for caps in re.captures_iter(text) {
            let index = caps.name("index").and_then(|m| m.as_str().parse().ok());
            let count = caps.name("count").and_then(|m| m.as_str().parse().ok());
            if index.is_none() && count.is_none() {
                continue;
            }
            let whole = caps.get(0)?;
            return Some(MarkerMatch {
                start: whole.start(),
                end: whole.end(),
                index,
                count,
            });
        }
    }
    None
}

fn captured_amount(patterns: &[Regex], text: &str) -> Option<rust_decimal::Decimal> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        parse_decimal(caps.name("amount")?.as_str())
    })
}

fn figure(text: &Option<String>) -> Option<rust_decimal::Decimal> {
    text.as_deref().and_then(parse_decimal)
}

fn tidy(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | ';' | ':' | '|' | '/'))
        .to_string()
}
