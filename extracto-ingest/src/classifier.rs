//! Line classification: transaction start, continuation or noise.
//!
//! Noise is checked first, so a statement-period header carrying two dates
//! never opens a transaction. A start line needs descriptive text after its
//! date; a bare date or figure (`16.03`, `10.25`) is a continuation. Anything
//! unrecognised is a continuation too, left for the assembler to dispose of.

use std::sync::OnceLock;

use extracto_core::{ClassifiedLine, CompiledConfig, LineKind, NoiseShape, RawLine};
use regex::Regex;
use tracing::trace;

fn date_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^\s*(?P<date>\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[./-]\d{1,2}(?:[./-](?:\d{4}|\d{2}))?)",
            r"(?:\s+(?P<rest>.*))?$"
        ))
        .expect("date prefix regex")
    })
}

fn plausible_day_month(date: &str) -> bool {
    let fields: Vec<u32> = date
        .split(['/', '.', '-'])
        .filter_map(|f| f.parse().ok())
        .collect();
    match fields.as_slice() {
        [y, m, d] if *y >= 1000 => (1..=12).contains(m) && (1..=31).contains(d),
        [a, b, ..] => {
            let day_month = (1..=31).contains(a) && (1..=12).contains(b);
            let month_day = (1..=12).contains(a) && (1..=31).contains(b);
            day_month || month_day
        }
        _ => false,
    }
}

/// Split a line into its leading date text and the remainder.
pub fn date_prefix(text: &str) -> Option<(&str, &str)> {
    let caps = date_prefix_re().captures(text)?;
    let date = caps.name("date")?.as_str();
    if !plausible_day_month(date) {
        return None;
    }
    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");
    Some((date, rest))
}

/// What the classifier remembers about the lines it has already seen.
#[derive(Debug, Clone, Default)]
pub struct RecentLines {
    block_open: bool,
}

impl RecentLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, kind: LineKind) {
        match kind {
            LineKind::TransactionStart => self.block_open = true,
            LineKind::Noise(NoiseShape::SectionBreak) => self.block_open = false,
            LineKind::Continuation | LineKind::Noise(_) => {}
        }
    }
}

pub struct LineClassifier<'a> {
    config: &'a CompiledConfig,
}

impl<'a> LineClassifier<'a> {
    pub fn new(config: &'a CompiledConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, line: &RawLine, recent: &RecentLines) -> LineKind {
        let text = line.text.trim();
        if text.is_empty() {
            return LineKind::Noise(NoiseShape::Blank);
        }
        if self.config.section_breaks.iter().any(|re| re.is_match(text)) {
            return LineKind::Noise(NoiseShape::SectionBreak);
        }
        if self.config.noise.iter().any(|re| re.is_match(text)) {
            return LineKind::Noise(NoiseShape::Boilerplate);
        }

        if date_prefix(text).is_some_and(|(_, rest)| rest.chars().any(char::is_alphabetic)) {
            return LineKind::TransactionStart;
        }

        if !recent.block_open {
            trace!(page = line.page_index, line = line.line_index, "continuation outside a block");
        }
        LineKind::Continuation
    }

    /// Classify a whole document in order.
    pub fn classify_all(&self, lines: &[RawLine]) -> Vec<ClassifiedLine> {
        let mut recent = RecentLines::new();
        lines
            .iter()
            .map(|line| {
                let kind = self.classify(line, &recent);
                trace!(page = line.page_index, line = line.line_index, ?kind, "classified");
                recent.observe(kind);
                ClassifiedLine {
                    line: line.clone(),
                    kind,
                }
            })
            .collect()
    }
}
