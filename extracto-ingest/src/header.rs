//! Statement-level facts printed above the transaction table.

use std::sync::OnceLock;

use extracto_core::{RawLine, StatementHeader, parse_amount, parse_date};
use regex::Regex;

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)(?P<start>\d{1,2}[./-]\d{1,2}[./-]\d{2,4})",
            r"\s*(?:-|al|a|to)\s*",
            r"(?P<end>\d{1,2}[./-]\d{1,2}[./-]\d{2,4})"
        ))
        .expect("period regex")
    })
}

fn labelled_holder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:titular|account\s+holder|holder)\s*:\s*(?P<name>.+?)\s*$")
            .expect("holder regex")
    })
}

// Name in capitals followed by a customer code such as `12345-67`.
fn coded_holder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<name>[A-ZÁÉÍÓÚÑÜ][A-ZÁÉÍÓÚÑÜ .'-]*[A-ZÁÉÍÓÚÑÜ])\s+\d{5}-\d{2}\b")
            .expect("holder code regex")
    })
}

fn credit_limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:l[íi]mite(?:\s+de\s+cr[ée]dito)?|credit\s+limit)\b\D{0,30}?(?P<amount>\d[\d.,' ]*[.,]\d{2})")
            .expect("credit limit regex")
    })
}

/// Scan every line for the statement period, holder and credit limit. The
/// first occurrence of each wins; anything missing stays `None`.
pub fn extract_header(lines: &[RawLine], date_formats: &[String]) -> StatementHeader {
    let mut header = StatementHeader::default();

    for line in lines {
        let text = line.text.as_str();

        if header.period_end.is_none() {
            if let Some(caps) = period_re().captures(text) {
                let start = parse_date(&caps["start"], date_formats, None, 0);
                let end = parse_date(&caps["end"], date_formats, None, 0);
                if let (Some(start), Some(end)) = (start, end) {
                    if start <= end {
                        header.period_start = Some(start);
                        header.period_end = Some(end);
                    }
                }
            }
        }

        if header.holder.is_none() {
            header.holder = labelled_holder_re()
                .captures(text)
                .or_else(|| coded_holder_re().captures(text))
                .map(|caps| caps["name"].trim().to_string())
                .filter(|name| !name.is_empty());
        }

        if header.credit_limit.is_none() {
            header.credit_limit = credit_limit_re()
                .captures(text)
                .and_then(|caps| parse_amount(caps["amount"].trim()))
                .map(|token| token.magnitude);
        }
    }

    header
}
