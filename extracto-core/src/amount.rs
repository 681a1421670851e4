//! Amount tokens in statement text.
//!
//! Statements mix `1.234,56`, `1,234.56`, `(45.00)`, `45,00-`, `- $14.05` and
//! `120,00 CR` freely, often within one document. Scanning works on
//! whitespace-separated words so that adjacent columns never merge, and the
//! decimal separator is decided per token (see [`parse_decimal`]).

use std::ops::Range;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

/// Sign evidence carried by the token text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMarker {
    Unsigned,
    /// Leading/trailing `-`, parentheses or a `DR` suffix.
    Negative,
    /// Leading `+` or a `CR` suffix.
    Positive,
}

/// An amount found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountToken {
    /// Source text of every word the token consumed, single-space joined.
    pub text: String,
    pub magnitude: Decimal,
    pub sign: SignMarker,
    /// Character offset of the first consumed word within the line.
    pub offset: usize,
    /// Indices of the consumed words.
    pub words: Range<usize>,
}

impl AmountToken {
    /// Signed value, using `negative_by_default` when the token is unsigned.
    pub fn signed(&self, negative_by_default: bool) -> Decimal {
        let negative = match self.sign {
            SignMarker::Negative => true,
            SignMarker::Positive => false,
            SignMarker::Unsigned => negative_by_default,
        };
        if negative { -self.magnitude } else { self.magnitude }
    }
}

#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    offset: usize,
}

/// A line split into words with its amount tokens identified.
#[derive(Debug, Clone)]
pub struct ScannedLine<'a> {
    words: Vec<Word<'a>>,
    pub amounts: Vec<AmountToken>,
}

impl ScannedLine<'_> {
    /// The line's words minus the given consumed word ranges.
    pub fn text_without(&self, consumed: &[Range<usize>]) -> String {
        self.words
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.iter().any(|r| r.contains(i)))
            .map(|(_, w)| w.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn text(&self) -> String {
        self.text_without(&[])
    }
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+").expect("word regex"))
}

fn amount_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<open>\()?(?P<lead>[-+])?[$€£]?(?P<lead2>[-+])?",
            r"(?P<num>\d{1,3}(?:[.,']\d{3})+[.,]\d{2}|\d+[.,]\d{2})",
            r"[$€£]?(?P<trail>-)?(?P<close>\))?$"
        ))
        .expect("amount regex")
    })
}

fn is_currency_word(w: &str) -> bool {
    matches!(w, "$" | "€" | "£" | "EUR" | "USD")
}

fn sign_word(w: &str) -> Option<SignMarker> {
    match w {
        "-" => Some(SignMarker::Negative),
        "+" => Some(SignMarker::Positive),
        _ => None,
    }
}

fn suffix_word(w: &str) -> Option<SignMarker> {
    match w.to_ascii_uppercase().as_str() {
        "CR" => Some(SignMarker::Positive),
        "DR" => Some(SignMarker::Negative),
        _ => None,
    }
}

/// Split a line into words and find every amount token in it.
pub fn scan_line(line: &str) -> ScannedLine<'_> {
    let words: Vec<Word<'_>> = word_re()
        .find_iter(line)
        .map(|m| Word {
            text: m.as_str(),
            offset: line[..m.start()].chars().count(),
        })
        .collect();

    let mut amounts = Vec::new();
    // First word index not yet owned by an amount token.
    let mut free_from = 0;
    let mut i = 0;

    while i < words.len() {
        let Some(caps) = amount_word_re().captures(words[i].text) else {
            i += 1;
            continue;
        };
        let Some(magnitude) = parse_decimal(&caps["num"]) else {
            i += 1;
            continue;
        };

        let parens = caps.name("open").is_some() && caps.name("close").is_some();
        let mut sign = if parens || caps.name("trail").is_some() {
            SignMarker::Negative
        } else {
            match caps.name("lead").or(caps.name("lead2")).map(|m| m.as_str()) {
                Some("-") => SignMarker::Negative,
                Some("+") => SignMarker::Positive,
                _ => SignMarker::Unsigned,
            }
        };

        let mut start = i;
        if start > free_from && is_currency_word(words[start - 1].text) {
            start -= 1;
        }
        if start > free_from {
            if let Some(s) = sign_word(words[start - 1].text) {
                if sign == SignMarker::Unsigned {
                    sign = s;
                }
                start -= 1;
            }
        }

        let mut end = i + 1;
        if end < words.len() && is_currency_word(words[end].text) {
            end += 1;
        }
        if end < words.len() {
            if let Some(s) = suffix_word(words[end].text) {
                sign = s;
                end += 1;
            }
        }

        let text = words[start..end]
            .iter()
            .map(|w| w.text)
            .collect::<Vec<_>>()
            .join(" ");
        amounts.push(AmountToken {
            text,
            magnitude,
            sign,
            offset: words[start].offset,
            words: start..end,
        });
        free_from = end;
        i = end;
    }

    ScannedLine { words, amounts }
}

/// Parse a single amount string (as stored in a block) with its sign marker.
pub fn parse_amount(text: &str) -> Option<AmountToken> {
    let scanned = scan_line(text);
    scanned.amounts.into_iter().next()
}

/// Locale-tolerant decimal parsing of an unsigned numeric token.
///
/// The `.` or `,` nearest the end of the token is the decimal separator when
/// exactly two digits follow it; every other `.`, `,`, `'` or space is a
/// thousands separator.
pub fn parse_decimal(token: &str) -> Option<Decimal> {
    let token = token.trim();
    if token.is_empty()
        || !token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '\'' | ' '))
    {
        return None;
    }

    let (int_part, frac_part) = match token.rfind(['.', ',']) {
        Some(pos) => {
            let tail = &token[pos + 1..];
            if tail.len() == 2 && tail.chars().all(|c| c.is_ascii_digit()) {
                (&token[..pos], Some(tail))
            } else {
                (token, None)
            }
        }
        None => (token, None),
    };

    let mut digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        digits.push('0');
    }
    if let Some(frac) = frac_part {
        digits.push('.');
        digits.push_str(frac);
    }
    Decimal::from_str(&digits).ok()
}
