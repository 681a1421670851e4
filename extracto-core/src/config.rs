//! Parser configuration: the serde-facing [`ParserConfig`] and its compiled
//! form [`CompiledConfig`], built once per parser and shared read-only.

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where amounts sit on a transaction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AmountLayout {
    /// One amount column, optionally followed by a running balance.
    Single { with_balance: bool },
    /// Separate debit and credit columns. Offsets are character positions on
    /// layout-preserving text (`pdftotext -layout`).
    DebitCredit {
        credit_column: usize,
        balance_column: Option<usize>,
    },
}

impl Default for AmountLayout {
    fn default() -> Self {
        AmountLayout::Single { with_balance: true }
    }
}

/// Ordered description rule: first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(pattern: &str, category: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            category: category.to_string(),
        }
    }
}

/// Everything the engine can be tuned with. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// chrono formats, tried in order. Formats without a year take it from
    /// the reference date.
    pub date_formats: Vec<String>,
    pub balance_tolerance: Decimal,
    /// Dates further than this many years from the reference date are rejected.
    pub reference_year_window: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
    pub credit_keywords: Vec<String>,
    pub noise_patterns: Vec<String>,
    pub section_break_patterns: Vec<String>,
    /// Must define named groups `index` and `count`.
    pub installment_marker_patterns: Vec<String>,
    /// Must define a named group `amount`.
    pub installment_total_patterns: Vec<String>,
    /// Must define a named group `amount`.
    pub installment_remaining_patterns: Vec<String>,
    /// Installment notes removed from the description, e.g. next due date.
    pub installment_detail_patterns: Vec<String>,
    /// Multi-figure installment rows. Must define a named group `charge`
    /// (the amount billed this period); `total`, `pending`, `principal` and
    /// `interest` are optional.
    pub installment_row_patterns: Vec<String>,
    /// Service charges printed next to an operation. Must define a named
    /// group `amount`.
    pub service_fee_patterns: Vec<String>,
    pub layout: AmountLayout,
    pub category_rules: Vec<CategoryRule>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            date_formats: strings(&[
                "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y-%m-%d", "%d/%m/%y", "%d.%m.%y",
                "%d-%m-%y", "%m/%d/%Y", "%m/%d/%y", "%d/%m", "%d.%m",
            ]),
            balance_tolerance: Decimal::new(1, 2),
            reference_year_window: 2,
            reference_date: None,
            credit_keywords: strings(&[
                "abono",
                "pago recibido",
                "devolución",
                "devolucion",
                "reembolso",
                "transferencia recibida",
                "ingreso",
                "nómina",
                "nomina",
                "payment received",
                "payment - thank you",
                "refund",
            ]),
            noise_patterns: strings(&[
                r"^\s*(p[áa]g(ina)?\.?|page)\s*\d+(\s*(de|of|/)\s*\d+)?\s*$",
                r"^\s*(fecha|date)\b.*\b(concepto|descripci[óo]n|description|importe|amount)\b",
                r"\d{1,2}[./-]\d{1,2}[./-]\d{2,4}\s*(-|al|a|to)\s*\d{1,2}[./-]\d{1,2}[./-]\d{2,4}",
                r"^\s*(titular|holder|n[º°]?\s*de\s*tarjeta|card\s+number|l[íi]mite|credit\s+limit)\b",
                r"^\s*(extracto|statement)\b",
                r"^\s*(contin[úu]a|continued)\b",
            ]),
            section_break_patterns: strings(&[
                r"^\s*(total|subtotal|suma)\b",
                r"^\s*saldo\s+(anterior|inicial|final)\b",
                r"^\s*(previous|opening|closing|new)\s+balance\b",
                r"^\s*(importe\s+)?operaciones\s+(fraccionadas|de\s+la\s+tarjeta|del\s+per[íi]odo)\b",
                r"^\s*(transaction\s+detail|account\s+activity)\b",
            ]),
            installment_marker_patterns: strings(&[
                r"\bcuotas?\s*(?:n[º°.]?\s*)?(?P<index>\d{1,3}\b)?(?:\s*(?:/|de)\s*(?P<count>\d{1,3}\b))?",
                r"\bplazos?\s*(?P<index>\d{1,3}\b)?(?:\s*(?:/|de)\s*(?P<count>\d{1,3}\b))?",
                r"\b(?:installment|inst\.)\s*(?P<index>\d{1,3}\b)?(?:\s*(?:/|of)\s*(?P<count>\d{1,3}\b))?",
            ]),
            installment_total_patterns: strings(&[
                r"importe\s*(de\s*la\s*)?operaci[óo]n\D{0,20}?(?P<amount>\d[\d.,']*[.,]\d{2})",
                r"(original|purchase)\s+amount\D{0,20}?(?P<amount>\d[\d.,']*[.,]\d{2})",
            ]),
            installment_remaining_patterns: strings(&[
                r"importe\s*pendiente\s*despu[ée]s\D{0,20}?(?P<amount>\d[\d.,']*[.,]\d{2})",
                r"remaining\s+balance\D{0,20}?(?P<amount>\d[\d.,']*[.,]\d{2})",
            ]),
            installment_detail_patterns: strings(&[
                r"pr[óo]ximo\s*plazo\s*\d{1,2}[./-]\d{1,2}[./-]\d{2,4}",
                r"next\s+installment\s+\d{1,2}[./-]\d{1,2}[./-]\d{2,4}",
            ]),
            installment_row_patterns: strings(&[concat!(
                r"(?:^|\s)(?P<total>\d[\d.,']*[.,]\d{2})\s+(?P<pending>\d[\d.,']*[.,]\d{2})",
                r"\s+(?P<principal>\d[\d.,']*[.,]\d{2})\s+(?P<interest>\d[\d.,']*[.,]\d{2})",
                r"\s+(?P<charge>\d[\d.,']*[.,]\d{2})\s*$",
            )]),
            service_fee_patterns: strings(&[
                r"importe\s*(?:de\s*)?servicios\s*:?\s*(?P<amount>\d[\d.,']*[.,]\d{2})",
                r"\bservicios:\s*(?P<amount>\d[\d.,']*[.,]\d{2})",
            ]),
            layout: AmountLayout::default(),
            category_rules: vec![
                CategoryRule::new(
                    r"supermercado|mercadona|carrefour|\blidl\b|\baldi\b|eroski|alcampo|hipercor|grocery|h-e-b|walmart",
                    "groceries",
                ),
                CategoryRule::new(
                    r"restaurante?|\bbar\b|cafeter[íi]a|\bcaf[eé]\b|burger|pizza|mcdonald|starbucks|glovo|just\s*eat|uber\s*eats",
                    "dining",
                ),
                CategoryRule::new(
                    r"gasolinera|repsol|cepsa|\bgalp\b|\bbp\b|\bshell\b|\bfuel\b|estaci[óo]n\s+de\s+servicio",
                    "fuel",
                ),
                CategoryRule::new(
                    r"renfe|\bmetro\b|\btaxi\b|\buber\b|cabify|parking|aparcamiento|peaje|clipper",
                    "transport",
                ),
                CategoryRule::new(
                    r"farmacia|pharmacy|cl[íi]nica|hospital|dental|[óo]ptica",
                    "health",
                ),
                CategoryRule::new(
                    r"netflix|spotify|\bhbo\b|disney|amazon\s+prime|apple\.com|icloud|google\s*\*|youtube|openai|github",
                    "subscriptions",
                ),
                CategoryRule::new(
                    r"amazon|aliexpress|el\s+corte\s+ingl[ée]s|\bzara\b|ikea|decathlon|media\s*markt",
                    "shopping",
                ),
                CategoryRule::new(
                    r"iberdrola|endesa|naturgy|telef[óo]nica|movistar|vodafone|\borange\b|electricidad",
                    "utilities",
                ),
                CategoryRule::new(
                    r"cajero|reintegro|\batm\b|withdrawal|caj\.la\s*caixa",
                    "cash",
                ),
                CategoryRule::new(
                    r"comisi[óo]n|intereses|inter[ée]s\b|cuota\s+anual|\bfee\b|interest",
                    "fees",
                ),
                CategoryRule::new(r"n[óo]mina|payroll|salary", "income"),
                CategoryRule::new(r"transferencia|bizum|transfer|zelle", "transfers"),
            ],
        }
    }
}

/// A category rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub pattern: Regex,
    pub category: String,
}

/// [`ParserConfig`] with every pattern compiled and validated.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub date_formats: Vec<String>,
    pub balance_tolerance: Decimal,
    pub reference_year_window: u32,
    pub reference_date: Option<NaiveDate>,
    /// Lowercased.
    pub credit_keywords: Vec<String>,
    pub noise: Vec<Regex>,
    pub section_breaks: Vec<Regex>,
    pub installment_markers: Vec<Regex>,
    pub installment_totals: Vec<Regex>,
    pub installment_remaining: Vec<Regex>,
    pub installment_details: Vec<Regex>,
    pub installment_rows: Vec<Regex>,
    pub service_fees: Vec<Regex>,
    pub layout: AmountLayout,
    pub category_rules: Vec<CompiledRule>,
}

fn compile_one(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            field,
            pattern: pattern.to_string(),
            source,
        })
}

fn compile_all(
    field: &'static str,
    patterns: &[String],
    required_groups: &[&'static str],
) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            let re = compile_one(field, p)?;
            for group in required_groups {
                if !re.capture_names().flatten().any(|name| name == *group) {
                    return Err(ConfigError::MissingGroup {
                        field,
                        pattern: p.clone(),
                        group,
                    });
                }
            }
            Ok(re)
        })
        .collect()
}

impl CompiledConfig {
    pub fn compile(config: &ParserConfig) -> Result<Self, ConfigError> {
        if config.date_formats.is_empty() {
            return Err(ConfigError::NoDateFormats);
        }
        for fmt in &config.date_formats {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::InvalidDateFormat(fmt.clone()));
            }
        }

        let category_rules = config
            .category_rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    pattern: compile_one("category_rules", &rule.pattern)?,
                    category: rule.category.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            date_formats: config.date_formats.clone(),
            balance_tolerance: config.balance_tolerance.abs(),
            reference_year_window: config.reference_year_window,
            reference_date: config.reference_date,
            credit_keywords: config
                .credit_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            noise: compile_all("noise_patterns", &config.noise_patterns, &[])?,
            section_breaks: compile_all(
                "section_break_patterns",
                &config.section_break_patterns,
                &[],
            )?,
            installment_markers: compile_all(
                "installment_marker_patterns",
                &config.installment_marker_patterns,
                &["index", "count"],
            )?,
            installment_totals: compile_all(
                "installment_total_patterns",
                &config.installment_total_patterns,
                &["amount"],
            )?,
            installment_remaining: compile_all(
                "installment_remaining_patterns",
                &config.installment_remaining_patterns,
                &["amount"],
            )?,
            installment_details: compile_all(
                "installment_detail_patterns",
                &config.installment_detail_patterns,
                &[],
            )?,
            installment_rows: compile_all(
                "installment_row_patterns",
                &config.installment_row_patterns,
                &["charge"],
            )?,
            service_fees: compile_all("service_fee_patterns", &config.service_fee_patterns, &["amount"])?,
            layout: config.layout,
            category_rules,
        })
    }

    /// Lines carrying installment amount notes. Their figures are never a
    /// transaction amount or balance.
    pub fn is_installment_annotation(&self, text: &str) -> bool {
        self.installment_totals
            .iter()
            .chain(&self.installment_remaining)
            .any(|re| re.is_match(text))
    }
}
