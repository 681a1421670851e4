//! Ordered description rules mapping transactions to categories.
//!
//! The rule list is configuration (`ParserConfig::category_rules`), so the
//! policy can change without recompiling. First match wins.

use extracto_core::CompiledRule;

pub const UNCATEGORIZED: &str = "uncategorized";

pub fn categorize<'a>(description: &str, rules: &'a [CompiledRule]) -> &'a str {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(description))
        .map(|rule| rule.category.as_str())
        .unwrap_or(UNCATEGORIZED)
}
