//! extracto-finance: normalization of raw blocks into canonical transactions,
//! category rules, balance and duplicate checks, statement summaries, and
//! the end-to-end statement parser.

pub mod balance;
pub mod category_rules;
pub mod duplicates;
pub mod normalizer;
pub mod pipeline;
pub mod summary;

pub use balance::validate_balances;
pub use category_rules::{UNCATEGORIZED, categorize};
pub use duplicates::find_duplicates;
pub use normalizer::TransactionNormalizer;
pub use pipeline::{PAGE_BREAK, ParsedStatement, StatementParser};
pub use summary::StatementSummary;
