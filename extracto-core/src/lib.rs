//! extracto-core: statement data model, parser configuration, amount
//! scanning and the error/diagnostic types shared by the pipeline crates.

pub mod amount;
pub mod config;
pub mod dates;
pub mod diagnostics;
pub mod error;
pub mod model;

pub use amount::{AmountToken, ScannedLine, SignMarker, parse_amount, parse_decimal, scan_line};
pub use config::{AmountLayout, CategoryRule, CompiledConfig, CompiledRule, ParserConfig};
pub use dates::{matches_date_format, parse_date};
pub use diagnostics::{Diagnostic, SkipReason};
pub use error::{BlockError, ConfigError, StatementError};
pub use model::{
    AmountColumn, BlockFigures, ClassifiedLine, FractionatedGroup, LineKind, NoiseShape, RawLine,
    RawTransactionBlock, StatementHeader, Transaction,
};
