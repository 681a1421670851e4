//! extracto-ingest: turns extracted statement lines into raw transaction
//! blocks. Classification, block assembly, installment resolution and
//! statement header extraction.

pub mod assembler;
pub mod classifier;
pub mod header;
pub mod installments;

pub use assembler::{Assembly, TransactionAssembler};
pub use classifier::{LineClassifier, RecentLines, date_prefix};
pub use header::extract_header;
pub use installments::{FractionatedOperationResolver, Resolution};
