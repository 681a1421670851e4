//! Running-balance round trip across adjacent transactions.

use extracto_core::{Diagnostic, Transaction};
use rust_decimal::Decimal;
use tracing::warn;

/// Every adjacent pair with both balances present must satisfy
/// `balance[i] == balance[i - 1] + amount[i]` within `tolerance`. Mismatches
/// are reported, never corrected. Pairs with a missing balance are skipped.
pub fn validate_balances(transactions: &[Transaction], tolerance: Decimal) -> Vec<Diagnostic> {
    let tolerance = tolerance.abs();
    transactions
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let previous = pair[0].balance_after?;
            let declared = pair[1].balance_after?;
            let expected = previous + pair[1].amount;
            let difference = (declared - expected).abs();
            if difference <= tolerance {
                return None;
            }
            let index = i + 1;
            warn!(
                row = index + 1,
                %expected,
                %declared,
                %difference,
                description = %pair[1].description,
                "balance mismatch"
            );
            Some(Diagnostic::BalanceMismatch {
                index,
                expected,
                declared,
                difference,
            })
        })
        .collect()
}
