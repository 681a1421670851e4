//! Flags rows that look like the same charge printed twice.

use std::collections::HashMap;

use chrono::NaiveDate;
use extracto_core::{Diagnostic, Transaction};
use rust_decimal::Decimal;

type DuplicateKey<'a> = (NaiveDate, &'a str, Decimal, Option<u32>);

/// Same date, description, amount and installment index. Both rows stay in
/// the output; the later one is reported against the first occurrence.
pub fn find_duplicates(transactions: &[Transaction]) -> Vec<Diagnostic> {
    let mut seen: HashMap<DuplicateKey<'_>, usize> = HashMap::new();
    let mut found = Vec::new();

    for (i, t) in transactions.iter().enumerate() {
        let key = (t.date, t.description.as_str(), t.amount, t.installment_index);
        match seen.get(&key) {
            Some(&first) => found.push(Diagnostic::PossibleDuplicate { first, second: i }),
            None => {
                seen.insert(key, i);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn txn(day: u32, description: &str, amount: Decimal) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            description: description.to_string(),
            amount,
            balance_after: None,
            category: "uncategorized".to_string(),
            is_installment: false,
            installment_index: None,
            installment_count: None,
            installment_total: None,
            installment_remaining: None,
            installment_principal: None,
            installment_interest: None,
            service_fee: None,
        }
    }

    #[test]
    fn test_repeated_row_is_flagged() {
        let txns = [
            txn(15, "FARMACIA CENTRAL", dec!(-8.40)),
            txn(15, "MERCADONA", dec!(-8.40)),
            txn(15, "FARMACIA CENTRAL", dec!(-8.40)),
            txn(15, "FARMACIA CENTRAL", dec!(-8.40)),
        ];
        assert_eq!(
            find_duplicates(&txns),
            vec![
                Diagnostic::PossibleDuplicate { first: 0, second: 2 },
                Diagnostic::PossibleDuplicate { first: 0, second: 3 },
            ]
        );
    }

    #[test]
    fn test_different_day_or_amount_is_not_duplicate() {
        let txns = [
            txn(15, "NETFLIX.COM", dec!(-12.99)),
            txn(16, "NETFLIX.COM", dec!(-12.99)),
            txn(15, "NETFLIX.COM", dec!(-13.99)),
        ];
        assert!(find_duplicates(&txns).is_empty());
    }

    #[test]
    fn test_scale_does_not_hide_duplicates() {
        let txns = [txn(1, "X", dec!(-8.4)), txn(1, "X", dec!(-8.40))];
        assert_eq!(find_duplicates(&txns).len(), 1);
    }
}
