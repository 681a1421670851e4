//! Per-document totals, the "summary sheet" of an export.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use extracto_core::Transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub transaction_count: usize,
    pub installment_count: usize,
    /// Magnitude of all debits.
    pub total_debits: Decimal,
    pub total_credits: Decimal,
    pub net: Decimal,
    /// Signed sum per category.
    pub by_category: BTreeMap<String, Decimal>,
    /// Installment charges billed in this statement.
    pub installments_billed: Decimal,
    pub installments_outstanding: Decimal,
    pub installment_interest: Decimal,
    /// Service charges printed next to operations, not part of `net`.
    pub service_fees: Decimal,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl StatementSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut summary = StatementSummary {
            transaction_count: transactions.len(),
            ..Default::default()
        };

        for t in transactions {
            if t.is_debit() {
                summary.total_debits += t.amount.abs();
            } else {
                summary.total_credits += t.amount;
            }
            summary.net += t.amount;
            *summary
                .by_category
                .entry(t.category.clone())
                .or_insert(Decimal::ZERO) += t.amount;

            if t.is_installment {
                summary.installment_count += 1;
                summary.installments_billed += t.amount.abs();
                summary.installments_outstanding += t.installment_remaining.unwrap_or_default();
                summary.installment_interest += t.installment_interest.unwrap_or_default();
            }
            summary.service_fees += t.service_fee.unwrap_or_default();
        }

        summary.first_date = transactions.iter().map(|t| t.date).min();
        summary.last_date = transactions.iter().map(|t| t.date).max();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn txn(day: u32, category: &str, amount: Decimal, installment: Option<(u32, u32)>) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            description: "X".to_string(),
            amount,
            balance_after: None,
            category: category.to_string(),
            is_installment: installment.is_some(),
            installment_index: installment.map(|(i, _)| i),
            installment_count: installment.map(|(_, c)| c),
            installment_total: None,
            installment_remaining: installment.map(|(i, c)| amount.abs() * Decimal::from(c - i)),
            installment_principal: None,
            installment_interest: None,
            service_fee: None,
        }
    }

    #[test]
    fn test_totals() {
        let txns = [
            txn(1, "income", dec!(1500.00), None),
            txn(4, "groceries", dec!(-45.30), None),
            txn(7, "shopping", dec!(-50.00), Some((3, 12))),
            txn(10, "shopping", dec!(19.95), None),
        ];
        let s = StatementSummary::from_transactions(&txns);

        assert_eq!(s.transaction_count, 4);
        assert_eq!(s.installment_count, 1);
        assert_eq!(s.total_debits, dec!(95.30));
        assert_eq!(s.total_credits, dec!(1519.95));
        assert_eq!(s.net, dec!(1424.65));
        assert_eq!(s.by_category["shopping"], dec!(-30.05));
        assert_eq!(s.installments_billed, dec!(50.00));
        assert_eq!(s.installments_outstanding, dec!(450.00));
        assert_eq!(s.first_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(s.last_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(s.installment_interest, Decimal::ZERO);
        assert_eq!(s.service_fees, Decimal::ZERO);
    }

    #[test]
    fn test_fees_and_interest_stay_out_of_net() {
        let mut fee = txn(5, "shopping", dec!(-45.00), None);
        fee.service_fee = Some(dec!(1.50));
        let mut row = txn(7, "other", dec!(-52.10), Some((3, 12)));
        row.installment_interest = Some(dec!(2.10));

        let s = StatementSummary::from_transactions(&[fee, row]);
        assert_eq!(s.net, dec!(-97.10));
        assert_eq!(s.service_fees, dec!(1.50));
        assert_eq!(s.installment_interest, dec!(2.10));
    }

    #[test]
    fn test_empty() {
        assert_eq!(StatementSummary::from_transactions(&[]), StatementSummary::default());
    }
}
