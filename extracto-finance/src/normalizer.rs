//! Raw blocks to canonical transactions.

use chrono::NaiveDate;
use extracto_core::{
    AmountColumn, BlockError, CompiledConfig, FractionatedGroup, RawTransactionBlock, SignMarker,
    Transaction, parse_amount, parse_date, parse_decimal,
};

use crate::category_rules::categorize;

pub struct TransactionNormalizer<'a> {
    config: &'a CompiledConfig,
    reference: Option<NaiveDate>,
}

impl<'a> TransactionNormalizer<'a> {
    /// `reference` anchors the date plausibility window and supplies the
    /// year for year-less dates.
    pub fn new(config: &'a CompiledConfig, reference: Option<NaiveDate>) -> Self {
        Self { config, reference }
    }

    pub fn normalize(
        &self,
        block: &RawTransactionBlock,
        fractionated: Option<&FractionatedGroup>,
    ) -> Result<Transaction, BlockError> {
        let date = parse_date(
            &block.date_text,
            &self.config.date_formats,
            self.reference,
            self.config.reference_year_window,
        )
        .ok_or_else(|| BlockError::DateParse(block.date_text.clone()))?;

        let full_description = block.description();
        let description = match fractionated {
            Some(group) => group.base_description.clone(),
            None => full_description.clone(),
        };
        if description.is_empty() {
            return Err(BlockError::MissingDescription);
        }

        let token = parse_amount(&block.amount_text)
            .ok_or_else(|| BlockError::AmountParse(block.amount_text.clone()))?;

        // Column > explicit marker > credit keyword > debit.
        let negative = match block.amount_column {
            Some(AmountColumn::Debit) => true,
            Some(AmountColumn::Credit) => false,
            None => match token.sign {
                SignMarker::Negative => true,
                SignMarker::Positive => false,
                SignMarker::Unsigned => !self.has_credit_keyword(&full_description),
            },
        };
        let amount = if negative && !token.magnitude.is_zero() {
            -token.magnitude
        } else {
            token.magnitude
        };

        let balance_after = block
            .balance_text
            .as_deref()
            .and_then(parse_amount)
            .map(|balance| balance.signed(false));

        let category = categorize(&description, &self.config.category_rules).to_string();

        Ok(Transaction {
            date,
            description,
            amount,
            balance_after,
            category,
            is_installment: fractionated.is_some(),
            installment_index: fractionated.map(|g| g.installment_index),
            installment_count: fractionated.map(|g| g.installment_count),
            installment_total: fractionated.and_then(|g| g.total_amount),
            installment_remaining: fractionated.map(FractionatedGroup::projected_outstanding),
            installment_principal: fractionated.and_then(|g| g.principal),
            installment_interest: fractionated.and_then(|g| g.interest),
            service_fee: block.figures.service_fee.as_deref().and_then(parse_decimal),
        })
    }

    fn has_credit_keyword(&self, description: &str) -> bool {
        let lowered = description.to_lowercase();
        self.config
            .credit_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extracto_core::{AmountLayout, BlockFigures, ParserConfig};
    use rust_decimal_macros::dec;

    fn config() -> CompiledConfig {
        CompiledConfig::compile(&ParserConfig::default()).unwrap()
    }

    fn reference() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, 31)
    }

    fn block(date: &str, description: &str, amount: &str) -> RawTransactionBlock {
        RawTransactionBlock {
            date_text: date.to_string(),
            description_lines: vec![description.to_string()],
            amount_text: amount.to_string(),
            balance_text: None,
            amount_column: None,
            figures: BlockFigures::default(),
            source_page: 0,
            source_line: 0,
        }
    }

    #[test]
    fn test_sign_markers() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());

        let cases = [
            ("-45.300,00", dec!(-45300.00)),
            ("(12,50)", dec!(-12.50)),
            ("12,50-", dec!(-12.50)),
            ("12,50 DR", dec!(-12.50)),
            ("12,50 CR", dec!(12.50)),
            ("+12,50", dec!(12.50)),
            ("12,50", dec!(-12.50)),
        ];
        for (text, expected) in cases {
            let t = n.normalize(&block("15/03/2024", "TIENDA", text), None).unwrap();
            assert_eq!(t.amount, expected, "amount text {text}");
        }
    }

    #[test]
    fn test_credit_keyword_flips_unsigned_amount() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());
        let t = n
            .normalize(&block("15/03/2024", "ABONO DEVOLUCION ZARA", "19,95"), None)
            .unwrap();
        assert_eq!(t.amount, dec!(19.95));

        // Explicit marker beats the keyword.
        let t = n
            .normalize(&block("15/03/2024", "ABONO ANULADO", "(19,95)"), None)
            .unwrap();
        assert_eq!(t.amount, dec!(-19.95));
    }

    #[test]
    fn test_column_beats_marker() {
        let config = CompiledConfig::compile(&ParserConfig {
            layout: AmountLayout::DebitCredit {
                credit_column: 40,
                balance_column: None,
            },
            ..ParserConfig::default()
        })
        .unwrap();
        let n = TransactionNormalizer::new(&config, reference());

        let mut b = block("15/03/2024", "AJUSTE", "-5,00");
        b.amount_column = Some(AmountColumn::Credit);
        assert_eq!(n.normalize(&b, None).unwrap().amount, dec!(5.00));

        b.amount_column = Some(AmountColumn::Debit);
        b.amount_text = "5,00".to_string();
        assert_eq!(n.normalize(&b, None).unwrap().amount, dec!(-5.00));
    }

    #[test]
    fn test_installment_fields_and_partial_amount() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());
        let group = FractionatedGroup {
            base_description: "SUPERMERCADO LA NACIONAL".to_string(),
            installment_index: 2,
            installment_count: 6,
            partial_amount: dec!(45300.00),
            total_amount: None,
            remaining_after: None,
            principal: None,
            interest: None,
        };
        let b = RawTransactionBlock {
            description_lines: vec!["SUPERMERCADO LA NACIONAL".into(), "cuota 2/6".into()],
            ..block("15/03/2024", "", "-45.300,00")
        };

        let t = n.normalize(&b, Some(&group)).unwrap();
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(t.description, "SUPERMERCADO LA NACIONAL");
        assert_eq!(t.amount, dec!(-45300.00));
        assert_eq!(t.category, "groceries");
        assert!(t.is_installment);
        assert_eq!(t.installment_index, Some(2));
        assert_eq!(t.installment_count, Some(6));
        assert_eq!(t.installment_remaining, Some(dec!(181200.00)));
        assert_eq!(t.installment_interest, None);
    }

    #[test]
    fn test_service_fee_is_kept_apart_from_amount() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());
        let mut b = block("15/03/2024", "ZARA MADRID", "45,00");
        b.figures.service_fee = Some("1,50".to_string());

        let t = n.normalize(&b, None).unwrap();
        assert_eq!(t.amount, dec!(-45.00));
        assert_eq!(t.service_fee, Some(dec!(1.50)));
        assert_eq!(t.balance_after, None);
    }

    #[test]
    fn test_row_principal_and_interest_reach_the_transaction() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());
        let group = FractionatedGroup {
            base_description: "CAJ.LA CAIXA OF.7102".to_string(),
            installment_index: 3,
            installment_count: 12,
            partial_amount: dec!(52.10),
            total_amount: Some(dec!(600.00)),
            remaining_after: Some(dec!(500.00)),
            principal: Some(dec!(50.00)),
            interest: Some(dec!(2.10)),
        };
        let b = block("07.03.2024", "CAJ.LA CAIXA OF.7102 Plazo 3 De 12", "52,10");

        let t = n.normalize(&b, Some(&group)).unwrap();
        assert_eq!(t.amount, dec!(-52.10));
        assert_eq!(t.installment_total, Some(dec!(600.00)));
        assert_eq!(t.installment_remaining, Some(dec!(500.00)));
        assert_eq!(t.installment_principal, Some(dec!(50.00)));
        assert_eq!(t.installment_interest, Some(dec!(2.10)));
    }

    #[test]
    fn test_balance_is_parsed() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());
        let mut b = block("15/03/2024", "MERCADONA", "45,30");
        b.balance_text = Some("1.454,70".to_string());
        assert_eq!(n.normalize(&b, None).unwrap().balance_after, Some(dec!(1454.70)));

        b.balance_text = Some("-20,00".to_string());
        assert_eq!(n.normalize(&b, None).unwrap().balance_after, Some(dec!(-20.00)));
    }

    #[test]
    fn test_block_errors() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());

        let err = n.normalize(&block("31/02/2024", "X", "1,00"), None).unwrap_err();
        assert_eq!(err, BlockError::DateParse("31/02/2024".to_string()));

        let err = n.normalize(&block("15/03/2019", "X", "1,00"), None).unwrap_err();
        assert!(matches!(err, BlockError::DateParse(_)));

        let err = n.normalize(&block("15/03/2024", "   ", "1,00"), None).unwrap_err();
        assert_eq!(err, BlockError::MissingDescription);

        let err = n.normalize(&block("15/03/2024", "X", "uno"), None).unwrap_err();
        assert_eq!(err, BlockError::AmountParse("uno".to_string()));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let config = config();
        let n = TransactionNormalizer::new(&config, reference());
        let b = block("07/03", "FARMACIA CENTRAL", "8,40");
        assert_eq!(n.normalize(&b, None).unwrap(), n.normalize(&b, None).unwrap());
        assert_eq!(n.normalize(&b, None).unwrap().category, "health");
    }
}
