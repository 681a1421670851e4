use chrono::NaiveDate;
use extracto_core::{Diagnostic, ParserConfig, RawLine, SkipReason, StatementError};
use extracto_finance::{ParsedStatement, StatementParser};
use rust_decimal_macros::dec;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join("mycard_statement.txt")
}

fn fixture_text() -> String {
    std::fs::read_to_string(fixture_path()).unwrap()
}

fn parse_fixture() -> ParsedStatement {
    StatementParser::new(&ParserConfig::default())
        .unwrap()
        .parse_text(&fixture_text())
        .unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Real-layout regression: two pages, installment annotations, totals footer.
#[test]
fn test_fixture_transactions() {
    let parsed = parse_fixture();
    let rows: Vec<(&str, rust_decimal::Decimal, &str)> = parsed
        .transactions
        .iter()
        .map(|t| (t.description.as_str(), t.amount, t.category.as_str()))
        .collect();

    assert_eq!(
        rows,
        vec![
            ("NOMINA ACME SL", dec!(1500.00), "income"),
            ("MERCADONA VALENCIA", dec!(-45.30), "groceries"),
            ("REPSOL ESTACION 2231", dec!(-60.00), "fuel"),
            ("IKEA VALENCIA", dec!(-50.00), "shopping"),
            ("DEVOLUCION ZARA", dec!(19.95), "shopping"),
            ("NETFLIX.COM", dec!(-12.99), "subscriptions"),
            ("FARMACIA CENTRAL", dec!(-8.40), "health"),
            ("FARMACIA CENTRAL", dec!(-8.40), "health"),
            ("CAJERO CAIXABANK", dec!(-100.00), "cash"),
        ]
    );
    assert_eq!(parsed.transactions[0].date, ymd(2024, 3, 1));
    assert_eq!(parsed.transactions[8].date, ymd(2024, 3, 20));
    assert_eq!(parsed.transactions[1].balance_after, Some(dec!(1454.70)));
}

#[test]
fn test_fixture_header() {
    let header = parse_fixture().header;
    assert_eq!(header.holder.as_deref(), Some("MARIA LOPEZ GARCIA"));
    assert_eq!(header.period_start, Some(ymd(2024, 3, 1)));
    assert_eq!(header.period_end, Some(ymd(2024, 3, 31)));
    assert_eq!(header.credit_limit, Some(dec!(3000.00)));
}

#[test]
fn test_fixture_installment() {
    let parsed = parse_fixture();
    let installments: Vec<_> = parsed.transactions.iter().filter(|t| t.is_installment).collect();
    assert_eq!(installments.len(), 1);

    let t = installments[0];
    assert_eq!(t.description, "IKEA VALENCIA");
    assert_eq!(t.installment_index, Some(3));
    assert_eq!(t.installment_count, Some(12));
    // The billed partial charge, not the purchase total.
    assert_eq!(t.amount, dec!(-50.00));
    assert_eq!(t.installment_total, Some(dec!(600.00)));
    assert_eq!(t.installment_remaining, Some(dec!(450.00)));
}

#[test]
fn test_fixture_diagnostics() {
    let parsed = parse_fixture();
    assert_eq!(
        parsed.diagnostics,
        vec![
            Diagnostic::SkippedBlock {
                page: 1,
                line: 8,
                reason: SkipReason::NoDate,
                text: "265,04".to_string(),
            },
            Diagnostic::BalanceMismatch {
                index: 8,
                expected: dec!(1234.86),
                declared: dec!(1200.00),
                difference: dec!(34.86),
            },
            Diagnostic::PossibleDuplicate { first: 6, second: 7 },
        ]
    );
    assert_eq!(parsed.skipped_blocks(), 1);
    assert_eq!(parsed.warnings(), 2);
}

#[test]
fn test_fixture_summary() {
    let summary = parse_fixture().summary();
    assert_eq!(summary.transaction_count, 9);
    assert_eq!(summary.installment_count, 1);
    assert_eq!(summary.total_debits, dec!(285.09));
    assert_eq!(summary.total_credits, dec!(1519.95));
    assert_eq!(summary.net, dec!(1234.86));
    assert_eq!(summary.by_category["shopping"], dec!(-30.05));
    assert_eq!(summary.installments_billed, dec!(50.00));
}

#[test]
fn test_installment_invariant_holds() {
    for t in parse_fixture().transactions {
        if t.is_installment {
            let index = t.installment_index.unwrap();
            let count = t.installment_count.unwrap();
            assert!(1 <= index && index <= count);
        } else {
            assert_eq!(t.installment_index, None);
            assert_eq!(t.installment_count, None);
        }
        assert!(!t.description.is_empty());
    }
}

#[test]
fn test_sign_follows_credit_keywords() {
    let config = ParserConfig::default();
    for t in parse_fixture().transactions {
        let lowered = t.description.to_lowercase();
        let credit = config.credit_keywords.iter().any(|k| lowered.contains(k.as_str()));
        assert_eq!(t.amount > dec!(0), credit, "{}", t.description);
    }
}

#[test]
fn test_balance_round_trip_within_tolerance() {
    let parsed = parse_fixture();
    let tolerance = ParserConfig::default().balance_tolerance;
    for (i, pair) in parsed.transactions.windows(2).enumerate() {
        let (Some(prev), Some(cur)) = (pair[0].balance_after, pair[1].balance_after) else {
            continue;
        };
        let off = (cur - (prev + pair[1].amount)).abs() > tolerance;
        let reported = parsed
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BalanceMismatch { index, .. } if *index == i + 1));
        assert_eq!(off, reported, "row {}", i + 1);
    }
}

#[test]
fn test_noise_between_blocks_changes_nothing() {
    let text = fixture_text();
    let mut noisy = String::new();
    for line in text.split_inclusive('\n') {
        noisy.push_str(line);
        noisy.push_str("\n   \nPágina 7 de 9\n");
    }

    let parser = StatementParser::new(&ParserConfig::default()).unwrap();
    let clean = parser.parse_text(&text).unwrap();
    let noisy = parser.parse_text(&noisy).unwrap();
    assert_eq!(clean.transactions, noisy.transactions);
    assert_eq!(clean.header, noisy.header);
}

#[test]
fn test_reparse_is_identical() {
    assert_eq!(parse_fixture(), parse_fixture());
}

#[test]
fn test_totals_heading_example() {
    let config = ParserConfig {
        noise_patterns: vec!["TOTAL".to_string()],
        section_break_patterns: vec![],
        ..ParserConfig::default()
    };
    let err = StatementParser::new(&config)
        .unwrap()
        .parse_lines(&RawLine::from_strs(&["TOTAL INTERESES", "1.200,00"]))
        .unwrap_err();

    let StatementError::NoTransactions { diagnostics } = err;
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        diagnostics[0],
        Diagnostic::SkippedBlock { reason: SkipReason::NoDate, .. }
    ));
}

#[test]
fn test_statement_without_balance_column() {
    let config = ParserConfig {
        reference_date: Some(ymd(2024, 4, 30)),
        ..ParserConfig::default()
    };
    let parsed = StatementParser::new(&config)
        .unwrap()
        .parse_text("02/04/2024 RENFE MADRID 14,50\n03/04/2024 BIZUM RECIBIDO ABONO 20,00\n")
        .unwrap();
    assert_eq!(parsed.transactions.len(), 2);
    assert!(parsed.transactions.iter().all(|t| t.balance_after.is_none()));
    assert!(parsed.diagnostics.is_empty());
    assert_eq!(parsed.transactions[0].category, "transport");
    assert_eq!(parsed.transactions[1].amount, dec!(20.00));
}

fn parse_march(lines: &[&str]) -> ParsedStatement {
    let config = ParserConfig {
        reference_date: Some(ymd(2024, 3, 31)),
        ..ParserConfig::default()
    };
    StatementParser::new(&config)
        .unwrap()
        .parse_lines(&RawLine::from_strs(lines))
        .unwrap()
}

#[test]
fn test_balances_printed_below_amounts() {
    let parsed = parse_march(&[
        "03/15/2024 COFFEE SHOP",
        "-4.50",
        "10.25",
        "03/16/2024 BOOKSTORE",
        "-5.00",
        "5.25",
    ]);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    assert_eq!(parsed.transactions.len(), 2);
    assert_eq!(parsed.transactions[0].date, ymd(2024, 3, 15));
    assert_eq!(parsed.transactions[0].amount, dec!(-4.50));
    assert_eq!(parsed.transactions[0].balance_after, Some(dec!(10.25)));
    assert_eq!(parsed.transactions[1].balance_after, Some(dec!(5.25)));
}

#[test]
fn test_value_date_column_is_skipped() {
    let parsed = parse_march(&["15.03 ZARA", "16.03", "45,00"]);
    assert_eq!(parsed.transactions.len(), 1);

    let t = &parsed.transactions[0];
    assert_eq!(t.date, ymd(2024, 3, 15));
    assert_eq!(t.description, "ZARA");
    assert_eq!(t.amount, dec!(-45.00));
    assert_eq!(t.balance_after, None);
}

#[test]
fn test_installment_row_bills_the_period_charge() {
    let parsed = parse_march(&[
        "OPERACIONES FRACCIONADAS",
        "07.03.2024 CAJ.LA CAIXA OF.7102   600,00   500,00   50,00   2,10   52,10",
        "Plazo 3 De 12",
    ]);
    assert_eq!(parsed.transactions.len(), 1);

    let t = &parsed.transactions[0];
    assert_eq!(t.description, "CAJ.LA CAIXA OF.7102");
    assert_eq!(t.amount, dec!(-52.10));
    assert_eq!(t.balance_after, None);
    assert!(t.is_installment);
    assert_eq!((t.installment_index, t.installment_count), (Some(3), Some(12)));
    assert_eq!(t.installment_total, Some(dec!(600.00)));
    assert_eq!(t.installment_remaining, Some(dec!(500.00)));
    assert_eq!(t.installment_principal, Some(dec!(50.00)));
    assert_eq!(t.installment_interest, Some(dec!(2.10)));
    assert_eq!(parsed.summary().installment_interest, dec!(2.10));
}

#[test]
fn test_service_fee_footnote_is_not_a_balance() {
    let parsed = parse_march(&[
        "14/03/2024 NOMINA ACME 1.500,00 CR 1.500,00",
        "15/03/2024 ZARA MADRID 45,00",
        "Importe servicios: 1,50",
        "16/03/2024 FARMACIA 12,00 1.443,00",
    ]);
    assert!(
        !parsed
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BalanceMismatch { .. })),
        "{:?}",
        parsed.diagnostics
    );

    let zara = &parsed.transactions[1];
    assert_eq!(zara.description, "ZARA MADRID");
    assert_eq!(zara.amount, dec!(-45.00));
    assert_eq!(zara.balance_after, None);
    assert_eq!(zara.service_fee, Some(dec!(1.50)));
    assert_eq!(parsed.summary().service_fees, dec!(1.50));
}
