//! Date parsing against an ordered list of chrono formats.

use chrono::{Datelike, Days, Months, NaiveDate};

/// Year-less dates landing further than this past the reference date belong
/// to the previous year (December rows on a January statement).
const YEAR_ROLLBACK_DAYS: u64 = 31;

const MIN_FOUR_DIGIT_YEAR: i32 = 1000;

fn has_year(fmt: &str) -> bool {
    ["%Y", "%y", "%F", "%D", "%G", "%g"]
        .iter()
        .any(|directive| fmt.contains(directive))
}

fn with_reference_year(text: &str, fmt: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let year = reference.year();
    let date =
        NaiveDate::parse_from_str(&format!("{text} {year}"), &format!("{fmt} %Y")).ok()?;
    let cutoff = reference.checked_add_days(Days::new(YEAR_ROLLBACK_DAYS))?;
    if date > cutoff {
        date.with_year(year - 1)
    } else {
        Some(date)
    }
}

fn within_window(date: NaiveDate, reference: NaiveDate, window_years: u32) -> bool {
    let span = Months::new(window_years.saturating_mul(12));
    let lower = reference.checked_sub_months(span).unwrap_or(NaiveDate::MIN);
    let upper = reference.checked_add_months(span).unwrap_or(NaiveDate::MAX);
    (lower..=upper).contains(&date)
}

/// First format producing a valid date (within `window_years` of
/// `reference`, when one is given) wins.
///
/// Year-less formats are only tried when a reference date is available.
pub fn parse_date(
    text: &str,
    formats: &[String],
    reference: Option<NaiveDate>,
    window_years: u32,
) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    formats.iter().find_map(|fmt| {
        let date = if has_year(fmt) {
            let date = NaiveDate::parse_from_str(text, fmt).ok()?;
            // `%Y` happily reads "24" as the year 24.
            if fmt.contains("%Y") && date.year() < MIN_FOUR_DIGIT_YEAR {
                return None;
            }
            date
        } else {
            with_reference_year(text, fmt, reference?)?
        };
        match reference {
            Some(r) if !within_window(date, r, window_years) => None,
            _ => Some(date),
        }
    })
}

/// Whether `text` reads as a date under any of `formats`, ignoring the
/// plausibility window. Year-less formats are checked against a leap year.
pub fn matches_date_format(text: &str, formats: &[String]) -> bool {
    let text = text.trim();
    !text.is_empty()
        && formats.iter().any(|fmt| {
            if has_year(fmt) {
                NaiveDate::parse_from_str(text, fmt)
                    .is_ok_and(|d| !fmt.contains("%Y") || d.year() >= MIN_FOUR_DIGIT_YEAR)
            } else {
                NaiveDate::parse_from_str(&format!("{text} 2000"), &format!("{fmt} %Y")).is_ok()
            }
        })
}
