use chrono::{Datelike, Duration, NaiveDate};

use super::parser::CellValue;

/// Candidate textual date patterns, tried strictly in this order. Two-digit
/// years must come before their four-digit siblings: `%Y` happily accepts a
/// two-digit value.
pub const DEFAULT_DATE_PATTERNS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Spreadsheet serial-date epoch. Nominally 1899-12-31, shifted back one
/// more day to absorb the 1900 leap-year bug the xls format inherited from
/// Lotus 1-2-3, so `epoch + serial` lands on the calendar date the sheet
/// displays.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("static date")
}

/// Normalize one cell into a calendar date. Returns `None` for anything
/// unparseable; the caller decides whether that is fatal.
pub fn normalize_date(cell: &CellValue, patterns: &[&str]) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => parse_date_text(s, patterns),
        CellValue::Empty => None,
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Reject values outside any plausible business-date window instead
    // of wrapping around.
    if !(1.0..=200_000.0).contains(&serial) {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Strict textual parse against the candidate patterns, first match wins.
/// Two-digit years below 50 are read as 20xx, the rest as 19xx.
pub fn parse_date_text(s: &str, patterns: &[&str]) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // A date-time cell rendered as text: take the date part. ISO datetimes
    // separate it with 'T', the rest with whitespace.
    let s = s
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(s);

    for pattern in patterns {
        if let Ok(date) = NaiveDate::parse_from_str(s, pattern) {
            if pattern.contains("%y") && date.year() >= 2050 {
                // chrono pivots two-digit years at 69; the business rule
                // pivots at 50, so 50..=68 comes back a century high.
                return date.with_year(date.year() - 100);
            }
            return Some(date);
        }
    }
    None
}

/// Parse a monetary value. Thousands separators are stripped; anything that
/// still fails to parse degrades to zero rather than an error.
pub fn normalize_amount(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => parse_amount_text(s),
        CellValue::Empty | CellValue::Date(_) => 0.0,
    }
}

pub fn parse_amount_text(s: &str) -> f64 {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    let normalized = if dots > 0 && commas > 0 {
        // Whichever separator comes last is the decimal point.
        if cleaned.rfind('.') > cleaned.rfind(',') {
            cleaned.replace(',', "")
        } else {
            cleaned.replace('.', "").replace(',', ".")
        }
    } else if commas > 0 {
        // Lone comma with two or fewer trailing digits is a decimal comma;
        // everything else is a thousands separator.
        let decimal_comma =
            commas == 1 && cleaned.rsplit(',').next().map_or(false, |t| t.len() <= 2);
        if decimal_comma {
            cleaned.replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else if dots > 1 {
        // Dotted thousands groups ("1.234.567").
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    normalized.parse::<f64>().unwrap_or(0.0)
}

/// Parse a count/quantity value. Blank or unparseable degrades to zero.
pub fn normalize_integer(cell: &CellValue) -> i64 {
    match cell {
        CellValue::Number(n) => n.trunc() as i64,
        CellValue::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '-')
                .collect();
            cleaned.parse::<i64>().unwrap_or(0)
        }
        CellValue::Empty | CellValue::Date(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn native_date_passes_through() {
        let cell = CellValue::Date(d(2023, 7, 14));
        assert_eq!(normalize_date(&cell, DEFAULT_DATE_PATTERNS), Some(d(2023, 7, 14)));
    }

    #[test]
    fn serial_dates_use_shifted_epoch() {
        // 2021-03-05 is serial 44260 in the 1900 date system.
        assert_eq!(
            normalize_date(&CellValue::Number(44260.0), DEFAULT_DATE_PATTERNS),
            Some(d(2021, 3, 5))
        );
        // 2024-12-31 is serial 45657.
        assert_eq!(
            normalize_date(&CellValue::Number(45657.0), DEFAULT_DATE_PATTERNS),
            Some(d(2024, 12, 31))
        );
    }

    #[test]
    fn out_of_range_serials_are_rejected() {
        assert_eq!(serial_to_date(0.0), None);
        assert_eq!(serial_to_date(-5.0), None);
        assert_eq!(serial_to_date(5_000_000.0), None);
    }

    #[test]
    fn supported_text_formats_round_trip() {
        for (text, expected) in [
            ("05/03/21", d(2021, 3, 5)),
            ("05/03/2021", d(2021, 3, 5)),
            ("2021-03-05", d(2021, 3, 5)),
            ("05-03-2021", d(2021, 3, 5)),
            ("05.03.2021", d(2021, 3, 5)),
        ] {
            let got = parse_date_text(text, DEFAULT_DATE_PATTERNS).unwrap();
            assert_eq!(got, expected, "pattern mismatch for {}", text);
            assert_eq!(got.format("%Y-%m-%d").to_string(), "2021-03-05");
        }
    }

    #[test]
    fn mdy_is_reached_when_dmy_is_impossible() {
        // Day 25 cannot be a month, so only %m/%d/%Y matches.
        assert_eq!(
            parse_date_text("12/25/2021", DEFAULT_DATE_PATTERNS),
            Some(d(2021, 12, 25))
        );
    }

    #[test]
    fn two_digit_years_pivot_at_fifty() {
        assert_eq!(
            parse_date_text("01/06/21", DEFAULT_DATE_PATTERNS),
            Some(d(2021, 6, 1))
        );
        assert_eq!(
            parse_date_text("01/06/49", DEFAULT_DATE_PATTERNS),
            Some(d(2049, 6, 1))
        );
        assert_eq!(
            parse_date_text("01/06/50", DEFAULT_DATE_PATTERNS),
            Some(d(1950, 6, 1))
        );
        assert_eq!(
            parse_date_text("01/06/68", DEFAULT_DATE_PATTERNS),
            Some(d(1968, 6, 1))
        );
        assert_eq!(
            parse_date_text("01/06/99", DEFAULT_DATE_PATTERNS),
            Some(d(1999, 6, 1))
        );
    }

    #[test]
    fn garbage_dates_are_none_not_zero() {
        assert_eq!(parse_date_text("not a date", DEFAULT_DATE_PATTERNS), None);
        assert_eq!(parse_date_text("", DEFAULT_DATE_PATTERNS), None);
        assert_eq!(parse_date_text("32/13/2021", DEFAULT_DATE_PATTERNS), None);
    }

    #[test]
    fn datetime_text_keeps_date_part() {
        assert_eq!(
            parse_date_text("05/03/2021 14:30", DEFAULT_DATE_PATTERNS),
            Some(d(2021, 3, 5))
        );
        assert_eq!(
            parse_date_text("2021-03-05T14:30:00", DEFAULT_DATE_PATTERNS),
            Some(d(2021, 3, 5))
        );
    }

    #[test]
    fn amounts_strip_thousands_separators() {
        assert_eq!(parse_amount_text("1,234,567"), 1_234_567.0);
        assert_eq!(parse_amount_text("1.234.567"), 1_234_567.0);
        assert_eq!(parse_amount_text("1,234.56"), 1234.56);
        assert_eq!(parse_amount_text("1.234,56"), 1234.56);
        assert_eq!(parse_amount_text("150000"), 150_000.0);
        assert_eq!(parse_amount_text("Rp 2.500.000"), 2_500_000.0);
        assert_eq!(parse_amount_text("99,5"), 99.5);
        assert_eq!(parse_amount_text("-120.50"), -120.5);
    }

    #[test]
    fn non_numeric_amounts_degrade_to_zero() {
        assert_eq!(parse_amount_text(""), 0.0);
        assert_eq!(parse_amount_text("-"), 0.0);
        assert_eq!(parse_amount_text("n/a"), 0.0);
        assert_eq!(normalize_amount(&CellValue::Empty), 0.0);
    }

    #[test]
    fn integers_truncate_and_degrade() {
        assert_eq!(normalize_integer(&CellValue::Number(3.0)), 3);
        assert_eq!(normalize_integer(&CellValue::Text("12".into())), 12);
        assert_eq!(normalize_integer(&CellValue::Text("abc".into())), 0);
        assert_eq!(normalize_integer(&CellValue::Empty), 0);
    }
}
