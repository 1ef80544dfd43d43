//! Typed access to the rows of a raw report section.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;

use crate::cash_flow::CashFlowType;
use crate::error::{Error, Result};
use crate::raw::{RawCell, RawReport, RawRow, ReportId};

/// A section whose first row names its columns.
pub struct Section<'a> {
    report: &'a ReportId,
    header_position: usize,
    columns: HashMap<String, usize>,
    rows: &'a [RawRow],
}

impl<'a> Section<'a> {
    /// The named section of `report`, or `None` when the report lacks it.
    pub fn find(report: &'a dyn RawReport, name: &str) -> Option<Self> {
        let Some(rows) = report.section(name) else {
            tracing::debug!(report = %report.id(), section = name, "section not present");
            return None;
        };
        let (header, rows) = match rows.split_first() {
            Some((header, rest)) => (Some(header), rest),
            None => (None, rows),
        };
        let columns = header
            .map(|h| {
                h.cells
                    .iter()
                    .enumerate()
                    .filter_map(|(i, cell)| cell.as_text().map(|t| (t.to_lowercase(), i)))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            report: report.id(),
            header_position: header.map_or(0, |h| h.position),
            columns,
            rows,
        })
    }

    /// Index of a column by its title, matched case-insensitively.
    pub fn column(&self, title: &str) -> Result<usize> {
        self.columns.get(&title.to_lowercase()).copied().ok_or_else(|| {
            Error::report_format(self.report, self.header_position, format!("missing column '{title}'"))
        })
    }

    /// Like [`Section::column`] but for columns a broker may leave out.
    pub fn optional_column(&self, title: &str) -> Option<usize> {
        self.columns.get(&title.to_lowercase()).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = SectionRow<'a>> + '_ {
        let report = self.report;
        let rows = self.rows;
        rows.iter().map(move |row| SectionRow { report, row })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One data row of a [`Section`]. Getters fail with a `ReportFormat` error
/// carrying the row's position.
pub struct SectionRow<'a> {
    report: &'a ReportId,
    row: &'a RawRow,
}

impl SectionRow<'_> {
    pub fn position(&self) -> usize {
        self.row.position
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::report_format(self.report, self.row.position, message)
    }

    pub fn cell(&self, column: usize) -> &RawCell {
        self.row.get(column)
    }

    pub fn text(&self, column: usize) -> Option<String> {
        self.cell(column).as_text()
    }

    pub fn required_text(&self, column: usize, what: &str) -> Result<String> {
        self.text(column).ok_or_else(|| self.error(format!("{what} is empty")))
    }

    pub fn date(&self, column: usize) -> Result<NaiveDate> {
        let cell = self.cell(column);
        parse_date(cell).ok_or_else(|| match cell.as_text() {
            Some(raw) => self.error(format!("invalid date '{raw}'")),
            None => self.error("date is empty"),
        })
    }

    pub fn decimal(&self, column: usize) -> Result<Option<Decimal>> {
        let cell = self.cell(column);
        if cell.is_empty() {
            return Ok(None);
        }
        cell_decimal(cell)
            .map(Some)
            .ok_or_else(|| self.error(format!("invalid number '{}'", cell.as_text().unwrap_or_default())))
    }

    pub fn required_decimal(&self, column: usize, what: &str) -> Result<Decimal> {
        self.decimal(column)?
            .ok_or_else(|| self.error(format!("{what} is empty")))
    }

    pub fn int(&self, column: usize) -> Result<Option<i64>> {
        let Some(value) = self.decimal(column)? else {
            return Ok(None);
        };
        if !value.fract().is_zero() {
            return Err(self.error(format!("expected a whole number, got '{value}'")));
        }
        i64::try_from(value)
            .map(Some)
            .map_err(|_| self.error(format!("number out of range '{value}'")))
    }

    pub fn required_int(&self, column: usize, what: &str) -> Result<i64> {
        self.int(column)?
            .ok_or_else(|| self.error(format!("{what} is empty")))
    }

    /// Magnitude of `count` with the sign set by the row's direction.
    pub fn signed_count(&self, count: i64, negative: bool) -> Result<i64> {
        let magnitude = count
            .checked_abs()
            .ok_or_else(|| self.error("count out of range"))?;
        Ok(if negative { -magnitude } else { magnitude })
    }

    /// Cash flow type stored as a numeric code in `column`.
    pub fn cash_flow_type(&self, column: usize) -> Result<CashFlowType> {
        let code = self.required_int(column, "type")?;
        CashFlowType::classify(code).map_err(|e| match e {
            Error::UnknownCashFlowCode { code, .. } => Error::UnknownCashFlowCode {
                code,
                report: Some(self.report.clone()),
                position: Some(self.row.position),
            },
            other => other,
        })
    }
}

/// Canonical text form of report dates.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Date in `dd.mm.yyyy`, `yyyy-mm-dd` or `mm/dd/yyyy` form, optionally followed
/// by a time, or an Excel serial day number.
pub fn parse_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Int(serial) => excel_serial_to_date(*serial as f64),
        RawCell::Float(serial) => excel_serial_to_date(*serial),
        RawCell::Text(raw) => {
            let raw = raw.trim();
            let day = raw.split_whitespace().next()?;
            let day = day.split('T').next()?;
            ["%d.%m.%Y", "%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
        }
        RawCell::Empty => None,
    }
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(TimeDelta::try_days(serial.trunc() as i64)?)
}

/// Decimal amount as brokers print it: grouping spaces, comma or dot decimal
/// separator, parenthesized negatives.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"' && *c != '$')
        .collect();
    let (negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.to_string()),
        None => (false, s),
    };
    let s = if s.contains('.') {
        s.replace(',', "")
    } else {
        s.replace(',', ".")
    };
    if s.is_empty() {
        return None;
    }
    let value = Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()?;
    Some(if negative { -value } else { value })
}

fn cell_decimal(cell: &RawCell) -> Option<Decimal> {
    match cell {
        RawCell::Empty => None,
        RawCell::Int(i) => Some(Decimal::from(*i)),
        RawCell::Float(f) => Decimal::try_from(*f).ok().map(|d| d.round_dp(10).normalize()),
        RawCell::Text(s) => parse_decimal(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{CsvReport, MemoryReport};
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_formats() {
        assert_eq!(parse_decimal("1 234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_decimal("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_decimal("(12.50)"), Some(dec!(-12.50)));
        assert_eq!(parse_decimal("-3"), Some(dec!(-3)));
        assert_eq!(parse_decimal("\"$7.25\""), Some(dec!(7.25)));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert_eq!(parse_date(&RawCell::Text("01.02.2024".into())), expected);
        assert_eq!(parse_date(&RawCell::Text("2024-02-01".into())), expected);
        assert_eq!(parse_date(&RawCell::Text("02/01/2024".into())), expected);
        assert_eq!(parse_date(&RawCell::Text("01.02.2024 10:15:00".into())), expected);
        assert_eq!(parse_date(&RawCell::Float(45323.0)), expected);
        assert_eq!(parse_date(&RawCell::Text("31.02.2024".into())), None);
        assert_eq!(parse_date(&RawCell::Empty), None);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45292.0), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(excel_serial_to_date(45292.75), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(excel_serial_to_date(-1.0), None);
        assert_eq!(excel_serial_to_date(1e300), None);
        assert_eq!(excel_serial_to_date(f64::MAX), None);
        assert_eq!(excel_serial_to_date(1e12), None);
        assert_eq!(parse_date(&RawCell::Float(1e300)), None);
        assert_eq!(parse_date(&RawCell::Int(i64::MAX)), None);
    }

    const REPORT: &str = "\
[Trades]
Date,Security,Count,Price
01.02.2024,SBER,10,250.5
bad,GAZP,1.5,
";

    #[test]
    fn test_section_columns_and_rows() {
        let report = CsvReport::from_bytes("test", "r.csv", REPORT.as_bytes()).unwrap();
        let section = Section::find(&report, "trades").unwrap();
        assert_eq!(section.len(), 2);
        assert_eq!(section.column("PRICE").unwrap(), 3);
        assert!(section.optional_column("Tax").is_none());
        match section.column("Tax") {
            Err(Error::ReportFormat { position, .. }) => assert_eq!(position, 2),
            other => panic!("expected ReportFormat, got {other:?}"),
        }

        let rows: Vec<_> = section.rows().collect();
        assert_eq!(rows[0].date(0).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(rows[0].required_int(2, "count").unwrap(), 10);
        assert_eq!(rows[0].decimal(3).unwrap(), Some(dec!(250.5)));
        assert_eq!(rows[1].decimal(3).unwrap(), None);
    }

    #[test]
    fn test_section_row_errors_carry_position() {
        let report = CsvReport::from_bytes("test", "r.csv", REPORT.as_bytes()).unwrap();
        let section = Section::find(&report, "trades").unwrap();
        let row = section.rows().nth(1).unwrap();
        for err in [row.date(0).unwrap_err(), row.int(2).unwrap_err()] {
            match err {
                Error::ReportFormat { position, .. } => assert_eq!(position, 4),
                other => panic!("expected ReportFormat, got {other:?}"),
            }
        }
        assert!(row.required_decimal(3, "price").is_err());
    }

    #[test]
    fn test_huge_serial_date_is_a_format_error() {
        let report = MemoryReport::new("test", "r.xlsx")
            .with_section("Money", vec![vec![RawCell::Text("Date".into())], vec![RawCell::Float(1e300)]]);
        let section = Section::find(&report, "Money").unwrap();
        let row = section.rows().next().unwrap();
        match row.date(0) {
            Err(Error::ReportFormat { position, message, .. }) => {
                assert_eq!(position, 2);
                assert!(message.contains("invalid date"), "{message}");
            }
            other => panic!("expected ReportFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_signed_count() {
        let report = CsvReport::from_bytes("test", "r.csv", REPORT.as_bytes()).unwrap();
        let section = Section::find(&report, "trades").unwrap();
        let row = section.rows().next().unwrap();
        assert_eq!(row.signed_count(-7, false).unwrap(), 7);
        assert_eq!(row.signed_count(7, true).unwrap(), -7);
        assert_eq!(row.signed_count(i64::MAX, true).unwrap(), -i64::MAX);
        match row.signed_count(i64::MIN, false) {
            Err(Error::ReportFormat { position, message, .. }) => {
                assert_eq!(position, 3);
                assert_eq!(message, "count out of range");
            }
            other => panic!("expected ReportFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_section() {
        let report = CsvReport::from_bytes("test", "r.csv", REPORT.as_bytes()).unwrap();
        assert!(Section::find(&report, "cash").is_none());
    }
}
