//! XLSX statements with one worksheet per report section.
//!
//! Operations are named by English labels rather than codes, and dates are
//! usually Excel serial numbers.

use std::path::Path;

use crate::cash_flow::CashFlowType;
use crate::error::Result;
use crate::headers::{
    CashFlowHeader, PortfolioPropertyHeader, SecurityEventHeader, SecurityTradeHeader,
    SecurityTransferHeader,
};
use crate::raw::RawReport;
use crate::report::TableParser;
use crate::table::Table;

use super::section::{format_date, Section, SectionRow};
use super::ParserVisitor;

pub const KEY: &str = "workbook";

const MARKER_SHEETS: &[&str] = &["Trades", "Money", "Income"];

pub fn detect(file_path: &Path) -> bool {
    use calamine::Reader;
    if !file_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"))
    {
        return false;
    }
    let Ok(workbook) = calamine::open_workbook_auto(file_path) else {
        return false;
    };
    workbook
        .sheet_names()
        .iter()
        .any(|name| MARKER_SHEETS.iter().any(|m| name.eq_ignore_ascii_case(m)))
}

pub fn visit_parsers(visitor: &mut impl ParserVisitor) {
    visitor.visit(&TradesParser);
    visitor.visit(&MoneyParser);
    visitor.visit(&TransfersParser);
    visitor.visit(&IncomeParser);
    visitor.visit(&SummaryParser);
}

/// Money sheet operations. `true` marks outflows the broker prints unsigned.
const MONEY_OPERATIONS: &[(&str, CashFlowType, bool)] = &[
    ("deposit", CashFlowType::Cash, false),
    ("withdrawal", CashFlowType::Cash, true),
    ("broker fee", CashFlowType::Commission, true),
    ("exchange fee", CashFlowType::Commission, true),
    ("tax", CashFlowType::Tax, true),
    ("forecast tax", CashFlowType::ForecastTax, true),
    ("margin", CashFlowType::Margin, false),
    ("variation margin", CashFlowType::DerivativeProfit, false),
];

const INCOME_TYPES: &[(&str, CashFlowType)] = &[
    ("coupon", CashFlowType::Coupon),
    ("dividend", CashFlowType::Dividend),
    ("amortization", CashFlowType::Amortization),
    ("redemption", CashFlowType::Redemption),
];

fn money_operation(row: &SectionRow<'_>, column: usize) -> Result<(CashFlowType, bool)> {
    let label = row.required_text(column, "operation")?;
    MONEY_OPERATIONS
        .iter()
        .find(|(l, _, _)| label.eq_ignore_ascii_case(l))
        .map(|(_, flow, outflow)| (*flow, *outflow))
        .ok_or_else(|| row.error(format!("unknown operation '{label}'")))
}

fn income_type(row: &SectionRow<'_>, column: usize) -> Result<CashFlowType> {
    let label = row.required_text(column, "income type")?;
    INCOME_TYPES
        .iter()
        .find(|(l, _)| label.eq_ignore_ascii_case(l))
        .map(|(_, flow)| *flow)
        .ok_or_else(|| row.error(format!("unknown income type '{label}'")))
}

pub struct TradesParser;

impl TableParser for TradesParser {
    type Header = SecurityTradeHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<SecurityTradeHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Trades") else {
            return Ok(table);
        };
        let date = section.column("Trade date")?;
        let deal = section.column("Deal")?;
        let instrument = section.column("Instrument")?;
        let side = section.column("Side")?;
        let quantity = section.column("Quantity")?;
        let price = section.column("Price")?;
        let aci = section.optional_column("ACI");
        let fee = section.optional_column("Fee");
        let currency = section.column("Currency")?;

        for row in section.rows() {
            let count = row.required_int(quantity, "quantity")?;
            let count = match row.required_text(side, "side")?.to_uppercase().as_str() {
                "B" | "BUY" => row.signed_count(count, false)?,
                "S" | "SELL" => row.signed_count(count, true)?,
                other => return Err(row.error(format!("unknown side '{other}'"))),
            };
            let mut record = Table::new_record()
                .with(SecurityTradeHeader::Date, format_date(row.date(date)?))
                .with(SecurityTradeHeader::TradeId, row.required_text(deal, "deal")?)
                .with(SecurityTradeHeader::Security, row.required_text(instrument, "instrument")?)
                .with(SecurityTradeHeader::Count, count)
                .with(SecurityTradeHeader::Price, row.required_decimal(price, "price")?)
                .with(SecurityTradeHeader::Currency, row.required_text(currency, "currency")?);
            if let Some(value) = aci.map(|c| row.decimal(c)).transpose()?.flatten() {
                record.put(SecurityTradeHeader::AccruedInterest, value);
            }
            if let Some(value) = fee.map(|c| row.decimal(c)).transpose()?.flatten() {
                record.put(SecurityTradeHeader::Commission, value.abs());
            }
            table.push(record);
        }
        Ok(table)
    }
}

pub struct MoneyParser;

impl TableParser for MoneyParser {
    type Header = CashFlowHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<CashFlowHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Money") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let operation = section.column("Operation")?;
        let amount = section.column("Amount")?;
        let currency = section.column("Currency")?;
        let comment = section.optional_column("Comment");

        for row in section.rows() {
            let (flow, outflow) = money_operation(&row, operation)?;
            let value = row.required_decimal(amount, "amount")?;
            let value = if outflow { -value.abs() } else { value };
            let mut record = Table::new_record()
                .with(CashFlowHeader::Date, format_date(row.date(date)?))
                .with(CashFlowHeader::Type, flow)
                .with(CashFlowHeader::Value, value)
                .with(CashFlowHeader::Currency, row.required_text(currency, "currency")?);
            if let Some(text) = comment.and_then(|c| row.text(c)) {
                record.put(CashFlowHeader::Description, text);
            }
            table.push(record);
        }
        Ok(table)
    }
}

pub struct TransfersParser;

impl TableParser for TransfersParser {
    type Header = SecurityTransferHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<SecurityTransferHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Transfers") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let order = section.optional_column("Order");
        let account = section.optional_column("Account");
        let instrument = section.column("Instrument")?;
        let quantity = section.column("Quantity")?;
        let direction = section.column("Direction")?;

        for row in section.rows() {
            let count = row.required_int(quantity, "quantity")?;
            let count = match row.required_text(direction, "direction")?.to_lowercase().as_str() {
                "in" => row.signed_count(count, false)?,
                "out" => row.signed_count(count, true)?,
                other => return Err(row.error(format!("unknown direction '{other}'"))),
            };
            let mut record = Table::new_record()
                .with(SecurityTransferHeader::Date, format_date(row.date(date)?))
                .with(SecurityTransferHeader::Security, row.required_text(instrument, "instrument")?)
                .with(SecurityTransferHeader::Count, count);
            if let Some(id) = order.and_then(|c| row.text(c)) {
                record.put(SecurityTransferHeader::TradeId, id);
            }
            if let Some(name) = account.and_then(|c| row.text(c)) {
                record.put(SecurityTransferHeader::Portfolio, name);
            }
            table.push(record);
        }
        Ok(table)
    }
}

pub struct IncomeParser;

impl TableParser for IncomeParser {
    type Header = SecurityEventHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<SecurityEventHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Income") else {
            return Ok(table);
        };
        let date = section.column("Payment date")?;
        let instrument = section.column("Instrument")?;
        let quantity = section.column("Quantity")?;
        let kind = section.column("Income type")?;
        let gross = section.column("Gross")?;
        let tax = section.optional_column("Withheld tax");
        let currency = section.column("Currency")?;

        for row in section.rows() {
            let mut record = Table::new_record()
                .with(SecurityEventHeader::Date, format_date(row.date(date)?))
                .with(SecurityEventHeader::Security, row.required_text(instrument, "instrument")?)
                .with(SecurityEventHeader::Count, row.required_int(quantity, "quantity")?)
                .with(SecurityEventHeader::EventType, income_type(&row, kind)?)
                .with(SecurityEventHeader::Value, row.required_decimal(gross, "gross")?)
                .with(SecurityEventHeader::Currency, row.required_text(currency, "currency")?);
            if let Some(value) = tax.map(|c| row.decimal(c)).transpose()?.flatten() {
                record.put(SecurityEventHeader::Tax, value.abs());
            }
            table.push(record);
        }
        Ok(table)
    }
}

pub struct SummaryParser;

impl TableParser for SummaryParser {
    type Header = PortfolioPropertyHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<PortfolioPropertyHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Summary") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let metric = section.column("Metric")?;
        let value = section.column("Value")?;

        for row in section.rows() {
            table.push(
                Table::new_record()
                    .with(PortfolioPropertyHeader::Date, format_date(row.date(date)?))
                    .with(PortfolioPropertyHeader::Property, row.required_text(metric, "metric")?)
                    .with(PortfolioPropertyHeader::Value, row.required_decimal(value, "value")?),
            );
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::raw::{MemoryReport, RawCell};
    use rust_decimal_macros::dec;

    fn t(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn header(titles: &[&str]) -> Vec<RawCell> {
        titles.iter().map(|s| t(s)).collect()
    }

    fn statement() -> MemoryReport {
        MemoryReport::new(KEY, "statement.xlsx")
            .with_section(
                "Trades",
                vec![
                    header(&["Trade date", "Deal", "Instrument", "Side", "Quantity", "Price", "ACI", "Fee", "Currency"]),
                    vec![t("D1"), t("77"), t("AAPL"), t("B"), RawCell::Int(3), RawCell::Float(181.5), RawCell::Empty, RawCell::Float(-1.0), t("USD")],
                    vec![RawCell::Float(45323.0), t("78"), t("AAPL"), t("S"), RawCell::Int(1), RawCell::Float(185.0), RawCell::Empty, RawCell::Float(1.0), t("USD")],
                ],
            )
            .with_section(
                "Money",
                vec![
                    header(&["Date", "Operation", "Amount", "Currency", "Comment"]),
                    vec![RawCell::Float(45292.0), t("Deposit"), RawCell::Int(1000), t("USD"), t("wire")],
                    vec![RawCell::Float(45293.0), t("Withdrawal"), RawCell::Int(200), t("USD"), RawCell::Empty],
                    vec![RawCell::Float(45294.0), t("Broker fee"), RawCell::Float(2.5), t("USD"), RawCell::Empty],
                ],
            )
            .with_section(
                "Income",
                vec![
                    header(&["Payment date", "Instrument", "Quantity", "Income type", "Gross", "Withheld tax", "Currency"]),
                    vec![RawCell::Float(45300.0), t("AAPL"), RawCell::Int(2), t("Dividend"), RawCell::Float(0.48), RawCell::Float(-0.05), t("USD")],
                ],
            )
            .with_section(
                "Transfers",
                vec![
                    header(&["Date", "Order", "Account", "Instrument", "Quantity", "Direction"]),
                    vec![RawCell::Float(45301.0), t("X-1"), t("Main"), t("AAPL"), RawCell::Int(4), t("Out")],
                ],
            )
    }

    #[test]
    fn test_trades_reject_bad_date_with_position() {
        match TradesParser.parse(&statement()) {
            Err(Error::ReportFormat { position, message, .. }) => {
                assert_eq!(position, 2);
                assert!(message.contains("D1"), "{message}");
            }
            other => panic!("expected ReportFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_trades_sides_and_fees() {
        let report = MemoryReport::new(KEY, "trades.xlsx").with_section(
            "Trades",
            vec![
                header(&["Trade date", "Deal", "Instrument", "Side", "Quantity", "Price", "Fee", "Currency"]),
                vec![RawCell::Float(45323.0), t("78"), t("AAPL"), t("S"), RawCell::Int(1), RawCell::Float(185.0), RawCell::Float(-1.0), t("USD")],
            ],
        );
        let table = TradesParser.parse(&report).unwrap();
        let trade = &table.records()[0];
        assert_eq!(trade.text(SecurityTradeHeader::Date), Some("2024-02-01"));
        assert_eq!(trade.int(SecurityTradeHeader::Count), Some(-1));
        assert_eq!(trade.decimal(SecurityTradeHeader::Commission), Some(dec!(1)));
        assert!(trade.get(SecurityTradeHeader::AccruedInterest).is_none());
    }

    #[test]
    fn test_money_labels_map_to_cash_flow_types() {
        let table = MoneyParser.parse(&statement()).unwrap();
        let rows: Vec<_> = table
            .iter()
            .map(|r| {
                (
                    r.cash_flow_type(CashFlowHeader::Type).unwrap().unwrap(),
                    r.decimal(CashFlowHeader::Value).unwrap(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                (CashFlowType::Cash, dec!(1000)),
                (CashFlowType::Cash, dec!(-200)),
                (CashFlowType::Commission, dec!(-2.5)),
            ]
        );
        assert_eq!(table.records()[0].text(CashFlowHeader::Date), Some("2024-01-01"));
        assert_eq!(table.records()[0].text(CashFlowHeader::Description), Some("wire"));
    }

    #[test]
    fn test_unknown_money_label_fails() {
        let report = MemoryReport::new(KEY, "m.xlsx").with_section(
            "Money",
            vec![
                header(&["Date", "Operation", "Amount", "Currency"]),
                vec![RawCell::Float(45292.0), t("Deposit"), RawCell::Int(1), t("USD")],
                vec![RawCell::Float(45292.0), t("Cashback"), RawCell::Int(1), t("USD")],
            ],
        );
        match MoneyParser.parse(&report) {
            Err(Error::ReportFormat { position, message, .. }) => {
                assert_eq!(position, 3);
                assert!(message.contains("Cashback"));
            }
            other => panic!("expected ReportFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_income_and_transfers() {
        let report = statement();
        let income = IncomeParser.parse(&report).unwrap();
        let event = &income.records()[0];
        assert_eq!(
            event.cash_flow_type(SecurityEventHeader::EventType).unwrap(),
            Some(CashFlowType::Dividend)
        );
        assert_eq!(event.decimal(SecurityEventHeader::Tax), Some(dec!(0.05)));

        let transfers = TransfersParser.parse(&report).unwrap();
        let transfer = &transfers.records()[0];
        assert_eq!(transfer.int(SecurityTransferHeader::Count), Some(-4));
        assert_eq!(transfer.text(SecurityTransferHeader::Portfolio), Some("Main"));
    }

    #[test]
    fn test_extreme_quantities_fail_at_row() {
        let trades = MemoryReport::new(KEY, "trades.xlsx").with_section(
            "Trades",
            vec![
                header(&["Trade date", "Deal", "Instrument", "Side", "Quantity", "Price", "Currency"]),
                vec![RawCell::Float(45323.0), t("78"), t("AAPL"), t("B"), RawCell::Int(i64::MIN), RawCell::Float(1.0), t("USD")],
            ],
        );
        assert!(matches!(
            TradesParser.parse(&trades),
            Err(Error::ReportFormat { position: 2, ref message, .. }) if message == "count out of range"
        ));

        let transfers = MemoryReport::new(KEY, "transfers.xlsx").with_section(
            "Transfers",
            vec![
                header(&["Date", "Instrument", "Quantity", "Direction"]),
                vec![RawCell::Float(45301.0), t("AAPL"), RawCell::Int(4), t("In")],
                vec![RawCell::Float(45301.0), t("AAPL"), RawCell::Int(i64::MIN), t("Out")],
            ],
        );
        assert!(matches!(
            TransfersParser.parse(&transfers),
            Err(Error::ReportFormat { position: 3, ref message, .. }) if message == "count out of range"
        ));
    }

    #[test]
    fn test_huge_serial_date_fails_at_row() {
        let report = MemoryReport::new(KEY, "m.xlsx").with_section(
            "Money",
            vec![
                header(&["Date", "Operation", "Amount", "Currency"]),
                vec![RawCell::Float(1e300), t("Deposit"), RawCell::Int(1), t("USD")],
            ],
        );
        match MoneyParser.parse(&report) {
            Err(Error::ReportFormat { position, message, .. }) => {
                assert_eq!(position, 2);
                assert!(message.starts_with("invalid date"), "{message}");
            }
            other => panic!("expected ReportFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_summary_sheet() {
        assert!(SummaryParser.parse(&statement()).unwrap().is_empty());
    }
}
