//! Single-file CSV statements split into `[Section]` blocks.
//!
//! Event kinds are given as numeric cash flow type codes and dates as
//! `dd.mm.yyyy`.

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

use super::section::{format_date, Section};
use super::ParserVisitor;

pub const KEY: &str = "sectioned_csv";

pub const SECTIONS: &[&str] = &["Trades", "Cash", "Transfers", "Events", "Portfolio"];

pub fn detect(file_path: &Path) -> bool {
    if !file_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    {
        return false;
    }
    let Ok(content) = std::fs::read_to_string(file_path) else {
        return false;
    };
    content.lines().any(|line| {
        let first = line.split(',').next().unwrap_or("").trim();
        SECTIONS
            .iter()
            .any(|s| first.eq_ignore_ascii_case(&format!("[{s}]")))
    })
}

pub fn visit_parsers(visitor: &mut impl ParserVisitor) {
    visitor.visit(&TradesParser);
    visitor.visit(&CashParser);
    visitor.visit(&TransfersParser);
    visitor.visit(&EventsParser);
    visitor.visit(&PortfolioParser);
}

pub struct TradesParser;

impl TableParser for TradesParser {
    type Header = SecurityTradeHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<SecurityTradeHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Trades") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let trade_id = section.column("Trade ID")?;
        let security = section.column("Security")?;
        let operation = section.column("Operation")?;
        let count = section.column("Count")?;
        let price = section.column("Price")?;
        let accrued = section.optional_column("Accrued interest");
        let commission = section.column("Commission")?;
        let currency = section.column("Currency")?;

        for row in section.rows() {
            let quantity = row.required_int(count, "count")?;
            let quantity = match row.required_text(operation, "operation")?.to_lowercase().as_str() {
                "buy" => row.signed_count(quantity, false)?,
                "sell" => row.signed_count(quantity, true)?,
                other => return Err(row.error(format!("unknown operation '{other}'"))),
            };
            let mut record = Table::new_record()
                .with(SecurityTradeHeader::Date, format_date(row.date(date)?))
                .with(SecurityTradeHeader::TradeId, row.required_text(trade_id, "trade id")?)
                .with(SecurityTradeHeader::Security, row.required_text(security, "security")?)
                .with(SecurityTradeHeader::Count, quantity)
                .with(SecurityTradeHeader::Price, row.required_decimal(price, "price")?)
                .with(SecurityTradeHeader::Currency, row.required_text(currency, "currency")?);
            if let Some(value) = row.decimal(commission)? {
                record.put(SecurityTradeHeader::Commission, value);
            }
            if let Some(value) = accrued.map(|c| row.decimal(c)).transpose()?.flatten() {
                record.put(SecurityTradeHeader::AccruedInterest, value);
            }
            table.push(record);
        }
        Ok(table)
    }
}

pub struct CashParser;

impl TableParser for CashParser {
    type Header = CashFlowHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<CashFlowHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Cash") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let kind = section.column("Type")?;
        let amount = section.column("Amount")?;
        let currency = section.column("Currency")?;
        let description = section.optional_column("Description");

        for row in section.rows() {
            let flow = row.cash_flow_type(kind)?;
            let mut record = Table::new_record()
                .with(CashFlowHeader::Date, format_date(row.date(date)?))
                .with(CashFlowHeader::Type, flow)
                .with(CashFlowHeader::Value, row.required_decimal(amount, "amount")?)
                .with(CashFlowHeader::Currency, row.required_text(currency, "currency")?);
            if let Some(text) = description.and_then(|c| row.text(c)) {
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
        let trade_id = section.optional_column("Trade ID");
        let portfolio = section.optional_column("Portfolio");
        let security = section.column("Security")?;
        let count = section.column("Count")?;

        for row in section.rows() {
            let mut record = Table::new_record()
                .with(SecurityTransferHeader::Date, format_date(row.date(date)?))
                .with(SecurityTransferHeader::Security, row.required_text(security, "security")?)
                .with(SecurityTransferHeader::Count, row.required_int(count, "count")?);
            if let Some(id) = trade_id.and_then(|c| row.text(c)) {
                record.put(SecurityTransferHeader::TradeId, id);
            }
            if let Some(name) = portfolio.and_then(|c| row.text(c)) {
                record.put(SecurityTransferHeader::Portfolio, name);
            }
            table.push(record);
        }
        Ok(table)
    }
}

/// Cash flow types a security event row may carry.
pub const EVENT_TYPES: &[CashFlowType] = &[
    CashFlowType::Coupon,
    CashFlowType::Dividend,
    CashFlowType::Amortization,
    CashFlowType::Redemption,
];

pub struct EventsParser;

impl TableParser for EventsParser {
    type Header = SecurityEventHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<SecurityEventHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Events") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let security = section.column("Security")?;
        let count = section.column("Count")?;
        let kind = section.column("Type")?;
        let amount = section.column("Amount")?;
        let tax = section.optional_column("Tax");
        let currency = section.column("Currency")?;

        for row in section.rows() {
            let event = row.cash_flow_type(kind)?;
            if !EVENT_TYPES.contains(&event) {
                return Err(row.error(format!("'{event}' is not a security event")));
            }
            let mut record = Table::new_record()
                .with(SecurityEventHeader::Date, format_date(row.date(date)?))
                .with(SecurityEventHeader::Security, row.required_text(security, "security")?)
                .with(SecurityEventHeader::Count, row.required_int(count, "count")?)
                .with(SecurityEventHeader::EventType, event)
                .with(SecurityEventHeader::Value, row.required_decimal(amount, "amount")?)
                .with(SecurityEventHeader::Currency, row.required_text(currency, "currency")?);
            if let Some(value) = tax.map(|c| row.decimal(c)).transpose()?.flatten() {
                record.put(SecurityEventHeader::Tax, value);
            }
            table.push(record);
        }
        Ok(table)
    }
}

pub struct PortfolioParser;

impl TableParser for PortfolioParser {
    type Header = PortfolioPropertyHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<PortfolioPropertyHeader>> {
        let mut table = Table::new();
        let Some(section) = Section::find(report, "Portfolio") else {
            return Ok(table);
        };
        let date = section.column("Date")?;
        let property = section.column("Property")?;
        let value = section.column("Value")?;

        for row in section.rows() {
            table.push(
                Table::new_record()
                    .with(PortfolioPropertyHeader::Date, format_date(row.date(date)?))
                    .with(PortfolioPropertyHeader::Property, row.required_text(property, "property")?)
                    .with(PortfolioPropertyHeader::Value, row.required_decimal(value, "value")?),
            );
        }
        Ok(table)
    }
}
