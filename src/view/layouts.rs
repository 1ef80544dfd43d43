//! Presentation of each canonical report kind.

use super::{TableLayout, TotalRow};
use crate::headers::{
    CashFlowHeader, PortfolioPropertyHeader, SecurityEventHeader, SecurityTradeHeader,
    SecurityTransferHeader,
};
use crate::settings::Settings;
use crate::table::TableHeader;

const DATE_WIDTH: f64 = 12.0;
const SECURITY_WIDTH: f64 = 45.0;

/// A header type that knows how its sheet is laid out.
pub trait ReportLayout: TableHeader {
    fn layout(settings: &Settings) -> TableLayout<Self>;
}

impl ReportLayout for SecurityTradeHeader {
    fn layout(settings: &Settings) -> TableLayout<Self> {
        use SecurityTradeHeader::*;
        TableLayout::new()
            .width(Date, DATE_WIDTH)
            .width(Security, SECURITY_WIDTH)
            .label(Security)
            .int_columns(&[Count])
            .total(TotalRow::sums(
                Security,
                &settings.total_label,
                &[Count, AccruedInterest, Commission],
            ))
    }
}

impl ReportLayout for CashFlowHeader {
    fn layout(settings: &Settings) -> TableLayout<Self> {
        use CashFlowHeader::*;
        TableLayout::new()
            .width(Date, DATE_WIDTH)
            .width(Description, SECURITY_WIDTH)
            .label(Date)
            .int_columns(&[Type])
            .total(TotalRow::sums(Date, &settings.total_label, &[Value]))
    }
}

impl ReportLayout for SecurityTransferHeader {
    fn layout(settings: &Settings) -> TableLayout<Self> {
        use SecurityTransferHeader::*;
        TableLayout::new()
            .width(Date, DATE_WIDTH)
            .width(Security, SECURITY_WIDTH)
            .width(Count, 18.0)
            .label(Security)
            .int_columns(&[Count])
            .total(TotalRow::sums(Security, &settings.total_label, &[Count]))
    }
}

impl ReportLayout for SecurityEventHeader {
    fn layout(settings: &Settings) -> TableLayout<Self> {
        use SecurityEventHeader::*;
        TableLayout::new()
            .width(Date, DATE_WIDTH)
            .width(Security, SECURITY_WIDTH)
            .label(Security)
            .int_columns(&[Count, EventType])
            .total(TotalRow::sums(Security, &settings.total_label, &[Value, Tax]))
    }
}

// Property values are not additive.
impl ReportLayout for PortfolioPropertyHeader {
    fn layout(_settings: &Settings) -> TableLayout<Self> {
        use PortfolioPropertyHeader::*;
        TableLayout::new()
            .width(Date, DATE_WIDTH)
            .width(Property, 30.0)
            .label(Property)
    }
}
