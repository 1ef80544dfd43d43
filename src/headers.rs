//! Column schemas of the canonical report kinds.

use crate::table::TableKind;
use crate::table_header;

table_header! {
    /// Security purchases and sales. `Count` is negative for sales.
    pub enum SecurityTradeHeader: TableKind::SecurityTrades {
        Date => "Date",
        TradeId => "Trade ID",
        Security => "Security",
        Count => "Count",
        Price => "Price",
        AccruedInterest => "Accrued interest",
        Commission => "Commission",
        Currency => "Currency",
    }
}

table_header! {
    /// Account cash movements. `Type` holds a cash flow type code.
    pub enum CashFlowHeader: TableKind::CashFlows {
        Date => "Date",
        Type => "Type",
        Value => "Value",
        Currency => "Currency",
        Description => "Description",
    }
}

table_header! {
    /// Securities moved into or out of a portfolio without a trade.
    pub enum SecurityTransferHeader: TableKind::SecurityTransfers {
        Date => "Date",
        TradeId => "Trade ID",
        Portfolio => "Portfolio",
        Security => "Security",
        Count => "Count",
    }
}

table_header! {
    /// Coupons, dividends, amortization and redemptions paid on a holding.
    pub enum SecurityEventHeader: TableKind::SecurityEvents {
        Date => "Date",
        Security => "Security",
        Count => "Count",
        EventType => "Event type",
        Value => "Value",
        Tax => "Tax",
        Currency => "Currency",
    }
}

table_header! {
    pub enum PortfolioPropertyHeader: TableKind::PortfolioProperties {
        Date => "Date",
        Property => "Property",
        Value => "Value",
    }
}
