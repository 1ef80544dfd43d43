use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cash_flow::CashFlowType;
use crate::error::Result;

/// Canonical report kinds. Each `TableHeader` type belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    SecurityTrades,
    CashFlows,
    SecurityTransfers,
    SecurityEvents,
    PortfolioProperties,
}

pub const ALL_TABLE_KINDS: &[TableKind] = &[
    TableKind::SecurityTrades,
    TableKind::CashFlows,
    TableKind::SecurityTransfers,
    TableKind::SecurityEvents,
    TableKind::PortfolioProperties,
];

impl TableKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SecurityTrades => "trades",
            Self::CashFlows => "cash_flows",
            Self::SecurityTransfers => "transfers",
            Self::SecurityEvents => "events",
            Self::PortfolioProperties => "portfolio",
        }
    }

    /// Sheet name used when the table is exported.
    pub fn title(&self) -> &'static str {
        match self {
            Self::SecurityTrades => "Trades",
            Self::CashFlows => "Cash flows",
            Self::SecurityTransfers => "Security transfers",
            Self::SecurityEvents => "Security events",
            Self::PortfolioProperties => "Portfolio",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered column schema of one report kind.
///
/// `COLUMNS` lists every column left to right and `ordinal` is the index of a
/// column in that list. Use [`table_header!`](crate::table_header) to declare
/// one; it derives ordinals from declaration order so they stay contiguous.
pub trait TableHeader: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    const KIND: TableKind;
    const COLUMNS: &'static [Self];

    fn ordinal(&self) -> usize;

    fn title(&self) -> &'static str;

    fn column_letter(&self) -> String {
        column_letter(self.ordinal())
    }

    /// A1-style range of this column between two 0-based sheet rows, inclusive.
    /// Empty when `last_row < first_row`.
    fn range(&self, first_row: usize, last_row: usize) -> String {
        if last_row < first_row {
            return String::new();
        }
        let col = self.column_letter();
        format!("{col}{}:{col}{}", first_row + 1, last_row + 1)
    }
}

/// Spreadsheet column letters for a 0-based ordinal: 0 -> A, 26 -> AA.
pub fn column_letter(ordinal: usize) -> String {
    let mut n = ordinal + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Declare a header enum and its `TableHeader` impl.
///
/// ```
/// brokerbook::table_header! {
///     /// Two-column example.
///     pub enum Demo: brokerbook::table::TableKind::CashFlows {
///         Date => "Date",
///         Value => "Value",
///     }
/// }
/// ```
#[macro_export]
macro_rules! table_header {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:path {
            $($variant:ident => $title:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::table::TableHeader for $name {
            const KIND: $crate::table::TableKind = $kind;
            const COLUMNS: &'static [Self] = &[$(Self::$variant),+];

            fn ordinal(&self) -> usize {
                *self as usize
            }

            fn title(&self) -> &'static str {
                match self {
                    $(Self::$variant => $title),+
                }
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Int(i64),
    Decimal(Decimal),
    /// Spreadsheet formula including the leading `=`.
    Formula(String),
}

impl CellValue {
    pub fn formula(expr: impl Into<String>) -> Self {
        let expr = expr.into();
        if expr.starts_with('=') {
            Self::Formula(expr)
        } else {
            Self::Formula(format!("={expr}"))
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Formula(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<CashFlowType> for CellValue {
    fn from(value: CashFlowType) -> Self {
        Self::Int(value.code().into())
    }
}

/// One row of a table: a value per populated column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<H: TableHeader> {
    cells: BTreeMap<H, CellValue>,
}

impl<H: TableHeader> Default for Record<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: TableHeader> Record<H> {
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, column: H, value: impl Into<CellValue>) -> &mut Self {
        self.cells.insert(column, value.into());
        self
    }

    pub fn with(mut self, column: H, value: impl Into<CellValue>) -> Self {
        self.put(column, value);
        self
    }

    pub fn get(&self, column: H) -> Option<&CellValue> {
        self.cells.get(&column)
    }

    pub fn text(&self, column: H) -> Option<&str> {
        match self.get(column)? {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, column: H) -> Option<i64> {
        match self.get(column)? {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn decimal(&self, column: H) -> Option<Decimal> {
        match self.get(column)? {
            CellValue::Decimal(d) => Some(*d),
            CellValue::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Decode a column holding a cash flow type code.
    pub fn cash_flow_type(&self, column: H) -> Result<Option<CashFlowType>> {
        self.int(column).map(CashFlowType::classify).transpose()
    }

    /// Populated cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &CellValue)> {
        self.cells.iter().map(|(h, v)| (*h, v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Ordered records of one report kind.
///
/// Tables are built by parsers and then frozen behind an `Arc` by the report
/// handle; nothing hands out `&mut Table` after that point.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<H: TableHeader> {
    records: Vec<Record<H>>,
}

impl<H: TableHeader> Default for Table<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: TableHeader> Table<H> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn new_record() -> Record<H> {
        Record::new()
    }

    pub fn push(&mut self, record: Record<H>) {
        self.records.push(record);
    }

    pub fn columns(&self) -> &'static [H] {
        H::COLUMNS
    }

    pub fn kind(&self) -> TableKind {
        H::KIND
    }

    /// Number of data records. A total row is never part of a table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record<H>> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record<H>] {
        &self.records
    }

    /// Values of one column, one entry per record.
    pub fn column(&self, column: H) -> impl Iterator<Item = Option<&CellValue>> + '_ {
        self.records.iter().map(move |r| r.get(column))
    }
}

impl<H: TableHeader> FromIterator<Record<H>> for Table<H> {
    fn from_iter<I: IntoIterator<Item = Record<H>>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a, H: TableHeader> IntoIterator for &'a Table<H> {
    type Item = &'a Record<H>;
    type IntoIter = std::slice::Iter<'a, Record<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
