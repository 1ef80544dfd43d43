//! Rendering of canonical tables into spreadsheet sheets.
//!
//! Every report kind goes through the same steps: header row, data rows,
//! an optional total row, then a styling pass. What varies per kind lives in
//! its [`TableLayout`].

pub mod layouts;
pub mod style;

use crate::sheet::Sheet;
use crate::table::{CellValue, Record, Table, TableHeader};
use style::{CellStyles, StyleRole};

pub const HEADER_ROW: usize = 0;
pub const FIRST_DATA_ROW: usize = 1;
pub const DEFAULT_COLUMN_WIDTH: f64 = 14.0;

type TotalFn<H> = Box<dyn Fn(&Table<H>) -> Record<H> + Send + Sync>;

/// How a report kind builds its total row.
pub enum TotalRow<H: TableHeader> {
    /// The kind has no meaningful aggregate; no total row is written.
    None,
    Synthesize(TotalFn<H>),
}

impl<H: TableHeader> TotalRow<H> {
    pub fn synthesize(f: impl Fn(&Table<H>) -> Record<H> + Send + Sync + 'static) -> Self {
        Self::Synthesize(Box::new(f))
    }

    /// `label` in `label_column` and a `SUM` over the data rows of each of `columns`.
    pub fn sums(label_column: H, label: &str, columns: &[H]) -> Self {
        let label = label.to_string();
        let columns = columns.to_vec();
        Self::synthesize(move |table| {
            let mut total = Table::new_record();
            total.put(label_column, label.as_str());
            for column in &columns {
                total.put(*column, sum_formula(*column, table.len()));
            }
            total
        })
    }

    pub fn build(&self, table: &Table<H>) -> Option<Record<H>> {
        match self {
            Self::None => None,
            Self::Synthesize(f) => Some(f(table)),
        }
    }
}

/// `=SUM(..)` over the data rows of a table with `data_rows` records.
/// With no records it is `=SUM(0)`, since spreadsheets reject an empty call.
pub fn sum_formula<H: TableHeader>(column: H, data_rows: usize) -> CellValue {
    if data_rows == 0 {
        return CellValue::formula("SUM(0)");
    }
    CellValue::formula(format!("SUM({})", column.range(FIRST_DATA_ROW, data_rows)))
}

/// Per-kind presentation choices.
pub struct TableLayout<H: TableHeader> {
    pub column_widths: Vec<(H, f64)>,
    /// Column holding the row label, e.g. the security name.
    pub label_column: Option<H>,
    pub int_columns: Vec<H>,
    pub total_row: TotalRow<H>,
}

impl<H: TableHeader> Default for TableLayout<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: TableHeader> TableLayout<H> {
    pub fn new() -> Self {
        Self {
            column_widths: Vec::new(),
            label_column: None,
            int_columns: Vec::new(),
            total_row: TotalRow::None,
        }
    }

    pub fn width(mut self, column: H, width: f64) -> Self {
        self.column_widths.push((column, width));
        self
    }

    pub fn label(mut self, column: H) -> Self {
        self.label_column = Some(column);
        self
    }

    pub fn int_columns(mut self, columns: &[H]) -> Self {
        self.int_columns.extend_from_slice(columns);
        self
    }

    pub fn total(mut self, total_row: TotalRow<H>) -> Self {
        self.total_row = total_row;
        self
    }

    fn is_label(&self, column: usize) -> bool {
        self.label_column.is_some_and(|c| c.ordinal() == column)
    }

    fn is_int(&self, column: usize) -> bool {
        self.int_columns.iter().any(|c| c.ordinal() == column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub data_rows: usize,
    /// Sheet row of the total row, if one was written.
    pub total_row: Option<usize>,
}

/// Render `table` into `sheet`, which is assumed to be empty.
pub fn export<H, S>(
    table: &Table<H>,
    layout: &TableLayout<H>,
    styles: &CellStyles,
    sheet: &mut S,
) -> ExportSummary
where
    H: TableHeader,
    S: Sheet + ?Sized,
{
    write_header(sheet, layout, styles);
    let data_rows = write_rows(sheet, table);
    let total_row = write_total_row(sheet, table, layout);
    style_sheet(sheet, layout, styles, total_row);
    tracing::info!(
        sheet = sheet.name(),
        kind = %H::KIND,
        rows = data_rows,
        total = total_row.is_some(),
        "exported table"
    );
    ExportSummary {
        data_rows,
        total_row,
    }
}

pub fn write_header<H, S>(sheet: &mut S, layout: &TableLayout<H>, styles: &CellStyles)
where
    H: TableHeader,
    S: Sheet + ?Sized,
{
    for column in H::COLUMNS {
        let ordinal = column.ordinal();
        sheet.set_value(HEADER_ROW, ordinal, CellValue::Text(column.title().to_string()));
        sheet.set_style(HEADER_ROW, ordinal, styles.get(StyleRole::Header));
        sheet.set_column_width(ordinal, DEFAULT_COLUMN_WIDTH);
    }
    for (column, width) in &layout.column_widths {
        sheet.set_column_width(column.ordinal(), *width);
    }
}

fn write_record<H, S>(sheet: &mut S, row: usize, record: &Record<H>)
where
    H: TableHeader,
    S: Sheet + ?Sized,
{
    for (column, value) in record.iter() {
        sheet.set_value(row, column.ordinal(), value.clone());
    }
}

fn write_rows<H, S>(sheet: &mut S, table: &Table<H>) -> usize
where
    H: TableHeader,
    S: Sheet + ?Sized,
{
    for (i, record) in table.iter().enumerate() {
        write_record(sheet, FIRST_DATA_ROW + i, record);
    }
    table.len()
}

fn write_total_row<H, S>(sheet: &mut S, table: &Table<H>, layout: &TableLayout<H>) -> Option<usize>
where
    H: TableHeader,
    S: Sheet + ?Sized,
{
    let total = layout.total_row.build(table)?;
    let row = FIRST_DATA_ROW + table.len();
    write_record(sheet, row, &total);
    Some(row)
}

/// Assign styles to every written cell below the header.
///
/// Only sets styles, so applying it again leaves the sheet unchanged.
pub fn style_sheet<H, S>(
    sheet: &mut S,
    layout: &TableLayout<H>,
    styles: &CellStyles,
    total_row: Option<usize>,
) where
    H: TableHeader,
    S: Sheet + ?Sized,
{
    for row in FIRST_DATA_ROW..sheet.row_count() {
        if Some(row) == total_row {
            continue;
        }
        for column in sheet.row_cells(row) {
            let int_value = sheet.value(row, column).is_some_and(CellValue::is_int);
            let role = if layout.is_label(column) {
                StyleRole::LeftAlignedText
            } else if int_value || layout.is_int(column) {
                StyleRole::Int
            } else {
                StyleRole::DefaultText
            };
            sheet.set_style(row, column, styles.get(role));
        }
    }

    let Some(row) = total_row else { return };
    for column in sheet.row_cells(row) {
        let role = if layout.is_label(column) {
            StyleRole::TotalText
        } else if layout.is_int(column) {
            StyleRole::Int
        } else {
            StyleRole::TotalRow
        };
        sheet.set_style(row, column, styles.get(role));
    }
}
