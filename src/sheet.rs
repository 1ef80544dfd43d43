use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::table::CellValue;
use crate::view::style::CellStyle;

/// Cell-addressable spreadsheet sheet. Rows and columns are 0-based.
pub trait Sheet {
    fn name(&self) -> &str;

    fn set_value(&mut self, row: usize, column: usize, value: CellValue);

    fn value(&self, row: usize, column: usize) -> Option<&CellValue>;

    /// Style an existing cell. Returns `false` and does nothing when the cell
    /// is absent.
    fn set_style(&mut self, row: usize, column: usize, style: &CellStyle) -> bool;

    fn style(&self, row: usize, column: usize) -> Option<&CellStyle>;

    /// Width in characters.
    fn set_column_width(&mut self, column: usize, width: f64);

    /// One past the last row holding a cell.
    fn row_count(&self) -> usize;

    /// Columns of the cells present in a row, left to right.
    fn row_cells(&self, row: usize) -> Vec<usize>;
}

#[derive(Debug, Clone, PartialEq)]
struct Cell {
    value: CellValue,
    style: Option<CellStyle>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    name: String,
    cells: BTreeMap<(usize, usize), Cell>,
    widths: BTreeMap<usize, f64>,
}

impl MemorySheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn column_width(&self, column: usize) -> Option<f64> {
        self.widths.get(&column).copied()
    }

    pub fn column_count(&self) -> usize {
        self.cells.keys().map(|(_, c)| c + 1).max().unwrap_or(0)
    }

    /// Numeric value of a cell, evaluating `SUM` formulas over this sheet.
    /// `None` for text cells, absent cells and formulas it cannot read.
    pub fn evaluate(&self, row: usize, column: usize) -> Option<Decimal> {
        match &self.cells.get(&(row, column))?.value {
            CellValue::Text(_) => None,
            _ => self.cell_number(row, column, 0),
        }
    }

    /// Value of a cell as a formula operand. Blank and text cells count as zero.
    fn cell_number(&self, row: usize, column: usize, depth: usize) -> Option<Decimal> {
        let Some(cell) = self.cells.get(&(row, column)) else {
            return Some(Decimal::ZERO);
        };
        match &cell.value {
            CellValue::Int(i) => Some(Decimal::from(*i)),
            CellValue::Decimal(d) => Some(*d),
            CellValue::Text(_) => Some(Decimal::ZERO),
            CellValue::Formula(_) if depth > MAX_FORMULA_DEPTH => None,
            CellValue::Formula(f) => self.evaluate_formula(f, depth + 1),
        }
    }

    fn evaluate_formula(&self, formula: &str, depth: usize) -> Option<Decimal> {
        let expr = formula.trim().strip_prefix('=')?.trim();
        let Some(caps) = SUM_CALL.captures(expr) else {
            return self.evaluate_operand(expr, depth);
        };
        let args = caps[1].trim();
        if args.is_empty() {
            return Some(Decimal::ZERO);
        }
        let mut total = Decimal::ZERO;
        for arg in args.split(',') {
            total += self.evaluate_operand(arg.trim(), depth)?;
        }
        Some(total)
    }

    fn evaluate_operand(&self, operand: &str, depth: usize) -> Option<Decimal> {
        if let Some((from, to)) = operand.split_once(':') {
            let (r1, c1) = parse_cell_ref(from)?;
            let (r2, c2) = parse_cell_ref(to)?;
            let mut total = Decimal::ZERO;
            for r in r1.min(r2)..=r1.max(r2) {
                for c in c1.min(c2)..=c1.max(c2) {
                    total += self.cell_number(r, c, depth)?;
                }
            }
            return Some(total);
        }
        if let Some((r, c)) = parse_cell_ref(operand) {
            return self.cell_number(r, c, depth);
        }
        operand.parse().ok()
    }

    fn dump(&self) -> SheetDump<'_> {
        let mut rows: BTreeMap<usize, Vec<CellDump<'_>>> = BTreeMap::new();
        for ((row, column), cell) in &self.cells {
            rows.entry(*row).or_default().push(CellDump {
                column: *column,
                value: &cell.value,
                style: cell.style.as_ref(),
            });
        }
        SheetDump {
            name: &self.name,
            column_widths: &self.widths,
            rows: rows
                .into_iter()
                .map(|(row, cells)| RowDump { row, cells })
                .collect(),
        }
    }
}

const MAX_FORMULA_DEPTH: usize = 32;

static SUM_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^SUM\((.*)\)$").unwrap());
static CELL_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$?([A-Z]+)\$?([0-9]+)$").unwrap());

/// 0-based (row, column) of an A1 reference.
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let caps = CELL_REF.captures(reference.trim())?;
    let column = caps[1].bytes().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?.checked_add(usize::from(b - b'A' + 1))
    })?;
    let row: usize = caps[2].parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, column - 1))
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, row: usize, column: usize, value: CellValue) {
        self.cells.insert((row, column), Cell { value, style: None });
    }

    fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.cells.get(&(row, column)).map(|c| &c.value)
    }

    fn set_style(&mut self, row: usize, column: usize, style: &CellStyle) -> bool {
        match self.cells.get_mut(&(row, column)) {
            Some(cell) => {
                cell.style = Some(style.clone());
                true
            }
            None => false,
        }
    }

    fn style(&self, row: usize, column: usize) -> Option<&CellStyle> {
        self.cells.get(&(row, column))?.style.as_ref()
    }

    fn set_column_width(&mut self, column: usize, width: f64) {
        self.widths.insert(column, width);
    }

    fn row_count(&self) -> usize {
        self.cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0)
    }

    fn row_cells(&self, row: usize) -> Vec<usize> {
        self.cells
            .range((row, 0)..(row + 1, 0))
            .map(|((_, c), _)| *c)
            .collect()
    }
}

#[derive(Serialize)]
struct CellDump<'a> {
    column: usize,
    value: &'a CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a CellStyle>,
}

#[derive(Serialize)]
struct RowDump<'a> {
    row: usize,
    cells: Vec<CellDump<'a>>,
}

#[derive(Serialize)]
struct SheetDump<'a> {
    name: &'a str,
    column_widths: &'a BTreeMap<usize, f64>,
    rows: Vec<RowDump<'a>>,
}

/// Ordered collection of sheets produced by one export run.
#[derive(Debug, Default)]
pub struct Workbook {
    sheets: Vec<MemorySheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, name: &str) -> &mut MemorySheet {
        self.sheets.push(MemorySheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    /// Write one CSV file per sheet into `dir`. Formulas are written as text.
    pub fn save_csv(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for sheet in &self.sheets {
            let path = dir.join(format!("{}.csv", file_stem(&sheet.name)));
            let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
            let width = sheet.column_count();
            for row in 0..sheet.row_count() {
                let record: Vec<String> = (0..width)
                    .map(|c| sheet.value(row, c).map(|v| v.to_string()).unwrap_or_default())
                    .collect();
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
            tracing::info!(sheet = %sheet.name, path = %path.display(), "wrote sheet");
            written.push(path);
        }
        Ok(written)
    }

    /// Write every sheet, with styles and column widths, as one JSON document.
    pub fn save_json(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dumps: Vec<SheetDump<'_>> = self.sheets.iter().map(MemorySheet::dump).collect();
        let json = serde_json::to_string_pretty(&dumps)?;
        std::fs::write(path, format!("{json}\n"))?;
        tracing::info!(path = %path.display(), sheets = dumps.len(), "wrote workbook");
        Ok(path.to_path_buf())
    }
}

fn file_stem(sheet_name: &str) -> String {
    sheet_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
