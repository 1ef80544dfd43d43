use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Stable identity of one raw report, used to key memoized tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReportId {
    pub broker: String,
    pub name: String,
    pub checksum: String,
}

impl ReportId {
    pub fn new(broker: &str, name: &str, data: &[u8]) -> Self {
        Self {
            broker: broker.to_string(),
            name: name.to_string(),
            checksum: compute_checksum(data),
        }
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.broker, self.name)
    }
}

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form of the cell, trimmed. `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
        }
    }
}

static EMPTY_CELL: RawCell = RawCell::Empty;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRow {
    /// 1-based row position in the source document.
    pub position: usize,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn get(&self, index: usize) -> &RawCell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(RawCell::is_empty)
    }
}

/// An opened broker report: named sections of rows, header row first.
///
/// Decoding the underlying file is the implementor's concern; parsers only
/// read sections sequentially.
pub trait RawReport: Send + Sync {
    fn id(&self) -> &ReportId;

    /// Rows of a section, or `None` when the report has no such section.
    /// Names are matched case-insensitively.
    fn section(&self, name: &str) -> Option<&[RawRow]>;

    fn section_names(&self) -> Vec<String>;
}

static SECTION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(.+)\]$").unwrap());

fn section_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Sectioned CSV
// ---------------------------------------------------------------------------

/// A single CSV document split into sections by `[Name]` marker rows.
#[derive(Debug)]
pub struct CsvReport {
    id: ReportId,
    order: Vec<String>,
    sections: HashMap<String, Vec<RawRow>>,
}

impl CsvReport {
    pub fn open(broker: &str, file_path: &Path) -> Result<Self> {
        let data = std::fs::read(file_path)?;
        let name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("report.csv");
        Self::from_bytes(broker, name, &data)
    }

    pub fn from_bytes(broker: &str, name: &str, data: &[u8]) -> Result<Self> {
        let id = ReportId::new(broker, name, data);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut order = Vec::new();
        let mut sections: HashMap<String, Vec<RawRow>> = HashMap::new();
        let mut current: Option<String> = None;

        for result in rdr.records() {
            let record = result?;
            let position = record.position().map(|p| p.line() as usize).unwrap_or(0);
            let first = record.get(0).unwrap_or("").trim();
            if let Some(caps) = SECTION_MARKER.captures(first) {
                let key = section_key(&caps[1]);
                if !sections.contains_key(&key) {
                    order.push(key.clone());
                    sections.insert(key.clone(), Vec::new());
                }
                current = Some(key);
                continue;
            }
            let Some(key) = &current else { continue };
            let row = RawRow {
                position,
                cells: record
                    .iter()
                    .map(|f| {
                        let f = f.trim();
                        if f.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text(f.to_string())
                        }
                    })
                    .collect(),
            };
            if row.is_blank() {
                continue;
            }
            if let Some(rows) = sections.get_mut(key) {
                rows.push(row);
            }
        }

        tracing::debug!(report = %id, sections = order.len(), "read csv report");
        Ok(Self {
            id,
            order,
            sections,
        })
    }
}

impl RawReport for CsvReport {
    fn id(&self) -> &ReportId {
        &self.id
    }

    fn section(&self, name: &str) -> Option<&[RawRow]> {
        self.sections.get(&section_key(name)).map(Vec::as_slice)
    }

    fn section_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

// ---------------------------------------------------------------------------
// XLSX workbook (feature-gated)
// ---------------------------------------------------------------------------

/// A workbook whose worksheets are the report sections.
#[cfg(feature = "xlsx")]
#[derive(Debug)]
pub struct WorkbookReport {
    id: ReportId,
    order: Vec<String>,
    sections: HashMap<String, Vec<RawRow>>,
}

#[cfg(feature = "xlsx")]
impl WorkbookReport {
    pub fn open(broker: &str, file_path: &Path) -> Result<Self> {
        use calamine::{Data, Reader};

        let data = std::fs::read(file_path)?;
        let name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("report.xlsx");
        let id = ReportId::new(broker, name, &data);

        let mut workbook = calamine::open_workbook_auto(file_path)?;
        let mut order = Vec::new();
        let mut sections = HashMap::new();
        for sheet in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet)?;
            let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
            let mut rows = Vec::new();
            for (i, row) in range.rows().enumerate() {
                let cells: Vec<RawCell> = row
                    .iter()
                    .map(|cell| match cell {
                        Data::Empty => RawCell::Empty,
                        Data::String(s) => RawCell::Text(s.clone()),
                        Data::Int(i) => RawCell::Int(*i),
                        Data::Float(f) => RawCell::Float(*f),
                        Data::Bool(b) => RawCell::Text(b.to_string()),
                        Data::DateTime(dt) => RawCell::Float(dt.as_f64()),
                        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
                        Data::Error(e) => RawCell::Text(format!("#{e:?}")),
                    })
                    .collect();
                let row = RawRow {
                    position: first_row + i + 1,
                    cells,
                };
                if !row.is_blank() {
                    rows.push(row);
                }
            }
            let key = section_key(&sheet);
            order.push(key.clone());
            sections.insert(key, rows);
        }

        tracing::debug!(report = %id, sections = order.len(), "read workbook report");
        Ok(Self {
            id,
            order,
            sections,
        })
    }
}

#[cfg(feature = "xlsx")]
impl RawReport for WorkbookReport {
    fn id(&self) -> &ReportId {
        &self.id
    }

    fn section(&self, name: &str) -> Option<&[RawRow]> {
        self.sections.get(&section_key(name)).map(Vec::as_slice)
    }

    fn section_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// A report assembled in code, one row list per section. Row positions are
/// assigned in insertion order across the whole report.
#[derive(Debug)]
pub struct MemoryReport {
    id: ReportId,
    order: Vec<String>,
    sections: HashMap<String, Vec<RawRow>>,
    next_position: usize,
}

impl MemoryReport {
    pub fn new(broker: &str, name: &str) -> Self {
        Self {
            id: ReportId::new(broker, name, name.as_bytes()),
            order: Vec::new(),
            sections: HashMap::new(),
            next_position: 1,
        }
    }

    pub fn with_section(mut self, name: &str, rows: Vec<Vec<RawCell>>) -> Self {
        let key = section_key(name);
        let mut raw = Vec::with_capacity(rows.len());
        for cells in rows {
            raw.push(RawRow {
                position: self.next_position,
                cells,
            });
            self.next_position += 1;
        }
        if !self.sections.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.sections.entry(key).or_default().extend(raw);
        self
    }
}

impl RawReport for MemoryReport {
    fn id(&self) -> &ReportId {
        &self.id
    }

    fn section(&self, name: &str) -> Option<&[RawRow]> {
        self.sections.get(&section_key(name)).map(Vec::as_slice)
    }

    fn section_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
Statement for account 1234

[Trades]
Date,Security,Count
01.02.2024,SBER,10

[Cash]
Date,Amount
03.02.2024,100.00
";

    #[test]
    fn test_csv_report_splits_sections() {
        let report = CsvReport::from_bytes("test", "stmt.csv", STATEMENT.as_bytes()).unwrap();
        assert_eq!(report.section_names(), vec!["trades", "cash"]);
        let trades = report.section("TRADES").unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].get(1), &RawCell::Text("SBER".into()));
        assert_eq!(trades[1].get(7), &RawCell::Empty);
        assert!(report.section("transfers").is_none());
    }

    #[test]
    fn test_csv_report_keeps_line_positions() {
        let report = CsvReport::from_bytes("test", "stmt.csv", STATEMENT.as_bytes()).unwrap();
        let cash = report.section("cash").unwrap();
        assert_eq!(cash[0].position, 8);
        assert_eq!(cash[1].position, 9);
    }

    #[test]
    fn test_report_id_depends_on_content() {
        let a = ReportId::new("test", "a.csv", b"one");
        let b = ReportId::new("test", "a.csv", b"two");
        assert_ne!(a, b);
        assert_eq!(a, ReportId::new("test", "a.csv", b"one"));
        assert_eq!(a.to_string(), "test/a.csv");
    }

    #[test]
    fn test_csv_report_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stmt.csv");
        std::fs::write(&path, STATEMENT).unwrap();
        let report = CsvReport::open("test", &path).unwrap();
        assert_eq!(report.id().name, "stmt.csv");
        assert_eq!(report.id().checksum, compute_checksum(STATEMENT.as_bytes()));
    }

    #[test]
    fn test_memory_report_positions() {
        let report = MemoryReport::new("test", "mem")
            .with_section("Money", vec![vec![RawCell::Text("Date".into())], vec![RawCell::Float(45292.0)]])
            .with_section("Trades", vec![vec![RawCell::Text("Date".into())]]);
        assert_eq!(report.section_names(), vec!["money", "trades"]);
        assert_eq!(report.section("money").unwrap()[1].position, 2);
        assert_eq!(report.section("Trades").unwrap()[0].position, 3);
    }

    #[test]
    fn test_raw_cell_text() {
        assert_eq!(RawCell::Text("  x ".into()).as_text(), Some("x".to_string()));
        assert_eq!(RawCell::Text("  ".into()).as_text(), None);
        assert_eq!(RawCell::Int(5).as_text(), Some("5".to_string()));
        assert!(RawCell::Empty.is_empty());
    }
}
