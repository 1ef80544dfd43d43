use std::path::Path;

use crate::error::{Error, Result};
use crate::raw::CsvReport;
use crate::report::{ReportHandle, TableParser};
use crate::settings::Settings;
use crate::sheet::Workbook;
use crate::table::{TableHeader, TableKind};
use crate::view::layouts::ReportLayout;
use crate::view::style::CellStyles;
use crate::view::{self, ExportSummary};

pub mod section;
pub mod sectioned_csv;
#[cfg(feature = "xlsx")]
pub mod workbook;

// ---------------------------------------------------------------------------
// Broker formats, enum dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broker {
    SectionedCsv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

pub const ALL_BROKERS: &[Broker] = &[
    Broker::SectionedCsv,
    #[cfg(feature = "xlsx")]
    Broker::Workbook,
];

impl Broker {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SectionedCsv => sectioned_csv::KEY,
            #[cfg(feature = "xlsx")]
            Self::Workbook => workbook::KEY,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SectionedCsv => "Sectioned CSV statement",
            #[cfg(feature = "xlsx")]
            Self::Workbook => "XLSX workbook statement",
        }
    }

    pub fn file_kind(&self) -> &'static str {
        match self {
            Self::SectionedCsv => "csv",
            #[cfg(feature = "xlsx")]
            Self::Workbook => "xlsx",
        }
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        match self {
            Self::SectionedCsv => sectioned_csv::detect(file_path),
            #[cfg(feature = "xlsx")]
            Self::Workbook => workbook::detect(file_path),
        }
    }

    /// Read the file and wrap it in a handle. Nothing is parsed yet.
    pub fn open(&self, file_path: &Path) -> Result<ReportHandle> {
        let handle = match self {
            Self::SectionedCsv => ReportHandle::new(CsvReport::open(self.key(), file_path)?),
            #[cfg(feature = "xlsx")]
            Self::Workbook => {
                ReportHandle::new(crate::raw::WorkbookReport::open(self.key(), file_path)?)
            }
        };
        tracing::debug!(report = %handle.id(), "opened report");
        Ok(handle)
    }

    /// Hand each of this broker's parsers to `visitor`, one per table kind.
    pub fn visit_parsers(&self, visitor: &mut impl ParserVisitor) {
        match self {
            Self::SectionedCsv => sectioned_csv::visit_parsers(visitor),
            #[cfg(feature = "xlsx")]
            Self::Workbook => workbook::visit_parsers(visitor),
        }
    }
}

pub fn get_by_key(key: &str) -> Option<Broker> {
    ALL_BROKERS.iter().find(|b| b.key() == key).copied()
}

pub fn get_for_file(file_path: &Path) -> Option<Broker> {
    ALL_BROKERS.iter().find(|b| b.detect(file_path)).copied()
}

/// The broker named by `key`, or the one that recognizes the file.
pub fn resolve(file_path: &Path, key: Option<&str>) -> Result<Broker> {
    match key {
        Some(key) => get_by_key(key).ok_or_else(|| Error::UnknownBroker(key.to_string())),
        None => get_for_file(file_path)
            .ok_or_else(|| Error::UndetectedReport(file_path.display().to_string())),
    }
}

/// Receives the parsers of a broker. Generic over the parser so each kind
/// keeps its own header type.
pub trait ParserVisitor {
    fn visit<P>(&mut self, parser: &P)
    where
        P: TableParser,
        P::Header: ReportLayout;
}

/// Outcome of one table kind. Kinds succeed or fail independently.
#[derive(Debug)]
pub struct KindOutcome<T> {
    pub kind: TableKind,
    pub result: Result<T>,
}

struct Inspector<'a> {
    handle: &'a ReportHandle,
    outcomes: Vec<KindOutcome<usize>>,
}

impl ParserVisitor for Inspector<'_> {
    fn visit<P>(&mut self, parser: &P)
    where
        P: TableParser,
        P::Header: ReportLayout,
    {
        let result = self.handle.table(parser).map(|t| t.len());
        self.outcomes.push(KindOutcome {
            kind: <P::Header as TableHeader>::KIND,
            result,
        });
    }
}

/// Parse every kind the broker knows and count its records.
pub fn inspect(broker: Broker, handle: &ReportHandle) -> Vec<KindOutcome<usize>> {
    let mut inspector = Inspector {
        handle,
        outcomes: Vec::new(),
    };
    broker.visit_parsers(&mut inspector);
    inspector.outcomes
}

struct Exporter<'a> {
    handle: &'a ReportHandle,
    settings: &'a Settings,
    styles: &'a CellStyles,
    workbook: &'a mut Workbook,
    outcomes: Vec<KindOutcome<ExportSummary>>,
}

impl ParserVisitor for Exporter<'_> {
    fn visit<P>(&mut self, parser: &P)
    where
        P: TableParser,
        P::Header: ReportLayout,
    {
        let kind = <P::Header as TableHeader>::KIND;
        let result = self.handle.table(parser).map(|table| {
            let layout = <P::Header as ReportLayout>::layout(self.settings);
            let sheet = self.workbook.add_sheet(kind.title());
            view::export(table.as_ref(), &layout, self.styles, sheet)
        });
        if let Err(e) = &result {
            tracing::warn!(report = %self.handle.id(), %kind, error = %e, "skipping sheet");
        }
        self.outcomes.push(KindOutcome { kind, result });
    }
}

/// Export every kind into its own sheet of `workbook`. A kind that fails to
/// parse gets no sheet; the others are still exported.
pub fn export_all(
    broker: Broker,
    handle: &ReportHandle,
    settings: &Settings,
    workbook: &mut Workbook,
) -> Vec<KindOutcome<ExportSummary>> {
    let styles = CellStyles::new(settings);
    let mut exporter = Exporter {
        handle,
        settings,
        styles: &styles,
        workbook,
        outcomes: Vec::new(),
    };
    broker.visit_parsers(&mut exporter);
    exporter.outcomes
}
