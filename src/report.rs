use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};
use crate::raw::{RawReport, ReportId};
use crate::table::{Table, TableHeader, TableKind};

/// Reads one report kind out of a raw report.
///
/// Implementations are broker specific. A parser either returns a complete
/// table or an error; it never hands back a partially filled table.
pub trait TableParser: Send + Sync {
    type Header: TableHeader;

    fn parse(&self, report: &dyn RawReport) -> Result<Table<Self::Header>>;
}

type Slot = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// Owns one raw report and the tables parsed from it.
///
/// Each table kind is parsed at most once per handle. Concurrent callers
/// asking for the same kind wait for the first parse and then share its
/// result. A failed parse stores nothing, so the next call parses again.
pub struct ReportHandle {
    report: Box<dyn RawReport>,
    tables: Mutex<HashMap<TableKind, Slot>>,
}

impl ReportHandle {
    pub fn new(report: impl RawReport + 'static) -> Self {
        Self::from_boxed(Box::new(report))
    }

    pub fn from_boxed(report: Box<dyn RawReport>) -> Self {
        Self {
            report,
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &ReportId {
        self.report.id()
    }

    pub fn report(&self) -> &dyn RawReport {
        self.report.as_ref()
    }

    fn slot(&self, kind: TableKind) -> Slot {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(tables.entry(kind).or_default())
    }

    /// The table of `P::Header`'s kind, parsing it on first request.
    pub fn table<P>(&self, parser: &P) -> Result<Arc<Table<P::Header>>>
    where
        P: TableParser + ?Sized,
    {
        let kind = <P::Header as TableHeader>::KIND;
        let slot = self.slot(kind);
        if slot.get().is_some() {
            tracing::trace!(report = %self.id(), %kind, "table already parsed");
        }
        let erased = slot.get_or_try_init(|| {
            tracing::debug!(report = %self.id(), %kind, "parsing table");
            let table = parser.parse(self.report.as_ref()).map_err(|e| {
                tracing::warn!(report = %self.id(), %kind, error = %e, "parse failed");
                e
            })?;
            tracing::debug!(report = %self.id(), %kind, rows = table.len(), "parsed table");
            Ok::<_, Error>(Arc::new(table) as Arc<dyn Any + Send + Sync>)
        })?;
        Arc::clone(erased)
            .downcast::<Table<P::Header>>()
            .map_err(|_| Error::HeaderMismatch(kind))
    }

    pub fn is_parsed(&self, kind: TableKind) -> bool {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.get(&kind).map_or(false, |slot| slot.get().is_some())
    }
}
