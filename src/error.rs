use thiserror::Error;

use crate::raw::ReportId;
use crate::table::TableKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown cash flow type code: {code}{}", located(.report, .position))]
    UnknownCashFlowCode {
        code: i64,
        report: Option<ReportId>,
        position: Option<usize>,
    },

    #[error("Malformed report {report} at row {position}: {message}")]
    ReportFormat {
        report: ReportId,
        position: usize,
        message: String,
    },

    #[error("Table kind {0} is already held with a different header type")]
    HeaderMismatch(TableKind),

    #[error("Unknown broker: {0}")]
    UnknownBroker(String),

    #[error("No broker recognizes {0}")]
    UndetectedReport(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl Error {
    pub fn report_format(report: &ReportId, position: usize, message: impl Into<String>) -> Self {
        Self::ReportFormat {
            report: report.clone(),
            position,
            message: message.into(),
        }
    }
}

fn located(report: &Option<ReportId>, position: &Option<usize>) -> String {
    match (report, position) {
        (Some(report), Some(position)) => format!(" in report {report} at row {position}"),
        (Some(report), None) => format!(" in report {report}"),
        _ => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
