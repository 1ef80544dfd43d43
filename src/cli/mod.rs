pub mod brokers;
pub mod config;
pub mod export;
pub mod inspect;
pub mod taxonomy;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "brokerbook",
    version,
    about = "Normalize broker investment reports into canonical tables and spreadsheets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported broker report formats.
    Brokers,
    /// Show every cash flow type and its stored code.
    Taxonomy,
    /// Look up the cash flow type for a stored code.
    Classify {
        /// Integer code, e.g. 6
        #[arg(allow_hyphen_values = true)]
        code: i64,
    },
    /// Parse every table of a report and show row counts.
    Inspect {
        /// Path to a CSV or XLSX report
        file: String,
        /// Broker format key (e.g. sectioned_csv); detected when omitted
        #[arg(long)]
        broker: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export every table of a report to spreadsheet sheets.
    Export {
        /// Path to a CSV or XLSX report
        file: String,
        /// Broker format key (e.g. sectioned_csv); detected when omitted
        #[arg(long)]
        broker: Option<String>,
        /// Output directory (csv) or file (json). Default: <output_dir>/<report name>
        #[arg(long)]
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// Show or update settings.
    Config {
        /// Label written into total rows
        #[arg(long = "total-label")]
        total_label: Option<String>,
        /// Default export directory
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// One CSV file per sheet
    Csv,
    /// A single JSON document with values, styles and column widths
    Json,
}
