use std::path::{Path, PathBuf};

use colored::Colorize;

use brokerbook::broker::{export_all, resolve};
use brokerbook::error::Result;
use brokerbook::settings::{load_settings, shellexpand_path};
use brokerbook::sheet::Workbook;

use crate::cli::ExportFormat;

fn report_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string())
}

pub fn run(file: &str, broker: Option<&str>, output: Option<String>, format: ExportFormat) -> Result<()> {
    let settings = load_settings();
    let path = PathBuf::from(shellexpand_path(file));
    let broker = resolve(&path, broker)?;
    let handle = broker.open(&path)?;

    let mut book = Workbook::new();
    let outcomes = export_all(broker, &handle, &settings, &mut book);
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => println!("  {} {}: {} rows", "✓".green(), outcome.kind.title(), summary.data_rows),
            Err(e) => println!("  {} {}: {e}", "✗".red(), outcome.kind.title()),
        }
    }

    let output = output.map(|o| PathBuf::from(shellexpand_path(&o)));
    let default_base = PathBuf::from(&settings.output_dir).join(report_stem(&path));
    let written = match format {
        ExportFormat::Csv => book.save_csv(&output.unwrap_or(default_base))?,
        ExportFormat::Json => {
            let target = output.unwrap_or_else(|| default_base.with_extension("json"));
            vec![book.save_json(&target)?]
        }
    };
    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
