use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use brokerbook::broker::{inspect, resolve};
use brokerbook::error::Result;
use brokerbook::settings::shellexpand_path;

pub fn run(file: &str, broker: Option<&str>, json: bool) -> Result<()> {
    let path = PathBuf::from(shellexpand_path(file));
    let broker = resolve(&path, broker)?;
    let handle = broker.open(&path)?;
    let outcomes = inspect(broker, &handle);

    if json {
        let tables: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(rows) => serde_json::json!({ "kind": o.kind, "rows": rows }),
                Err(e) => serde_json::json!({ "kind": o.kind, "error": e.to_string() }),
            })
            .collect();
        let summary = serde_json::json!({
            "report": handle.id(),
            "tables": tables,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {} ({})", "Report".bold(), handle.id(), broker.name());
    println!("Sections: {}", handle.report().section_names().join(", "));
    let mut table = Table::new();
    table.set_header(vec!["Table", "Rows", "Status"]);
    for outcome in &outcomes {
        let (rows, status) = match &outcome.result {
            Ok(rows) => (rows.to_string(), "ok".green().to_string()),
            Err(e) => ("-".to_string(), e.to_string().red().to_string()),
        };
        table.add_row(vec![
            Cell::new(outcome.kind.title()),
            Cell::new(rows).set_alignment(CellAlignment::Right),
            Cell::new(status),
        ]);
    }
    println!("{table}");
    Ok(())
}
