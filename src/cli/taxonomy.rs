use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use brokerbook::cash_flow::{CashFlowType, ALL_CASH_FLOW_TYPES};
use brokerbook::error::Result;

pub fn list() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Code", "Type"]);
    for flow in ALL_CASH_FLOW_TYPES {
        table.add_row(vec![
            Cell::new(flow.code()).set_alignment(CellAlignment::Right),
            Cell::new(flow.title()),
        ]);
    }
    println!("Cash flow types\n{table}");
    Ok(())
}

pub fn classify(code: i64) -> Result<()> {
    let flow = CashFlowType::classify(code)?;
    println!("{} {}", code.to_string().bold(), flow.title());
    Ok(())
}
