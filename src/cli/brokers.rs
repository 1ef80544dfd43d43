use comfy_table::{Cell, Table};

use brokerbook::broker::ALL_BROKERS;
use brokerbook::error::Result;

pub fn list() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Name", "File"]);
    for broker in ALL_BROKERS {
        table.add_row(vec![
            Cell::new(broker.key()),
            Cell::new(broker.name()),
            Cell::new(broker.file_kind()),
        ]);
    }
    println!("Broker formats\n{table}");
    Ok(())
}
