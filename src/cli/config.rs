use std::path::PathBuf;

use brokerbook::error::Result;
use brokerbook::settings::{load_settings, save_settings, settings_file_exists, settings_path, shellexpand_path};

pub fn run(total_label: Option<String>, output_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    let changed = total_label.is_some() || output_dir.is_some();

    if let Some(label) = total_label {
        settings.total_label = label;
    }
    if let Some(dir) = output_dir {
        settings.output_dir = PathBuf::from(shellexpand_path(&dir)).to_string_lossy().to_string();
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    } else if !settings_file_exists() {
        println!("No settings file yet; showing defaults.");
    }

    println!("Output dir:    {}", settings.output_dir);
    println!("Total label:   {}", settings.total_label);
    println!("Header color:  {}", settings.header_color);
    println!("Total color:   {}", settings.total_row_color);
    println!("Number format: {}", settings.decimal_format);
    Ok(())
}
