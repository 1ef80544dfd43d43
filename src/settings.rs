use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_output_dir_string")]
    pub output_dir: String,
    /// Label written into the total row of exported sheets.
    #[serde(default = "default_total_label")]
    pub total_label: String,
    #[serde(default = "default_header_color")]
    pub header_color: String,
    #[serde(default = "default_total_row_color")]
    pub total_row_color: String,
    #[serde(default = "default_decimal_format")]
    pub decimal_format: String,
    #[serde(default = "default_int_format")]
    pub int_format: String,
}

fn default_total_label() -> String {
    "Итого:".to_string()
}

fn default_header_color() -> String {
    "#DDEBF7".to_string()
}

fn default_total_row_color() -> String {
    "#FCE4D6".to_string()
}

fn default_decimal_format() -> String {
    "#,##0.00".to_string()
}

fn default_int_format() -> String {
    "0".to_string()
}

fn default_output_dir_string() -> String {
    default_output_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir_string(),
            total_label: default_total_label(),
            header_color: default_header_color(),
            total_row_color: default_total_row_color(),
            decimal_format: default_decimal_format(),
            int_format: default_int_format(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("brokerbook")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("brokerbook")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
