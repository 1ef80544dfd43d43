use serde::Serialize;

use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Concrete presentation of a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellStyle {
    pub alignment: Alignment,
    pub bold: bool,
    pub wrap: bool,
    pub border: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl CellStyle {
    fn plain(alignment: Alignment) -> Self {
        Self {
            alignment,
            bold: false,
            wrap: false,
            border: true,
            number_format: None,
            background: None,
        }
    }
}

/// Semantic presentation categories a table layout can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleRole {
    Header,
    DefaultText,
    LeftAlignedText,
    Int,
    TotalRow,
    TotalText,
}

/// Resolves style roles to concrete styles. Built once per export.
#[derive(Debug, Clone)]
pub struct CellStyles {
    header: CellStyle,
    default_text: CellStyle,
    left_aligned_text: CellStyle,
    int: CellStyle,
    total_row: CellStyle,
    total_text: CellStyle,
}

impl CellStyles {
    pub fn new(settings: &Settings) -> Self {
        let header = CellStyle {
            bold: true,
            wrap: true,
            background: Some(settings.header_color.clone()),
            ..CellStyle::plain(Alignment::Center)
        };
        let default_text = CellStyle {
            number_format: Some(settings.decimal_format.clone()),
            ..CellStyle::plain(Alignment::Center)
        };
        let left_aligned_text = CellStyle::plain(Alignment::Left);
        let int = CellStyle {
            number_format: Some(settings.int_format.clone()),
            ..CellStyle::plain(Alignment::Center)
        };
        let total_row = CellStyle {
            bold: true,
            number_format: Some(settings.decimal_format.clone()),
            background: Some(settings.total_row_color.clone()),
            ..CellStyle::plain(Alignment::Center)
        };
        let total_text = CellStyle {
            bold: true,
            background: Some(settings.total_row_color.clone()),
            ..CellStyle::plain(Alignment::Right)
        };
        Self {
            header,
            default_text,
            left_aligned_text,
            int,
            total_row,
            total_text,
        }
    }

    pub fn get(&self, role: StyleRole) -> &CellStyle {
        match role {
            StyleRole::Header => &self.header,
            StyleRole::DefaultText => &self.default_text,
            StyleRole::LeftAlignedText => &self.left_aligned_text,
            StyleRole::Int => &self.int,
            StyleRole::TotalRow => &self.total_row,
            StyleRole::TotalText => &self.total_text,
        }
    }
}

impl Default for CellStyles {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}
