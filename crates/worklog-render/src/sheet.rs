//! Worksheet helpers shared by the workbook renderers: sheet-name
//! sanitization and display-width based column sizing.

use rust_xlsxwriter::{Format, Url, Worksheet};
use worklog_core::RenderError;

/// Longest sheet name Excel accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Column width clamp after padding
const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 50;

/// Characters Excel rejects in sheet names
const INVALID_SHEET_CHARS: [char; 7] = ['\\', '/', '*', '?', ':', '[', ']'];

/// Sanitize a string for use as a sheet name.
///
/// Invalid characters become underscores; names longer than 31 characters
/// are cut to 28 plus a `...` suffix, exactly 31 in total.
pub fn safe_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();

    if cleaned.chars().count() > MAX_SHEET_NAME_LEN {
        let truncated: String = cleaned.chars().take(MAX_SHEET_NAME_LEN - 3).collect();
        format!("{truncated}...")
    } else {
        cleaned
    }
}

/// Display width of a cell value: wide (non-ASCII) characters count double
/// so CJK-heavy columns don't end up cramped
pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

/// Tracks the widest value written to each column of a sheet so columns can
/// be auto-sized once the sheet is complete.
#[derive(Debug, Default)]
pub(crate) struct ColumnWidths {
    widths: Vec<usize>,
}

impl ColumnWidths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value written to `col`
    pub fn observe(&mut self, col: u16, text: &str) {
        let col = col as usize;
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        self.widths[col] = self.widths[col].max(display_width(text));
    }

    /// Apply the recorded widths, padded by 2 and clamped to `[8, 50]`
    pub fn apply(&self, sheet: &mut Worksheet) {
        for (col, width) in self.widths.iter().enumerate() {
            let adjusted = (width + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
            sheet.set_column_width(col as u16, adjusted as f64).ok();
        }
    }
}

/// Write a header row and record its widths
pub(crate) fn write_headers(
    sheet: &mut Worksheet,
    headers: &[&str],
    format: &Format,
    widths: &mut ColumnWidths,
) -> Result<(), RenderError> {
    for (col, header) in headers.iter().enumerate() {
        widths.observe(col as u16, header);
        sheet
            .write_with_format(0, col as u16, *header, format)
            .map_err(|e| RenderError::Format(e.to_string()))?;
    }
    Ok(())
}

/// Write a URL cell as a `Link` hyperlink; non-http values stay empty
pub(crate) fn write_link_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    url: &str,
    link_format: &Format,
    text_format: &Format,
    widths: &mut ColumnWidths,
) -> Result<(), RenderError> {
    if url.starts_with("http") {
        widths.observe(col, "Link");
        sheet
            .write_url_with_format(row, col, Url::new(url).set_text("Link"), link_format)
            .map_err(|e| RenderError::Format(e.to_string()))?;
    } else {
        sheet
            .write_with_format(row, col, "", text_format)
            .map_err(|e| RenderError::Format(e.to_string()))?;
    }
    Ok(())
}
