//! Time-report workbook renderer.
//!
//! Produces one workbook with:
//! - **Hierarchical Summary**: the workspace → list → task → member rollup,
//!   one colored header row per level
//! - **User Summary**: totals per user plus a TOTAL row
//! - **All Data**: every entry, sorted by date then member
//! - one tab per user with that user's entries sorted by date
//!
//! Task links are written as hyperlinks labelled `Link`; all columns are
//! auto-sized from the widest value written to them.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet};
use worklog_core::{RenderError, Renderer, SummaryLevel, TimeEntry, TimeReport, User};

use crate::sheet::{safe_sheet_name, write_headers, write_link_cell, ColumnWidths};

/// Header fill used by plain data sheets
const HEADER_COLOR: u32 = 0x36_60_92;
/// Level fills for the hierarchical summary
const WORKSPACE_COLOR: u32 = 0x36_60_92;
const LIST_COLOR: u32 = 0x5B_9B_D5;
const TASK_COLOR: u32 = 0xB4_C6_E7;
const TOTAL_COLOR: u32 = 0xFF_6B_6B;
/// Hyperlink font color
const LINK_COLOR: u32 = 0x00_00_FF;

/// Time-report workbook renderer
#[derive(Clone, Debug, Default)]
pub struct TimeReportRenderer;

impl TimeReportRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Generate the workbook bytes
    pub fn render_to_bytes(&self, report: &TimeReport) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = TimeFormats::new();

        self.add_hierarchy_sheet(&mut workbook, report, &formats)?;
        self.add_user_summary_sheet(&mut workbook, report, &formats)?;
        self.add_all_data_sheet(&mut workbook, report, &formats)?;
        self.add_user_sheets(&mut workbook, report, &formats)?;

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create workbook: {e}")))
    }

    /// Add the Hierarchical Summary sheet
    fn add_hierarchy_sheet(
        &self,
        workbook: &mut Workbook,
        report: &TimeReport,
        formats: &TimeFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Hierarchical Summary")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = ["Level", "Workspace", "List", "Task", "Member", "Hours", "Entries"];
        let mut widths = ColumnWidths::new();
        write_headers(sheet, &headers, &formats.header, &mut widths)?;

        let mut row = 1u32;
        for summary in &report.hierarchy {
            let level_formats = match summary.level {
                SummaryLevel::Workspace => &formats.workspace,
                SummaryLevel::List => &formats.list,
                SummaryLevel::Task => &formats.task,
                SummaryLevel::Member => &formats.member,
                SummaryLevel::GrandTotal => &formats.grand,
            };

            let level_label = summary.level.to_string();
            let text_cells = [
                level_label.as_str(),
                summary.workspace.as_str(),
                summary.list.as_str(),
                summary.task.as_str(),
                summary.member.as_str(),
            ];
            for (col, value) in text_cells.iter().enumerate() {
                widths.observe(col as u16, value);
                sheet
                    .write_with_format(row, col as u16, *value, &level_formats.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }

            match summary.hours {
                Some(hours) => {
                    widths.observe(5, &format!("{hours}"));
                    sheet
                        .write_with_format(row, 5, hours.as_f64(), &level_formats.hours)
                        .map_err(|e| RenderError::Format(e.to_string()))?;
                }
                None => {
                    sheet
                        .write_with_format(row, 5, "", &level_formats.hours)
                        .map_err(|e| RenderError::Format(e.to_string()))?;
                }
            }

            match summary.entries {
                Some(entries) => {
                    widths.observe(6, &entries.to_string());
                    sheet
                        .write_with_format(row, 6, entries as f64, &level_formats.entries)
                        .map_err(|e| RenderError::Format(e.to_string()))?;
                }
                None => {
                    sheet
                        .write_with_format(row, 6, "", &level_formats.entries)
                        .map_err(|e| RenderError::Format(e.to_string()))?;
                }
            }

            row += 1;
        }

        widths.apply(sheet);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Add the User Summary sheet
    fn add_user_summary_sheet(
        &self,
        workbook: &mut Workbook,
        report: &TimeReport,
        formats: &TimeFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("User Summary")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = ["User", "Email", "Total Entries", "Total Hours"];
        let mut widths = ColumnWidths::new();
        write_headers(sheet, &headers, &formats.header, &mut widths)?;

        for (i, totals) in report.user_totals.iter().enumerate() {
            let row = (i + 1) as u32;
            widths.observe(0, &totals.username);
            widths.observe(1, &totals.email);
            widths.observe(3, &format!("{}", totals.hours));

            sheet
                .write_with_format(row, 0, &totals.username, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 1, &totals.email, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 2, totals.entries as f64, &formats.integer)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 3, totals.hours.as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        widths.apply(sheet);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Add the All Data sheet: every entry across every user
    fn add_all_data_sheet(
        &self,
        workbook: &mut Workbook,
        report: &TimeReport,
        formats: &TimeFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("All Data")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = [
            "Date", "Member", "Email", "Workspace", "List", "Task", "Description", "Hours", "Link",
        ];
        let mut widths = ColumnWidths::new();
        write_headers(sheet, &headers, &formats.header, &mut widths)?;

        let mut rows: Vec<(&TimeEntry, &User)> = report
            .users
            .iter()
            .flat_map(|fetched| fetched.entries.iter().map(move |e| (e, &fetched.user)))
            .collect();
        rows.sort_by(|(a, ua), (b, ub)| {
            (a.date(), ua.username.as_str()).cmp(&(b.date(), ub.username.as_str()))
        });

        for (i, (entry, user)) in rows.into_iter().enumerate() {
            let row = (i + 1) as u32;
            write_entry_row(sheet, row, entry, user, true, formats, &mut widths)?;
        }

        widths.apply(sheet);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Add one sheet per user. A user with no entries still gets a sheet
    /// so the fetch result stays visible in the workbook.
    fn add_user_sheets(
        &self,
        workbook: &mut Workbook,
        report: &TimeReport,
        formats: &TimeFormats,
    ) -> Result<(), RenderError> {
        for fetched in &report.users {
            let sheet = workbook.add_worksheet();
            sheet
                .set_name(safe_sheet_name(&fetched.user.username))
                .map_err(|e| RenderError::Format(e.to_string()))?;

            let headers = [
                "Date", "Member", "Workspace", "List", "Task", "Description", "Hours", "Link",
            ];
            let mut widths = ColumnWidths::new();
            write_headers(sheet, &headers, &formats.header, &mut widths)?;

            let mut entries: Vec<&TimeEntry> = fetched.entries.iter().collect();
            entries.sort_by_key(|e| e.start);

            for (i, entry) in entries.into_iter().enumerate() {
                let row = (i + 1) as u32;
                write_entry_row(sheet, row, entry, &fetched.user, false, formats, &mut widths)?;
            }

            widths.apply(sheet);
            sheet.set_freeze_panes(1, 0).ok();
        }
        Ok(())
    }
}

/// Write one entry row; `with_email` switches between the All Data layout
/// (9 columns) and the per-user layout (8 columns)
fn write_entry_row(
    sheet: &mut Worksheet,
    row: u32,
    entry: &TimeEntry,
    user: &User,
    with_email: bool,
    formats: &TimeFormats,
    widths: &mut ColumnWidths,
) -> Result<(), RenderError> {
    let date = entry.date_string();
    let mut cells: Vec<&str> = vec![date.as_str(), user.username.as_str()];
    if with_email {
        cells.push(user.email.as_str());
    }
    cells.extend([
        entry.workspace_name.as_str(),
        entry.list_name.as_str(),
        entry.task_name.as_str(),
        entry.description.as_str(),
    ]);

    let mut col = 0u16;
    for value in cells {
        widths.observe(col, value);
        sheet
            .write_with_format(row, col, value, &formats.text)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        col += 1;
    }

    widths.observe(col, &format!("{}", entry.hours));
    sheet
        .write_with_format(row, col, entry.hours.as_f64(), &formats.hours)
        .map_err(|e| RenderError::Format(e.to_string()))?;
    col += 1;

    write_link_cell(sheet, row, col, &entry.task_url, &formats.link, &formats.text, widths)
}

/// Formats for one summary level: the fill applied across the whole row
pub(crate) struct LevelFormats {
    text: Format,
    hours: Format,
    entries: Format,
}

impl LevelFormats {
    /// Build the three variants for one fill/font pairing
    fn colored(color: u32, font: u32, bold: bool) -> Self {
        let base = || {
            let f = Format::new()
                .set_background_color(color)
                .set_font_color(font)
                .set_border(FormatBorder::Thin);
            if bold {
                f.set_bold()
            } else {
                f
            }
        };
        Self {
            text: base().set_align(FormatAlign::Left),
            hours: base().set_align(FormatAlign::Right).set_num_format("0.00"),
            entries: base().set_align(FormatAlign::Right).set_num_format("#,##0"),
        }
    }

    /// Uncolored variant for member rows
    fn plain() -> Self {
        Self {
            text: Format::new().set_border(FormatBorder::Thin),
            hours: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("0.00"),
            entries: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("#,##0"),
        }
    }
}

/// Reusable formats for the time-report workbook
pub(crate) struct TimeFormats {
    header: Format,
    text: Format,
    hours: Format,
    integer: Format,
    link: Format,
    workspace: LevelFormats,
    list: LevelFormats,
    task: LevelFormats,
    member: LevelFormats,
    grand: LevelFormats,
}

impl TimeFormats {
    fn new() -> Self {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(HEADER_COLOR)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let hours = Format::new()
            .set_num_format("0.00")
            .set_border(FormatBorder::Thin);

        let integer = Format::new()
            .set_num_format("#,##0")
            .set_border(FormatBorder::Thin);

        let link = Format::new()
            .set_font_color(LINK_COLOR)
            .set_underline(FormatUnderline::Single)
            .set_border(FormatBorder::Thin);

        Self {
            header,
            text,
            hours,
            integer,
            link,
            workspace: LevelFormats::colored(WORKSPACE_COLOR, 0xFFFFFF, true),
            list: LevelFormats::colored(LIST_COLOR, 0xFFFFFF, true),
            // Task rows keep black text on the light fill
            task: LevelFormats::colored(TASK_COLOR, 0x000000, true),
            member: LevelFormats::plain(),
            grand: LevelFormats::colored(TOTAL_COLOR, 0xFFFFFF, true),
        }
    }
}

impl Renderer for TimeReportRenderer {
    type Input = TimeReport;
    type Output = Vec<u8>;

    fn render(&self, report: &TimeReport) -> Result<Vec<u8>, RenderError> {
        if report.users.is_empty() {
            return Err(RenderError::InvalidData("No data to export".into()));
        }
        self.render_to_bytes(report)
    }
}
