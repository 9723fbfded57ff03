//! Task-report workbook renderer.
//!
//! Produces one workbook with:
//! - **Summary**: per-folder totals with status buckets and a GRAND TOTAL
//! - one tab per non-empty folder, tasks grouped under colored list header
//!   rows with per-list totals
//! - **Time Tracking**: every task carrying time or points, sorted by
//!   folder and descending tracked hours
//!
//! Column sets on the folder tabs are driven by the include toggles; the
//! custom-field columns are the sorted union of the folder's field names.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet};
use std::collections::{BTreeMap, BTreeSet};
use worklog_core::{FolderTasks, Hours, RenderError, Renderer, Task, TaskReport};

use crate::sheet::{safe_sheet_name, write_headers, write_link_cell, ColumnWidths};

/// Header fill for the task sheets
const TASK_HEADER_COLOR: u32 = 0x44_72_C4;
/// Fill for the per-list divider rows
const LIST_HEADER_COLOR: u32 = 0x70_AD_47;
/// Hyperlink font color
const LINK_COLOR: u32 = 0x00_00_FF;

/// Task-report workbook renderer with column toggles
#[derive(Clone, Debug)]
pub struct TaskReportRenderer {
    /// Include `CF:` columns for custom fields
    pub include_custom_fields: bool,
    /// Include hours spent/estimated and sprint points
    pub include_time_tracking: bool,
    /// Include the assignee column
    pub include_assignees: bool,
    /// Include due/start date columns
    pub include_dates: bool,
}

impl Default for TaskReportRenderer {
    fn default() -> Self {
        Self {
            include_custom_fields: true,
            include_time_tracking: true,
            include_assignees: true,
            include_dates: true,
        }
    }
}

impl TaskReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the custom-field columns
    pub fn no_custom_fields(mut self) -> Self {
        self.include_custom_fields = false;
        self
    }

    /// Drop time tracking columns and the Time Tracking sheet
    pub fn no_time_tracking(mut self) -> Self {
        self.include_time_tracking = false;
        self
    }

    /// Drop the assignee column
    pub fn no_assignees(mut self) -> Self {
        self.include_assignees = false;
        self
    }

    /// Drop the due/start date columns
    pub fn no_dates(mut self) -> Self {
        self.include_dates = false;
        self
    }

    /// Generate the workbook bytes
    pub fn render_to_bytes(&self, report: &TaskReport) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = TaskFormats::new();

        self.add_summary_sheet(&mut workbook, report, &formats)?;

        for fetched in &report.folders {
            if fetched.tasks.is_empty() {
                continue;
            }
            self.add_folder_sheet(&mut workbook, fetched, &formats)?;
        }

        if self.include_time_tracking {
            self.add_time_tracking_sheet(&mut workbook, report, &formats)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create workbook: {e}")))
    }

    /// Add the per-folder Summary sheet
    fn add_summary_sheet(
        &self,
        workbook: &mut Workbook,
        report: &TaskReport,
        formats: &TaskFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Summary")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = [
            "Folder",
            "Total Tasks",
            "Open Tasks",
            "In Progress",
            "Completed",
            "Hours Spent",
            "Hours Estimated",
            "Sprint Points",
            "Lists Count",
        ];
        let mut widths = ColumnWidths::new();
        write_headers(sheet, &headers, &formats.header, &mut widths)?;

        for (i, row) in report.summary.iter().enumerate() {
            let r = (i + 1) as u32;
            widths.observe(0, &row.folder);

            sheet
                .write_with_format(r, 0, &row.folder, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            let counts = [
                (1u16, row.total_tasks),
                (2, row.open),
                (3, row.in_progress),
                (4, row.completed),
            ];
            for (col, value) in counts {
                sheet
                    .write_with_format(r, col, value as f64, &formats.integer)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
            sheet
                .write_with_format(r, 5, row.hours_spent.as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(r, 6, row.hours_estimated.as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(r, 7, row.points as f64, &formats.integer)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(r, 8, row.lists as f64, &formats.integer)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        widths.apply(sheet);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Add one folder tab: tasks grouped by list with divider rows
    fn add_folder_sheet(
        &self,
        workbook: &mut Workbook,
        fetched: &FolderTasks,
        formats: &TaskFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(safe_sheet_name(&fetched.folder.name))
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let layout = self.folder_layout(&fetched.tasks);
        let mut widths = ColumnWidths::new();
        let header_refs: Vec<&str> = layout.headers.iter().map(String::as_str).collect();
        write_headers(sheet, &header_refs, &formats.header, &mut widths)?;

        // Group by list, sorted by list name
        let mut by_list: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
        for task in &fetched.tasks {
            by_list.entry(task.list_name.as_str()).or_default().push(task);
        }

        let folder_hours: Hours = fetched
            .tasks
            .iter()
            .map(|t| t.hours_spent())
            .sum::<Hours>()
            .rounded();
        let folder_points: i64 = fetched.tasks.iter().map(|t| t.points).sum();

        let mut row = 1u32;

        // Folder total line first, followed by a spacer row
        if self.include_time_tracking && (!folder_hours.is_zero() || folder_points > 0) {
            let mut label = format!("FOLDER TOTAL: {folder_hours}h");
            if folder_points > 0 {
                label.push_str(&format!(" | {folder_points}pts"));
            }
            widths.observe(layout.list_col, &label);
            sheet
                .write_with_format(row, layout.list_col, &label, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            if let Some(col) = layout.hours_col {
                sheet
                    .write_with_format(row, col, format!("{folder_hours}h").as_str(), &formats.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
            if let (Some(col), true) = (layout.points_col, folder_points > 0) {
                sheet
                    .write_with_format(row, col, format!("{folder_points}pts").as_str(), &formats.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
            row += 2;
        }

        let list_count = by_list.len();
        for (i, (list_name, tasks)) in by_list.iter().enumerate() {
            row = self.write_list_block(sheet, row, list_name, tasks, &layout, formats, &mut widths)?;
            // Spacer between lists, none after the last
            if i + 1 < list_count {
                row += 1;
            }
        }

        widths.apply(sheet);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Write one list divider row and its task rows; returns the next row
    fn write_list_block(
        &self,
        sheet: &mut Worksheet,
        mut row: u32,
        list_name: &str,
        tasks: &[&Task],
        layout: &FolderLayout,
        formats: &TaskFormats,
        widths: &mut ColumnWidths,
    ) -> Result<u32, RenderError> {
        let list_hours: Hours = tasks.iter().map(|t| t.hours_spent()).sum::<Hours>().rounded();
        let list_points: i64 = tasks.iter().map(|t| t.points).sum();

        let mut divider = format!("=== {list_name} ({} tasks", tasks.len());
        if self.include_time_tracking && (!list_hours.is_zero() || list_points > 0) {
            divider.push_str(&format!(" | {list_hours}h"));
            if list_points > 0 {
                divider.push_str(&format!(" | {list_points}pts"));
            }
        }
        divider.push_str(") ===");

        // Fill the whole divider row so the band is continuous
        for col in 0..layout.headers.len() as u16 {
            sheet
                .write_with_format(row, col, "", &formats.list_header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        widths.observe(layout.list_col, &divider);
        sheet
            .write_with_format(row, layout.list_col, &divider, &formats.list_header)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        if let Some(col) = layout.hours_col {
            sheet
                .write_with_format(row, col, format!("Total: {list_hours}h").as_str(), &formats.list_header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        if let (Some(col), true) = (layout.points_col, list_points > 0) {
            sheet
                .write_with_format(row, col, format!("Total: {list_points}pts").as_str(), &formats.list_header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        row += 1;

        for task in tasks {
            self.write_task_row(sheet, row, task, layout, formats, widths)?;
            row += 1;
        }

        Ok(row)
    }

    /// Write one task row according to the folder layout
    fn write_task_row(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        task: &Task,
        layout: &FolderLayout,
        formats: &TaskFormats,
        widths: &mut ColumnWidths,
    ) -> Result<(), RenderError> {
        let mut col = 0u16;
        let write_text = |sheet: &mut Worksheet,
                              col: &mut u16,
                              value: &str,
                              widths: &mut ColumnWidths|
         -> Result<(), RenderError> {
            widths.observe(*col, value);
            sheet
                .write_with_format(row, *col, value, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            *col += 1;
            Ok(())
        };

        write_text(sheet, &mut col, &task.id, widths)?;
        write_text(sheet, &mut col, &task.list_name, widths)?;
        write_text(sheet, &mut col, &task.name, widths)?;
        write_text(sheet, &mut col, &task.status, widths)?;
        write_text(sheet, &mut col, &task.description, widths)?;

        if self.include_assignees {
            write_text(sheet, &mut col, &task.assignees.join(", "), widths)?;
        }

        if self.include_dates {
            let due = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            write_text(sheet, &mut col, &due, widths)?;
            let start = task
                .start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            write_text(sheet, &mut col, &start, widths)?;
        }

        if self.include_time_tracking {
            sheet
                .write_with_format(row, col, task.hours_spent().as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            col += 1;
            sheet
                .write_with_format(row, col, task.hours_estimated().as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            col += 1;
            sheet
                .write_with_format(row, col, task.points as f64, &formats.integer)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            col += 1;
        }

        if self.include_custom_fields {
            for field in &layout.custom_fields {
                let value = task
                    .custom_fields
                    .get(field)
                    .map(String::as_str)
                    .unwrap_or("");
                write_text(sheet, &mut col, value, widths)?;
            }
        }

        write_link_cell(sheet, row, col, &task.url, &formats.link, &formats.text, widths)
    }

    /// Add the flat Time Tracking sheet
    fn add_time_tracking_sheet(
        &self,
        workbook: &mut Workbook,
        report: &TaskReport,
        formats: &TaskFormats,
    ) -> Result<(), RenderError> {
        let mut tracked: Vec<&Task> = report
            .folders
            .iter()
            .flat_map(|f| f.tasks.iter())
            .filter(|t| t.has_tracking())
            .collect();
        if tracked.is_empty() {
            return Ok(());
        }
        tracked.sort_by(|a, b| {
            a.folder_name
                .cmp(&b.folder_name)
                .then_with(|| b.hours_spent().cmp(&a.hours_spent()))
        });

        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Time Tracking")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let headers = [
            "Folder",
            "List",
            "Task",
            "Assignees",
            "Status",
            "Hours Spent",
            "Hours Estimated",
            "Sprint Points",
            "Task URL",
        ];
        let mut widths = ColumnWidths::new();
        write_headers(sheet, &headers, &formats.header, &mut widths)?;

        for (i, task) in tracked.iter().enumerate() {
            let row = (i + 1) as u32;
            let assignees = task.assignees.join(", ");
            let text_cells = [
                (0u16, task.folder_name.as_str()),
                (1, task.list_name.as_str()),
                (2, task.name.as_str()),
                (3, assignees.as_str()),
                (4, task.status.as_str()),
            ];
            for (col, value) in text_cells {
                widths.observe(col, value);
                sheet
                    .write_with_format(row, col, value, &formats.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
            sheet
                .write_with_format(row, 5, task.hours_spent().as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 6, task.hours_estimated().as_f64(), &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(row, 7, task.points as f64, &formats.integer)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            write_link_cell(sheet, row, 8, &task.url, &formats.link, &formats.text, &mut widths)?;
        }

        widths.apply(sheet);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }

    /// Compute the column layout for one folder's tab
    fn folder_layout(&self, tasks: &[Task]) -> FolderLayout {
        let mut headers: Vec<String> = vec![
            "Task ID".into(),
            "List".into(),
            "Task Name".into(),
            "Status".into(),
            "Description".into(),
        ];

        if self.include_assignees {
            headers.push("Assignees".into());
        }
        if self.include_dates {
            headers.push("Due Date".into());
            headers.push("Start Date".into());
        }

        let mut hours_col = None;
        let mut points_col = None;
        if self.include_time_tracking {
            hours_col = Some(headers.len() as u16);
            headers.push("Hours Spent".into());
            headers.push("Hours Estimated".into());
            points_col = Some(headers.len() as u16);
            headers.push("Sprint Points".into());
        }

        let mut custom_fields: Vec<String> = Vec::new();
        if self.include_custom_fields {
            let names: BTreeSet<&str> = tasks
                .iter()
                .flat_map(|t| t.custom_fields.keys().map(String::as_str))
                .collect();
            for name in names {
                headers.push(format!("CF: {name}"));
                custom_fields.push(name.to_string());
            }
        }

        headers.push("Task URL".into());

        FolderLayout {
            headers,
            custom_fields,
            list_col: 1,
            hours_col,
            points_col,
        }
    }
}

/// Column layout of one folder tab
struct FolderLayout {
    headers: Vec<String>,
    /// Custom field names in column order
    custom_fields: Vec<String>,
    /// Column the list dividers write into
    list_col: u16,
    hours_col: Option<u16>,
    points_col: Option<u16>,
}

/// Reusable formats for the task-report workbook
struct TaskFormats {
    header: Format,
    list_header: Format,
    text: Format,
    hours: Format,
    integer: Format,
    link: Format,
}

impl TaskFormats {
    fn new() -> Self {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(TASK_HEADER_COLOR)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let list_header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Left)
            .set_background_color(LIST_HEADER_COLOR)
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
            list_header,
            text,
            hours,
            integer,
            link,
        }
    }
}

impl Renderer for TaskReportRenderer {
    type Input = TaskReport;
    type Output = Vec<u8>;

    fn render(&self, report: &TaskReport) -> Result<Vec<u8>, RenderError> {
        if report.folders.is_empty() {
            return Err(RenderError::InvalidData("No task data to export".into()));
        }
        self.render_to_bytes(report)
    }
}
