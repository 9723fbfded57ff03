//! Integration tests for the task-report workbook

use worklog_core::{Folder, FolderTasks, Renderer, Task};
use worklog_render::TaskReportRenderer;
use worklog_report::build_task_report;

fn task(id: &str, name: &str, status: &str, list: &str, spent_ms: i64) -> Task {
    let mut task = Task::new(id, name)
        .status(status)
        .list("l1", list)
        .time_spent(spent_ms)
        .time_estimate(7_200_000)
        .points(3);
    task.folder_name = "Platform".into();
    task.assignees = vec!["ada".into(), "bob".into()];
    task.url = format!("https://app.clickup.com/t/{id}");
    task.custom_fields.insert("Priority".into(), "High".into());
    task.custom_fields.insert("Team".into(), "Mobile".into());
    task
}

fn sample_report() -> worklog_core::TaskReport {
    build_task_report(vec![
        FolderTasks::new(
            Folder::new("f1", "Platform"),
            vec![
                task("t1", "Fix login flow", "in progress", "Sprint 12", 5_400_000),
                task("t2", "Code review", "open", "Sprint 12", 0),
                task("t3", "Retro notes", "closed", "Rituals", 1_800_000),
            ],
        ),
        FolderTasks::new(Folder::new("f2", "Empty folder"), Vec::new()),
    ])
}

#[test]
fn renders_a_valid_workbook() {
    let report = sample_report();
    let bytes = TaskReportRenderer::new().render(&report).unwrap();

    assert!(bytes.len() > 100);
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn empty_report_is_rejected() {
    let report = build_task_report(Vec::new());
    assert!(TaskReportRenderer::new().render(&report).is_err());
}

#[test]
fn renders_with_all_columns_disabled() {
    let report = sample_report();
    let renderer = TaskReportRenderer::new()
        .no_custom_fields()
        .no_time_tracking()
        .no_assignees()
        .no_dates();

    let bytes = renderer.render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn renders_without_time_tracking_sheet() {
    // With time tracking off the flat sheet is skipped entirely
    let report = sample_report();
    let bytes = TaskReportRenderer::new()
        .no_time_tracking()
        .render(&report)
        .unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn untracked_tasks_skip_the_time_tracking_sheet() {
    let report = build_task_report(vec![FolderTasks::new(
        Folder::new("f1", "Platform"),
        vec![Task::new("t1", "No tracking").status("open").list("l1", "L")],
    )]);

    let bytes = TaskReportRenderer::new().render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn folder_names_are_sanitized_for_sheets() {
    let report = build_task_report(vec![FolderTasks::new(
        Folder::new("f1", "Q3/Q4 planning: the roadmap that would not end"),
        vec![task("t1", "Fix login flow", "open", "Sprint 12", 0)],
    )]);

    let bytes = TaskReportRenderer::new().render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}
