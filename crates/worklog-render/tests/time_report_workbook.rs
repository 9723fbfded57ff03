//! Integration tests for the time-report workbook

use worklog_core::{Hours, Renderer, TimeEntry, User, UserEntries};
use worklog_render::TimeReportRenderer;
use worklog_report::build_time_report;

fn entry(workspace: &str, list: &str, task: &str, millis: i64) -> TimeEntry {
    TimeEntry::new("e", 1_706_002_400_000, Hours::from_millis(millis))
        .workspace(workspace)
        .list(list)
        .task(task)
        .description("pairing session")
        .url("https://app.clickup.com/t/abc123")
}

fn sample_report() -> worklog_core::TimeReport {
    build_time_report(vec![
        UserEntries::new(
            User::new("1", "ada").email("ada@example.com"),
            vec![
                entry("Product", "Sprint 12", "Fix login flow", 5_400_000),
                entry("Product", "Sprint 12", "Code review", 1_800_000),
                entry("Internal", "Ops", "Standup", 900_000),
            ],
        ),
        UserEntries::new(
            User::new("2", "bob"),
            vec![entry("Product", "Sprint 12", "Fix login flow", 3_600_000)],
        ),
    ])
}

#[test]
fn renders_a_valid_workbook() {
    let report = sample_report();
    let bytes = TimeReportRenderer::new().render(&report).unwrap();

    // XLSX files start with the PK zip signature
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn empty_report_is_rejected() {
    let report = build_time_report(Vec::new());
    let result = TimeReportRenderer::new().render(&report);
    assert!(result.is_err());
}

#[test]
fn user_without_entries_still_gets_a_sheet() {
    let report = build_time_report(vec![
        UserEntries::new(
            User::new("1", "ada"),
            vec![entry("Product", "Sprint 12", "Fix login flow", 3_600_000)],
        ),
        UserEntries::new(User::new("2", "idle-user"), Vec::new()),
    ]);

    let bytes = TimeReportRenderer::new().render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn failed_fetch_renders_as_empty_user() {
    let report = build_time_report(vec![
        UserEntries::failed(User::new("1", "ada"), "HTTP 502"),
        UserEntries::new(
            User::new("2", "bob"),
            vec![entry("Product", "Sprint 12", "Fix login flow", 3_600_000)],
        ),
    ]);

    let bytes = TimeReportRenderer::new().render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn awkward_usernames_become_valid_sheet_names() {
    // Slashes and length both violate sheet naming rules
    let report = build_time_report(vec![UserEntries::new(
        User::new("1", "consultants/external: very long team alias"),
        vec![entry("Product", "Sprint 12", "Fix login flow", 3_600_000)],
    )]);

    let bytes = TimeReportRenderer::new().render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn entries_without_urls_render() {
    let no_url = TimeEntry::new("e", 1_706_002_400_000, Hours::from_millis(600_000))
        .workspace("Product")
        .list("Sprint 12")
        .task("Untracked work");
    let report = build_time_report(vec![UserEntries::new(User::new("1", "ada"), vec![no_url])]);

    let bytes = TimeReportRenderer::new().render(&report).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}
