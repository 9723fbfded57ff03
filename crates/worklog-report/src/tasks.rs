//! Per-folder task summary with status buckets.

use std::collections::BTreeSet;
use worklog_core::{FolderSummaryRow, FolderTasks, Hours, TaskReport};

/// Coarse status classification used by the summary sheet.
///
/// Workspaces configure their own status labels; the buckets cover the
/// common ones and everything else lands in `Other` (counted in totals
/// but in no bucket column).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusBucket {
    Open,
    InProgress,
    Completed,
    Other,
}

/// Classify a status label, case-insensitively
pub fn status_bucket(status: &str) -> StatusBucket {
    match status.to_lowercase().as_str() {
        "open" | "to do" | "backlog" => StatusBucket::Open,
        "in progress" | "in development" => StatusBucket::InProgress,
        "complete" | "closed" => StatusBucket::Completed,
        _ => StatusBucket::Other,
    }
}

/// Build a complete task report from per-folder fetch results
pub fn build_task_report(folders: Vec<FolderTasks>) -> TaskReport {
    let summary = folder_summary(&folders);
    tracing::debug!(
        folders = folders.len(),
        tasks = folders.iter().map(|f| f.tasks.len()).sum::<usize>(),
        "built task report"
    );
    TaskReport { folders, summary }
}

/// One summary row per non-empty folder, plus a trailing GRAND TOTAL row.
///
/// Folder hours are converted from the millisecond sums once; the grand
/// total sums the already-rounded folder values.
pub fn folder_summary(folders: &[FolderTasks]) -> Vec<FolderSummaryRow> {
    let mut rows: Vec<FolderSummaryRow> = Vec::new();

    for fetched in folders {
        if fetched.tasks.is_empty() {
            continue;
        }

        let mut open = 0u32;
        let mut in_progress = 0u32;
        let mut completed = 0u32;
        let mut spent_ms = 0i64;
        let mut estimate_ms = 0i64;
        let mut points = 0i64;
        let mut lists = BTreeSet::new();

        for task in &fetched.tasks {
            match status_bucket(&task.status) {
                StatusBucket::Open => open += 1,
                StatusBucket::InProgress => in_progress += 1,
                StatusBucket::Completed => completed += 1,
                StatusBucket::Other => {}
            }
            spent_ms += task.time_spent_ms.max(0);
            estimate_ms += task.time_estimate_ms.max(0);
            points += task.points;
            lists.insert(task.list_name.as_str());
        }

        rows.push(FolderSummaryRow {
            folder: fetched.folder.name.clone(),
            total_tasks: fetched.tasks.len() as u32,
            open,
            in_progress,
            completed,
            hours_spent: Hours::from_millis(spent_ms),
            hours_estimated: Hours::from_millis(estimate_ms),
            points,
            lists: lists.len() as u32,
        });
    }

    if !rows.is_empty() {
        let grand = FolderSummaryRow {
            folder: "GRAND TOTAL".into(),
            total_tasks: rows.iter().map(|r| r.total_tasks).sum(),
            open: rows.iter().map(|r| r.open).sum(),
            in_progress: rows.iter().map(|r| r.in_progress).sum(),
            completed: rows.iter().map(|r| r.completed).sum(),
            hours_spent: rows.iter().map(|r| r.hours_spent).sum::<Hours>().rounded(),
            hours_estimated: rows
                .iter()
                .map(|r| r.hours_estimated)
                .sum::<Hours>()
                .rounded(),
            points: rows.iter().map(|r| r.points).sum(),
            lists: rows.iter().map(|r| r.lists).sum(),
        };
        rows.push(grand);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use worklog_core::{Folder, Task};

    fn task(name: &str, status: &str, list: &str, spent_ms: i64) -> Task {
        Task::new(name, name)
            .status(status)
            .list("l1", list)
            .time_spent(spent_ms)
    }

    #[test]
    fn buckets_match_case_insensitively() {
        assert_eq!(status_bucket("Open"), StatusBucket::Open);
        assert_eq!(status_bucket("TO DO"), StatusBucket::Open);
        assert_eq!(status_bucket("backlog"), StatusBucket::Open);
        assert_eq!(status_bucket("In Progress"), StatusBucket::InProgress);
        assert_eq!(status_bucket("in development"), StatusBucket::InProgress);
        assert_eq!(status_bucket("Complete"), StatusBucket::Completed);
        assert_eq!(status_bucket("CLOSED"), StatusBucket::Completed);
        assert_eq!(status_bucket("review"), StatusBucket::Other);
    }

    #[test]
    fn folder_summary_counts_and_buckets() {
        let folders = vec![FolderTasks::new(
            Folder::new("f1", "Platform"),
            vec![
                task("a", "open", "Backlog", 3_600_000),
                task("b", "in progress", "Sprint", 1_800_000),
                task("c", "closed", "Sprint", 0),
                task("d", "review", "Sprint", 0),
            ],
        )];

        let rows = folder_summary(&folders);
        assert_eq!(rows.len(), 2);

        let row = &rows[0];
        assert_eq!(row.folder, "Platform");
        assert_eq!(row.total_tasks, 4);
        assert_eq!(row.open, 1);
        assert_eq!(row.in_progress, 1);
        assert_eq!(row.completed, 1);
        assert_eq!(row.hours_spent.as_decimal(), dec!(1.50));
        assert_eq!(row.lists, 2);

        let grand = &rows[1];
        assert_eq!(grand.folder, "GRAND TOTAL");
        assert_eq!(grand.total_tasks, 4);
        assert_eq!(grand.hours_spent.as_decimal(), dec!(1.50));
    }

    #[test]
    fn empty_folders_are_skipped() {
        let folders = vec![
            FolderTasks::new(Folder::new("f1", "Empty"), Vec::new()),
            FolderTasks::failed(Folder::new("f2", "Broken"), "HTTP 500"),
        ];
        assert!(folder_summary(&folders).is_empty());
    }

    #[test]
    fn failed_folder_does_not_hide_others() {
        let folders = vec![
            FolderTasks::failed(Folder::new("f1", "Broken"), "HTTP 500"),
            FolderTasks::new(
                Folder::new("f2", "Platform"),
                vec![task("a", "open", "Backlog", 0)],
            ),
        ];

        let rows = folder_summary(&folders);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].folder, "Platform");
    }

    #[test]
    fn grand_total_sums_rounded_folder_hours() {
        // Each folder's hours round from ms once; the grand total sums
        // those rounded values
        let folders = vec![
            FolderTasks::new(
                Folder::new("f1", "A"),
                vec![task("a", "open", "L", 3_618_000)], // 1.005 h → 1.00
            ),
            FolderTasks::new(
                Folder::new("f2", "B"),
                vec![task("b", "open", "L", 3_618_000)],
            ),
        ];

        let rows = folder_summary(&folders);
        let grand = rows.last().unwrap();
        assert_eq!(grand.hours_spent.as_decimal(), dec!(2.00));
    }

    #[test]
    fn build_task_report_wires_everything() {
        let folders = vec![FolderTasks::new(
            Folder::new("f1", "Platform"),
            vec![task("a", "open", "L", 0)],
        )];

        let report = build_task_report(folders);
        assert_eq!(report.total_tasks(), 1);
        assert_eq!(report.summary.last().unwrap().folder, "GRAND TOTAL");
    }
}
