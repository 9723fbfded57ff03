//! Command implementations: listing, fetch loops and report export.
//!
//! The fetch loops mirror the interactive tool they replaced: progress is
//! printed per item, a per-item failure is logged and contributes an empty
//! result, and the loop always runs to completion over the selection.

use anyhow::{bail, Context, Result};
use chrono::{Days, Local, NaiveDate};
use std::path::Path;
use worklog_client::ClickUpClient;
use worklog_core::{Folder, FolderTasks, Hours, Renderer, User, UserEntries, Workspace};
use worklog_render::{TaskReportRenderer, TimeReportRenderer};
use worklog_report::{build_task_report, build_time_report};

/// Default report range when no dates are given
const DEFAULT_RANGE_DAYS: u64 = 7;

/// Verify the token by listing workspaces
pub fn check(client: &ClickUpClient) -> Result<()> {
    let workspaces = client
        .workspaces()
        .context("connection test failed")?;
    println!(
        "Connected successfully ({} workspace{} visible)",
        workspaces.len(),
        if workspaces.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// List workspaces and their members
pub fn workspaces(client: &ClickUpClient) -> Result<()> {
    let workspaces = client.workspaces()?;
    if workspaces.is_empty() {
        println!("No workspaces visible to this token");
        return Ok(());
    }
    for workspace in &workspaces {
        println!("{}", workspace.display_name());
        for member in &workspace.members {
            println!("  {} [{}]", member.display_name(), member.id);
        }
    }
    Ok(())
}

/// List the spaces of a workspace
pub fn spaces(client: &ClickUpClient, workspace_id: &str) -> Result<()> {
    let spaces = client.spaces(workspace_id)?;
    if spaces.is_empty() {
        println!("No spaces in workspace {workspace_id}");
        return Ok(());
    }
    for space in &spaces {
        println!("{}", space.display_name());
    }
    Ok(())
}

/// List the folders of a space with list/task counts.
///
/// Counting walks every list in every folder, so this is as slow as the
/// API; a folder whose count fails is shown with zeros.
pub fn folders(client: &ClickUpClient, space_id: &str) -> Result<()> {
    let mut folders = client.folders(space_id)?;
    if folders.is_empty() {
        println!("No folders in space {space_id}");
        return Ok(());
    }

    let total = folders.len();
    for (i, folder) in folders.iter_mut().enumerate() {
        println!("[{}/{}] Counting tasks in {}...", i + 1, total, folder.name);
        match client.folder_tasks(folder) {
            Ok(tasks) => {
                let lists: std::collections::BTreeSet<&str> =
                    tasks.iter().map(|t| t.list_name.as_str()).collect();
                folder.lists_count = lists.len() as u32;
                folder.tasks_count = tasks.len() as u32;
            }
            Err(err) => {
                tracing::warn!(folder = %folder.name, error = %err, "could not count tasks");
            }
        }
    }

    for folder in &folders {
        println!(
            "{} [{}]: {} lists, {} tasks",
            folder.name, folder.id, folder.lists_count, folder.tasks_count
        );
    }
    Ok(())
}

/// Arguments for the time-report command
pub struct TimeReportArgs {
    pub workspace: String,
    /// Selected user ids; empty means every member
    pub users: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub output: std::path::PathBuf,
}

/// Fetch time entries for the selected members and export the workbook
pub fn time_report(client: &ClickUpClient, args: TimeReportArgs) -> Result<()> {
    let (from, to) = resolve_date_range(args.from, args.to)?;

    let workspace = find_workspace(client, &args.workspace)?;
    let selected = select_users(&workspace, &args.users)?;
    if selected.is_empty() {
        bail!("workspace '{}' has no members to report on", workspace.name);
    }

    println!(
        "Fetching time entries for {} user{} ({from} to {to})...",
        selected.len(),
        if selected.len() == 1 { "" } else { "s" }
    );

    let total = selected.len();
    let mut results: Vec<UserEntries> = Vec::with_capacity(total);
    for (i, user) in selected.into_iter().enumerate() {
        println!("[{}/{}] Fetching entries for {}...", i + 1, total, user.username);
        match client.time_entries(&workspace.id, &user.id, from, to) {
            Ok(entries) => {
                let hours: Hours = entries.iter().map(|e| e.hours).sum::<Hours>().rounded();
                println!("  ✓ {}: {} entries, {} hours", user.username, entries.len(), hours);
                results.push(UserEntries::new(user, entries));
            }
            Err(err) => {
                tracing::warn!(user = %user.username, error = %err, "time entry fetch failed");
                println!("  ✗ {}: {}", user.username, err);
                results.push(UserEntries::failed(user, err.to_string()));
            }
        }
    }

    let report = build_time_report(results);
    let total_hours: Hours = report
        .users
        .iter()
        .map(UserEntries::total_hours)
        .sum::<Hours>()
        .rounded();
    println!("=== SUMMARY ===");
    println!("Users processed: {}", report.users.len());
    println!("Total entries: {}", report.total_entries());
    println!("Total hours: {total_hours}");

    let bytes = TimeReportRenderer::new()
        .render(&report)
        .context("failed to render workbook")?;
    write_output(&args.output, &bytes)?;
    println!("Report written to {}", args.output.display());
    Ok(())
}

/// Arguments for the task-report command
pub struct TaskReportArgs {
    pub space: String,
    /// Selected folder ids; empty means every folder
    pub folders: Vec<String>,
    pub no_custom_fields: bool,
    pub no_time_tracking: bool,
    pub no_assignees: bool,
    pub no_dates: bool,
    pub output: std::path::PathBuf,
}

/// Fetch folder tasks and export the task workbook
pub fn task_report(client: &ClickUpClient, args: TaskReportArgs) -> Result<()> {
    let all_folders = client.folders(&args.space)?;
    let selected = select_folders(all_folders, &args.folders)?;
    if selected.is_empty() {
        bail!("space {} has no folders to report on", args.space);
    }

    println!(
        "Fetching tasks from {} folder{}...",
        selected.len(),
        if selected.len() == 1 { "" } else { "s" }
    );

    let total = selected.len();
    let mut results: Vec<FolderTasks> = Vec::with_capacity(total);
    for (i, folder) in selected.into_iter().enumerate() {
        println!("[{}/{}] Fetching tasks from {}...", i + 1, total, folder.name);
        match client.folder_tasks(&folder) {
            Ok(tasks) => {
                println!("  ✓ {}: {} tasks", folder.name, tasks.len());
                results.push(FolderTasks::new(folder, tasks));
            }
            Err(err) => {
                tracing::warn!(folder = %folder.name, error = %err, "task fetch failed");
                println!("  ✗ {}: {}", folder.name, err);
                results.push(FolderTasks::failed(folder, err.to_string()));
            }
        }
    }

    let report = build_task_report(results);
    println!("Fetched {} tasks total", report.total_tasks());

    let mut renderer = TaskReportRenderer::new();
    if args.no_custom_fields {
        renderer = renderer.no_custom_fields();
    }
    if args.no_time_tracking {
        renderer = renderer.no_time_tracking();
    }
    if args.no_assignees {
        renderer = renderer.no_assignees();
    }
    if args.no_dates {
        renderer = renderer.no_dates();
    }

    let bytes = renderer.render(&report).context("failed to render workbook")?;
    write_output(&args.output, &bytes)?;
    println!("Report written to {}", args.output.display());
    Ok(())
}

/// Resolve the report range: explicit bounds win, otherwise the last 7
/// days ending today. Rejects an inverted range up front.
fn resolve_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(NaiveDate, NaiveDate)> {
    let today = Local::now().date_naive();
    let to = to.unwrap_or(today);
    let from = from.unwrap_or_else(|| {
        to.checked_sub_days(Days::new(DEFAULT_RANGE_DAYS)).unwrap_or(to)
    });
    if from > to {
        bail!("invalid date range: {from} is after {to}");
    }
    Ok((from, to))
}

/// Look a workspace up by id
fn find_workspace(client: &ClickUpClient, workspace_id: &str) -> Result<Workspace> {
    let workspaces = client.workspaces()?;
    workspaces
        .into_iter()
        .find(|w| w.id == workspace_id)
        .with_context(|| format!("workspace {workspace_id} not found (try `worklog workspaces`)"))
}

/// Resolve the selected user ids against the workspace members; an empty
/// selection means everyone
fn select_users(workspace: &Workspace, ids: &[String]) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(workspace.members.clone());
    }
    let mut selected = Vec::with_capacity(ids.len());
    for id in ids {
        let member = workspace
            .member_by_id(id)
            .with_context(|| format!("user {id} is not a member of '{}'", workspace.name))?;
        selected.push(member.clone());
    }
    Ok(selected)
}

/// Resolve the selected folder ids; an empty selection means every folder
fn select_folders(all: Vec<Folder>, ids: &[String]) -> Result<Vec<Folder>> {
    if ids.is_empty() {
        return Ok(all);
    }
    let mut selected = Vec::with_capacity(ids.len());
    for id in ids {
        let folder = all
            .iter()
            .find(|f| &f.id == id)
            .with_context(|| format!("folder {id} not found in this space"))?;
        selected.push(folder.clone());
    }
    Ok(selected)
}

/// Write the rendered workbook; the file is only created once rendering
/// has already succeeded
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write {}", path.display()))
}
