//! Hierarchical time summary and per-user totals.
//!
//! The summary is a depth-first walk of a four-level grouping with keys
//! sorted lexicographically at every level. Each group header row is
//! emitted before its children and already carries the subtree totals:
//! totals are accumulated on the way back up the traversal, not patched
//! into previously emitted rows.
//!
//! Rounding is observable and deliberate: entry hours are rounded to two
//! decimals at ingestion, and every level's total is the rounded sum of
//! its children's already-rounded values. A single final rounding of the
//! raw sum would produce different output.

use std::collections::BTreeMap;
use worklog_core::{Hours, SummaryLevel, SummaryRow, TimeReport, UserEntries, UserTotalsRow};

/// Per-member accumulator: hours and entry count
type MemberBucket = (Hours, u32);

/// workspace → list → task → member grouping.
///
/// `BTreeMap` keys give the lexicographic iteration order the summary
/// requires at every level.
type Grouping<'a> =
    BTreeMap<&'a str, BTreeMap<&'a str, BTreeMap<&'a str, BTreeMap<&'a str, MemberBucket>>>>;

/// Build a complete time report from per-user fetch results
pub fn build_time_report(users: Vec<UserEntries>) -> TimeReport {
    let hierarchy = hierarchical_summary(&users);
    let user_totals = user_summary(&users);
    tracing::debug!(
        users = users.len(),
        entries = users.iter().map(|u| u.entries.len()).sum::<usize>(),
        rows = hierarchy.len(),
        "built time report"
    );
    TimeReport {
        users,
        hierarchy,
        user_totals,
    }
}

/// Produce the ordered hierarchical summary rows.
///
/// Users whose fetch failed contribute no entries but are still counted
/// as processed; the trailing GRAND TOTAL row counts every fetched entry.
pub fn hierarchical_summary(users: &[UserEntries]) -> Vec<SummaryRow> {
    let mut groups: Grouping = BTreeMap::new();
    for fetched in users {
        for entry in &fetched.entries {
            let bucket = groups
                .entry(entry.workspace_name.as_str())
                .or_default()
                .entry(entry.list_name.as_str())
                .or_default()
                .entry(entry.task_name.as_str())
                .or_default()
                .entry(fetched.user.username.as_str())
                .or_default();
            bucket.0 += entry.hours;
            bucket.1 += 1;
        }
    }

    let mut rows = Vec::new();
    let mut grand_hours = Hours::zero();
    for (workspace, lists) in &groups {
        grand_hours += emit_workspace(workspace, lists, &mut rows);
    }

    let total_entries: u32 = users.iter().map(|u| u.entries.len() as u32).sum();
    rows.push(SummaryRow {
        level: SummaryLevel::GrandTotal,
        workspace: String::new(),
        list: String::new(),
        task: String::new(),
        member: String::new(),
        hours: Some(grand_hours.rounded()),
        entries: Some(total_entries),
    });

    rows
}

/// Emit one workspace subtree; returns the workspace hours
fn emit_workspace(
    workspace: &str,
    lists: &BTreeMap<&str, BTreeMap<&str, BTreeMap<&str, MemberBucket>>>,
    rows: &mut Vec<SummaryRow>,
) -> Hours {
    let mut children = Vec::new();
    let mut hours = Hours::zero();
    for (list, tasks) in lists {
        hours += emit_list(workspace, list, tasks, &mut children);
    }

    rows.push(SummaryRow {
        level: SummaryLevel::Workspace,
        workspace: workspace.to_string(),
        list: String::new(),
        task: String::new(),
        member: String::new(),
        hours: Some(hours.rounded()),
        entries: None,
    });
    rows.extend(children);
    hours
}

/// Emit one list subtree; returns the list hours
fn emit_list(
    workspace: &str,
    list: &str,
    tasks: &BTreeMap<&str, BTreeMap<&str, MemberBucket>>,
    rows: &mut Vec<SummaryRow>,
) -> Hours {
    let mut children = Vec::new();
    let mut hours = Hours::zero();
    for (task, members) in tasks {
        hours += emit_task(workspace, list, task, members, &mut children);
    }

    rows.push(SummaryRow {
        level: SummaryLevel::List,
        workspace: workspace.to_string(),
        list: list.to_string(),
        task: String::new(),
        member: String::new(),
        hours: Some(hours.rounded()),
        entries: None,
    });
    rows.extend(children);
    hours
}

/// Emit one task subtree; returns the task hours
fn emit_task(
    workspace: &str,
    list: &str,
    task: &str,
    members: &BTreeMap<&str, MemberBucket>,
    rows: &mut Vec<SummaryRow>,
) -> Hours {
    let mut hours = Hours::zero();
    let mut entries = 0u32;
    let mut children = Vec::with_capacity(members.len());
    for (member, (member_hours, member_entries)) in members {
        children.push(SummaryRow {
            level: SummaryLevel::Member,
            workspace: workspace.to_string(),
            list: list.to_string(),
            task: task.to_string(),
            member: member.to_string(),
            hours: Some(member_hours.rounded()),
            entries: Some(*member_entries),
        });
        hours += *member_hours;
        entries += member_entries;
    }

    rows.push(SummaryRow {
        level: SummaryLevel::Task,
        workspace: workspace.to_string(),
        list: list.to_string(),
        task: task.to_string(),
        member: String::new(),
        hours: Some(hours.rounded()),
        entries: Some(entries),
    });
    rows.extend(children);
    hours
}

/// One totals row per user in selection order, plus a trailing TOTAL row.
///
/// A user with zero entries still produces a row; this is how failed
/// fetches stay visible in the output.
pub fn user_summary(users: &[UserEntries]) -> Vec<UserTotalsRow> {
    let mut rows = Vec::with_capacity(users.len() + 1);
    let mut total_entries = 0u32;
    let mut total_hours = Hours::zero();

    for fetched in users {
        let hours = fetched.total_hours();
        let entries = fetched.entries.len() as u32;
        rows.push(UserTotalsRow {
            username: fetched.user.username.clone(),
            email: fetched.user.email.clone(),
            entries,
            hours,
        });
        total_entries += entries;
        total_hours += hours;
    }

    rows.push(UserTotalsRow {
        username: "TOTAL".into(),
        email: String::new(),
        entries: total_entries,
        hours: total_hours.rounded(),
    });

    rows
}
