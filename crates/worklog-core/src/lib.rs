//! # worklog-core
//!
//! Core domain model and traits for the worklog reporting toolkit.
//!
//! This crate provides:
//! - Domain types: `Workspace`, `User`, `Space`, `Folder`, `Task`, `TimeEntry`
//! - Report types: `TimeReport`, `TaskReport` and their row records
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use worklog_core::{Hours, TimeEntry, User, UserEntries};
//!
//! let user = User::new("81492", "ada").email("ada@example.com");
//! let entry = TimeEntry::new("e1", 1_706_000_000_000, Hours::from_millis(5_400_000))
//!     .workspace("Engineering")
//!     .list("Sprint 12")
//!     .task("Fix login flow");
//! let fetched = UserEntries::new(user, vec![entry]);
//! assert_eq!(fetched.total_hours(), Hours::from_millis(5_400_000));
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a workspace/team
pub type WorkspaceId = String;

/// Unique identifier for a user
pub type UserId = String;

/// Unique identifier for a space
pub type SpaceId = String;

/// Unique identifier for a folder
pub type FolderId = String;

/// Unique identifier for a list
pub type ListId = String;

/// Unique identifier for a task
pub type TaskId = String;

/// Milliseconds per hour, the unit the API reports durations in
const MILLIS_PER_HOUR: i64 = 1000 * 60 * 60;

// ============================================================================
// Hours
// ============================================================================

/// An hour quantity carried at 2-decimal precision.
///
/// Every duration that leaves the API layer is converted to `Hours` exactly
/// once; report totals are sums of these already-rounded values, rounded
/// again at each aggregation level. Rounding is midpoint-nearest-even,
/// so `1.005` rounds to `1.00` and `1.015` to `1.02`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hours(Decimal);

impl Hours {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Round an arbitrary decimal to a 2-decimal hour quantity
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
    }

    /// Convert a millisecond duration to hours.
    ///
    /// Running timers report a negative duration; those count as zero.
    pub fn from_millis(millis: i64) -> Self {
        let millis = millis.max(0);
        Self::new(Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Lossy conversion for spreadsheet cells
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Re-round after accumulation (2 decimals, half-even)
    pub fn rounded(&self) -> Self {
        Self::new(self.0)
    }
}

impl std::ops::Add for Hours {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Hours {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Hours {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, h| acc + h)
    }
}

impl std::fmt::Display for Hours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

// ============================================================================
// User / Workspace
// ============================================================================

/// A member of a workspace
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Login/display handle
    pub username: String,
    /// Email address (may be empty)
    pub email: String,
}

impl User {
    /// Create a new user with an empty email
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: String::new(),
        }
    }

    /// Set the email address
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Label used in listings: `"username (email)"`, or the bare
    /// username when no email is known
    pub fn display_name(&self) -> String {
        if self.email.is_empty() {
            self.username.clone()
        } else {
            format!("{} ({})", self.username, self.email)
        }
    }
}

/// A top-level workspace/team in the task API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier
    pub id: WorkspaceId,
    /// Human-readable name
    pub name: String,
    /// Workspace members
    pub members: Vec<User>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Label used in listings
    pub fn display_name(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }

    /// Find a member by username
    pub fn member_by_username(&self, username: &str) -> Option<&User> {
        self.members.iter().find(|m| m.username == username)
    }

    /// Find a member by user id
    pub fn member_by_id(&self, id: &str) -> Option<&User> {
        self.members.iter().find(|m| m.id == id)
    }
}

// ============================================================================
// Containers: Space / Folder / List
// ============================================================================

/// A space inside a workspace
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    /// Workspace this space belongs to
    pub workspace_id: WorkspaceId,
}

impl Space {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            workspace_id: workspace_id.into(),
        }
    }

    /// Label used in listings
    pub fn display_name(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}

/// A folder of lists inside a space
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Number of lists, filled in once tasks have been counted
    pub lists_count: u32,
    /// Number of tasks, filled in once tasks have been counted
    pub tasks_count: u32,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lists_count: 0,
            tasks_count: 0,
        }
    }
}

/// A list of tasks inside a folder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskList {
    pub id: ListId,
    pub name: String,
}

impl TaskList {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// A task fetched from a list.
///
/// Time fields are kept in the API's millisecond unit; hour values are
/// always derived, never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Task title
    pub name: String,
    /// Status label as configured in the workspace (e.g. "in progress")
    pub status: String,
    /// Description, cleaned for spreadsheet cells
    pub description: String,
    /// Containing list
    pub list_id: ListId,
    pub list_name: String,
    /// Containing folder, filled in by the fetch loop
    pub folder_id: FolderId,
    pub folder_name: String,
    /// Usernames of assignees
    pub assignees: Vec<String>,
    /// Due date, if set
    pub due_date: Option<NaiveDate>,
    /// Start date, if set
    pub start_date: Option<NaiveDate>,
    /// Tracked time in milliseconds
    pub time_spent_ms: i64,
    /// Estimated time in milliseconds
    pub time_estimate_ms: i64,
    /// Sprint points
    pub points: i64,
    /// Custom field values flattened to strings, keyed by field name
    pub custom_fields: BTreeMap<String, String>,
    /// Deep link into the task UI
    pub url: String,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: String::new(),
            description: String::new(),
            list_id: String::new(),
            list_name: String::new(),
            folder_id: String::new(),
            folder_name: String::new(),
            assignees: Vec::new(),
            due_date: None,
            start_date: None,
            time_spent_ms: 0,
            time_estimate_ms: 0,
            points: 0,
            custom_fields: BTreeMap::new(),
            url: String::new(),
        }
    }

    /// Set the status label
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Set the containing list
    pub fn list(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.list_id = id.into();
        self.list_name = name.into();
        self
    }

    /// Set the tracked time in milliseconds
    pub fn time_spent(mut self, millis: i64) -> Self {
        self.time_spent_ms = millis;
        self
    }

    /// Set the estimated time in milliseconds
    pub fn time_estimate(mut self, millis: i64) -> Self {
        self.time_estimate_ms = millis;
        self
    }

    /// Set sprint points
    pub fn points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    /// Tracked hours, derived from `time_spent_ms`
    pub fn hours_spent(&self) -> Hours {
        Hours::from_millis(self.time_spent_ms)
    }

    /// Estimated hours, derived from `time_estimate_ms`
    pub fn hours_estimated(&self) -> Hours {
        Hours::from_millis(self.time_estimate_ms)
    }

    /// Whether the task carries any time tracking or points
    pub fn has_tracking(&self) -> bool {
        self.time_spent_ms > 0 || self.time_estimate_ms > 0 || self.points > 0
    }
}

// ============================================================================
// TimeEntry
// ============================================================================

/// A logged duration associated with a user and a task.
///
/// Location names come from the API's `task_location` block and may be
/// placeholder values (`"Unknown"`, `"No Task"`) when the entry was logged
/// without one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier
    pub id: String,
    /// When the timer started
    pub start: DateTime<Utc>,
    /// Workspace/space name the entry was logged under
    pub workspace_name: String,
    /// List name the entry was logged under
    pub list_name: String,
    /// Task title the entry was logged against
    pub task_name: String,
    /// Free-form entry description
    pub description: String,
    /// Logged duration
    pub hours: Hours,
    /// Deep link to the task, empty when none
    pub task_url: String,
}

impl TimeEntry {
    /// Create an entry from its id, epoch-millisecond start and duration
    pub fn new(id: impl Into<String>, start_millis: i64, hours: Hours) -> Self {
        Self {
            id: id.into(),
            start: DateTime::from_timestamp_millis(start_millis).unwrap_or_default(),
            workspace_name: "Unknown".into(),
            list_name: "Unknown".into(),
            task_name: "No Task".into(),
            description: String::new(),
            hours,
            task_url: String::new(),
        }
    }

    /// Set the workspace name
    pub fn workspace(mut self, name: impl Into<String>) -> Self {
        self.workspace_name = name.into();
        self
    }

    /// Set the list name
    pub fn list(mut self, name: impl Into<String>) -> Self {
        self.list_name = name.into();
        self
    }

    /// Set the task name
    pub fn task(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    /// Set the description
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Set the task URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.task_url = url.into();
        self
    }

    /// Calendar date of the entry
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Date formatted as `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }
}

// ============================================================================
// Report Input
// ============================================================================

/// The fetch result for one user: their entries, or the error that kept
/// them empty. Order of `UserEntries` values is the selection order and is
/// preserved through the report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserEntries {
    pub user: User,
    pub entries: Vec<TimeEntry>,
    /// Set when the fetch for this user failed; entries is then empty
    pub fetch_error: Option<String>,
}

impl UserEntries {
    pub fn new(user: User, entries: Vec<TimeEntry>) -> Self {
        Self {
            user,
            entries,
            fetch_error: None,
        }
    }

    /// Record a failed fetch as zero entries
    pub fn failed(user: User, error: impl Into<String>) -> Self {
        Self {
            user,
            entries: Vec::new(),
            fetch_error: Some(error.into()),
        }
    }

    /// Sum of this user's entry hours (2-decimal rounded)
    pub fn total_hours(&self) -> Hours {
        self.entries.iter().map(|e| e.hours).sum::<Hours>().rounded()
    }
}

/// Tasks fetched for one folder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FolderTasks {
    pub folder: Folder,
    pub tasks: Vec<Task>,
    /// Set when the fetch for this folder failed; tasks is then empty
    pub fetch_error: Option<String>,
}

impl FolderTasks {
    pub fn new(folder: Folder, tasks: Vec<Task>) -> Self {
        Self {
            folder,
            tasks,
            fetch_error: None,
        }
    }

    /// Record a failed fetch as zero tasks
    pub fn failed(folder: Folder, error: impl Into<String>) -> Self {
        Self {
            folder,
            tasks: Vec::new(),
            fetch_error: Some(error.into()),
        }
    }
}

// ============================================================================
// Report Rows
// ============================================================================

/// Level tag of a hierarchical summary row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryLevel {
    Workspace,
    List,
    Task,
    Member,
    GrandTotal,
}

impl std::fmt::Display for SummaryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryLevel::Workspace => write!(f, "WORKSPACE"),
            SummaryLevel::List => write!(f, "LIST"),
            SummaryLevel::Task => write!(f, "TASK"),
            SummaryLevel::Member => write!(f, "MEMBER"),
            SummaryLevel::GrandTotal => write!(f, "GRAND TOTAL"),
        }
    }
}

/// One row of the hierarchical time summary.
///
/// Group header rows leave the columns below their level empty; workspace
/// and list rows carry hours but no entry count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub level: SummaryLevel,
    pub workspace: String,
    pub list: String,
    pub task: String,
    pub member: String,
    pub hours: Option<Hours>,
    pub entries: Option<u32>,
}

/// One row of the per-user totals sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserTotalsRow {
    pub username: String,
    pub email: String,
    pub entries: u32,
    pub hours: Hours,
}

/// One row of the per-folder task summary sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FolderSummaryRow {
    pub folder: String,
    pub total_tasks: u32,
    pub open: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub hours_spent: Hours,
    pub hours_estimated: Hours,
    pub points: i64,
    pub lists: u32,
}

// ============================================================================
// Reports
// ============================================================================

/// A complete time-tracking report, ready to render
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeReport {
    /// Per-user fetch results, in selection order
    pub users: Vec<UserEntries>,
    /// Hierarchical workspace → list → task → member summary
    pub hierarchy: Vec<SummaryRow>,
    /// Per-user totals with a trailing TOTAL row
    pub user_totals: Vec<UserTotalsRow>,
}

impl TimeReport {
    /// Total number of fetched entries across every user
    pub fn total_entries(&self) -> u32 {
        self.users.iter().map(|u| u.entries.len() as u32).sum()
    }
}

/// A complete task report, ready to render
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskReport {
    /// Per-folder fetch results, in selection order
    pub folders: Vec<FolderTasks>,
    /// Per-folder summary with a trailing GRAND TOTAL row
    pub summary: Vec<FolderSummaryRow>,
}

impl TaskReport {
    /// Total number of fetched tasks across every folder
    pub fn total_tasks(&self) -> u32 {
        self.folders.iter().map(|f| f.tasks.len() as u32).sum()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Input;
    type Output;

    /// Render a report to the output format
    fn render(&self, input: &Self::Input) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn hours_from_millis_rounds_to_two_decimals() {
        // 5 400 000 ms = 1.5 h exactly
        assert_eq!(Hours::from_millis(5_400_000).as_decimal(), dec!(1.50));

        // 1 000 ms = 0.000277.. h, rounds to 0.00
        assert_eq!(Hours::from_millis(1_000).as_decimal(), dec!(0.00));

        // 90 000 ms = 0.025 h, half-even rounds to 0.02
        assert_eq!(Hours::from_millis(90_000).as_decimal(), dec!(0.02));
    }

    #[test]
    fn hours_negative_duration_counts_as_zero() {
        // A running timer reports a negative duration
        assert!(Hours::from_millis(-120_000).is_zero());
    }

    #[test]
    fn hours_half_even_rounding() {
        assert_eq!(Hours::new(dec!(1.005)).as_decimal(), dec!(1.00));
        assert_eq!(Hours::new(dec!(1.015)).as_decimal(), dec!(1.02));
        assert_eq!(Hours::new(dec!(1.025)).as_decimal(), dec!(1.02));
    }

    #[test]
    fn hours_sum_keeps_rounded_children() {
        // Two entries of 1.005 h each round to 1.00 at ingestion; the sum
        // is 2.00, not round(2.01)
        let a = Hours::new(dec!(1.005));
        let b = Hours::new(dec!(1.005));
        assert_eq!((a + b).as_decimal(), dec!(2.00));
    }

    #[test]
    fn user_display_name() {
        let with_email = User::new("1", "ada").email("ada@example.com");
        assert_eq!(with_email.display_name(), "ada (ada@example.com)");

        let without = User::new("2", "bob");
        assert_eq!(without.display_name(), "bob");
    }

    #[test]
    fn workspace_member_lookup() {
        let mut ws = Workspace::new("9001", "Engineering");
        ws.members.push(User::new("1", "ada"));
        ws.members.push(User::new("2", "bob"));

        assert_eq!(ws.member_by_username("bob").unwrap().id, "2");
        assert_eq!(ws.member_by_id("1").unwrap().username, "ada");
        assert!(ws.member_by_username("eve").is_none());
        assert_eq!(ws.display_name(), "Engineering (ID: 9001)");
    }

    #[test]
    fn task_hours_are_derived_from_millis() {
        let task = Task::new("t1", "Fix login")
            .time_spent(9_000_000)
            .time_estimate(3_600_000);

        assert_eq!(task.hours_spent().as_decimal(), dec!(2.50));
        assert_eq!(task.hours_estimated().as_decimal(), dec!(1.00));
        assert!(task.has_tracking());
    }

    #[test]
    fn task_without_tracking() {
        let task = Task::new("t2", "Untracked");
        assert!(task.hours_spent().is_zero());
        assert!(!task.has_tracking());
    }

    #[test]
    fn time_entry_date_formatting() {
        // 2024-01-23 09:33:20 UTC
        let entry = TimeEntry::new("e1", 1_706_002_400_000, Hours::from_millis(0));
        assert_eq!(entry.date_string(), "2024-01-23");
    }

    #[test]
    fn time_entry_defaults_to_placeholders() {
        let entry = TimeEntry::new("e1", 0, Hours::zero());
        assert_eq!(entry.workspace_name, "Unknown");
        assert_eq!(entry.list_name, "Unknown");
        assert_eq!(entry.task_name, "No Task");
    }

    #[test]
    fn user_entries_total_hours() {
        let user = User::new("1", "ada");
        let entries = vec![
            TimeEntry::new("e1", 0, Hours::from_millis(3_600_000)),
            TimeEntry::new("e2", 0, Hours::from_millis(1_800_000)),
        ];
        let fetched = UserEntries::new(user, entries);
        assert_eq!(fetched.total_hours().as_decimal(), dec!(1.50));
        assert!(fetched.fetch_error.is_none());
    }

    #[test]
    fn failed_fetch_records_error_and_no_entries() {
        let fetched = UserEntries::failed(User::new("1", "ada"), "HTTP 502");
        assert!(fetched.entries.is_empty());
        assert_eq!(fetched.fetch_error.as_deref(), Some("HTTP 502"));
        assert!(fetched.total_hours().is_zero());
    }

    #[test]
    fn summary_level_display() {
        assert_eq!(format!("{}", SummaryLevel::Workspace), "WORKSPACE");
        assert_eq!(format!("{}", SummaryLevel::List), "LIST");
        assert_eq!(format!("{}", SummaryLevel::Task), "TASK");
        assert_eq!(format!("{}", SummaryLevel::Member), "MEMBER");
        assert_eq!(format!("{}", SummaryLevel::GrandTotal), "GRAND TOTAL");
    }
}
