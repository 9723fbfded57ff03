//! Wire-format structs for the ClickUp v2 API.
//!
//! The API is loose with scalar types: ids arrive as strings or numbers
//! depending on the entity, and epoch-millisecond fields (`start`,
//! `duration`, `due_date`) arrive as strings. The deserializers here accept
//! both forms so one schema covers every observed payload.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use worklog_core::{Folder, Hours, Space, Task, TaskList, TimeEntry, User, Workspace};

use crate::text::clean_text;

/// String-or-number id field
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::String(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// String-or-number millisecond field; null and malformed values are zero
fn de_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(opt_millis(&Option::<Value>::deserialize(deserializer)?).unwrap_or(0))
}

/// Millisecond value out of a JSON scalar, tolerating the literal "null"
fn opt_millis(value: &Option<Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) if s != "null" => s.parse().ok(),
        _ => None,
    }
}

/// Epoch-millisecond timestamp as a calendar date
fn millis_to_date(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

// ============================================================================
// Teams
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct TeamsResponse {
    #[serde(default)]
    pub teams: Vec<TeamDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberDto {
    #[serde(default)]
    pub user: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserDto {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl TeamDto {
    pub fn into_workspace(self) -> Workspace {
        let mut workspace = Workspace::new(self.id, self.name.unwrap_or_else(|| "Unknown".into()));
        for member in self.members {
            let Some(user) = member.user else { continue };
            // Members without an id are placeholder invitations; skip them
            let Some(id) = opt_id(&user.id) else { continue };
            workspace.members.push(
                User::new(id, user.username.unwrap_or_else(|| "Unknown".into()))
                    .email(user.email.unwrap_or_default()),
            );
        }
        workspace
    }
}

fn opt_id(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Spaces / Folders / Lists
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct SpacesResponse {
    #[serde(default)]
    pub spaces: Vec<SpaceDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

impl SpaceDto {
    pub fn into_space(self, workspace_id: &str) -> Space {
        Space::new(self.id, self.name, workspace_id)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FoldersResponse {
    #[serde(default)]
    pub folders: Vec<FolderDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FolderDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

impl FolderDto {
    pub fn into_folder(self) -> Folder {
        Folder::new(self.id, self.name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListsResponse {
    #[serde(default)]
    pub lists: Vec<ListDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

impl ListDto {
    pub fn into_list(self) -> TaskList {
        TaskList::new(self.id, self.name)
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct TasksResponse {
    #[serde(default)]
    pub tasks: Vec<TaskDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<StatusDto>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignees: Vec<AssigneeDto>,
    #[serde(default)]
    pub due_date: Option<Value>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default, deserialize_with = "de_millis")]
    pub time_spent: i64,
    #[serde(default, deserialize_with = "de_millis")]
    pub time_estimate: i64,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDto>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusDto {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssigneeDto {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomFieldDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub type_config: Option<TypeConfigDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TypeConfigDto {
    #[serde(default)]
    pub options: Vec<OptionDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionDto {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub orderindex: Option<Value>,
}

impl TaskDto {
    pub fn into_task(self, list: &TaskList) -> Task {
        let mut task = Task::new(self.id, self.name.unwrap_or_default());
        task.status = self.status.and_then(|s| s.status).unwrap_or_default();
        task.description = clean_text(&self.description.unwrap_or_default());
        task.list_id = list.id.clone();
        task.list_name = list.name.clone();
        task.assignees = self
            .assignees
            .into_iter()
            .filter_map(|a| a.username)
            .collect();
        task.due_date = opt_millis(&self.due_date).and_then(millis_to_date);
        task.start_date = opt_millis(&self.start_date).and_then(millis_to_date);
        task.time_spent_ms = self.time_spent;
        task.time_estimate_ms = self.time_estimate;
        task.points = self.points.unwrap_or(0.0) as i64;
        for field in self.custom_fields {
            let Some(name) = field.name.filter(|n| !n.is_empty()) else {
                continue;
            };
            task.custom_fields
                .insert(name, custom_field_value(&field.field_type, &field.value, field.type_config.as_ref()));
        }
        task.url = self.url.unwrap_or_default();
        task
    }
}

/// Flatten a custom field value to a display string.
///
/// Drop-down fields store the selected option's `orderindex` or id, so the
/// option name has to be looked up in the type config. Automatic-progress
/// fields store an object with a `percent_complete` key.
fn custom_field_value(
    field_type: &Option<String>,
    value: &Option<Value>,
    type_config: Option<&TypeConfigDto>,
) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match field_type.as_deref() {
        Some("drop_down") => {
            if let Some(config) = type_config {
                for option in &config.options {
                    let matches_index = option
                        .orderindex
                        .as_ref()
                        .is_some_and(|idx| json_scalar_eq(idx, value));
                    let matches_id =
                        option.id.as_ref().is_some_and(|id| json_scalar_eq(id, value));
                    if matches_index || matches_id {
                        if let Some(name) = &option.name {
                            return name.clone();
                        }
                    }
                }
            }
            scalar_string(value)
        }
        Some("automatic_progress") => match value {
            Value::Object(map) => {
                let percent = map
                    .get("percent_complete")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                format!("{}%", percent)
            }
            other => scalar_string(other),
        },
        _ => scalar_string(value),
    }
}

/// Compare two JSON scalars, treating `3` and `"3"` as equal
fn json_scalar_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    scalar_string(a) == scalar_string(b)
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Time entries
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct TimeEntriesResponse {
    #[serde(default)]
    pub data: Vec<TimeEntryDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeEntryDto {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_millis")]
    pub start: i64,
    #[serde(default, deserialize_with = "de_millis")]
    pub duration: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub task: Option<TaskRefDto>,
    #[serde(default)]
    pub task_location: Option<LocationDto>,
    #[serde(default)]
    pub task_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskRefDto {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationDto {
    #[serde(default)]
    pub space_name: Option<String>,
    #[serde(default)]
    pub list_name: Option<String>,
}

impl TimeEntryDto {
    pub fn into_entry(self) -> TimeEntry {
        let mut entry = TimeEntry::new(self.id, self.start, Hours::from_millis(self.duration));
        if let Some(location) = self.task_location {
            if let Some(space) = location.space_name {
                entry.workspace_name = space;
            }
            if let Some(list) = location.list_name {
                entry.list_name = list;
            }
        }
        if let Some(task) = self.task {
            if let Some(name) = task.name {
                entry.task_name = name;
            }
        }
        entry.description = self.description.unwrap_or_default();
        entry.task_url = self.task_url.unwrap_or_default();
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn team_with_numeric_user_ids() {
        let json = r#"{
            "teams": [{
                "id": "9011539859",
                "name": "Engineering",
                "members": [
                    {"user": {"id": 81492, "username": "ada", "email": "ada@example.com"}},
                    {"user": {"id": null, "username": "pending-invite"}},
                    {"user": null}
                ]
            }]
        }"#;

        let parsed: TeamsResponse = serde_json::from_str(json).unwrap();
        let workspace = parsed.teams.into_iter().next().unwrap().into_workspace();

        assert_eq!(workspace.id, "9011539859");
        assert_eq!(workspace.name, "Engineering");
        assert_eq!(workspace.members.len(), 1);
        assert_eq!(workspace.members[0].id, "81492");
        assert_eq!(workspace.members[0].email, "ada@example.com");
    }

    #[test]
    fn time_entry_with_string_scalars() {
        // start and duration arrive as strings in the team time_entries
        // payload
        let json = r#"{
            "data": [{
                "id": "3219034953",
                "start": "1706002400000",
                "duration": "5400000",
                "description": "pairing session",
                "task": {"name": "Fix login flow"},
                "task_location": {"space_name": "Product", "list_name": "Sprint 12"},
                "task_url": "https://app.clickup.com/t/abc123"
            }]
        }"#;

        let parsed: TimeEntriesResponse = serde_json::from_str(json).unwrap();
        let entry = parsed.data.into_iter().next().unwrap().into_entry();

        assert_eq!(entry.hours.as_decimal(), dec!(1.50));
        assert_eq!(entry.workspace_name, "Product");
        assert_eq!(entry.list_name, "Sprint 12");
        assert_eq!(entry.task_name, "Fix login flow");
        assert_eq!(entry.date_string(), "2024-01-23");
        assert_eq!(entry.task_url, "https://app.clickup.com/t/abc123");
    }

    #[test]
    fn time_entry_missing_location_uses_placeholders() {
        let json = r#"{"data": [{"id": 1, "start": 0, "duration": 0}]}"#;
        let parsed: TimeEntriesResponse = serde_json::from_str(json).unwrap();
        let entry = parsed.data.into_iter().next().unwrap().into_entry();

        assert_eq!(entry.workspace_name, "Unknown");
        assert_eq!(entry.list_name, "Unknown");
        assert_eq!(entry.task_name, "No Task");
        assert!(entry.hours.is_zero());
    }

    #[test]
    fn task_parses_dates_and_time_fields() {
        let json = r#"{
            "tasks": [{
                "id": "abc123",
                "name": "Fix login flow",
                "status": {"status": "in progress"},
                "description": "<p>Broken  on\nmobile</p>",
                "assignees": [{"username": "ada"}, {"username": "bob"}],
                "due_date": "1706054400000",
                "start_date": null,
                "time_spent": 9000000,
                "time_estimate": "3600000",
                "points": 3.0,
                "url": "https://app.clickup.com/t/abc123"
            }]
        }"#;

        let parsed: TasksResponse = serde_json::from_str(json).unwrap();
        let list = TaskList::new("l1", "Sprint 12");
        let task = parsed.tasks.into_iter().next().unwrap().into_task(&list);

        assert_eq!(task.status, "in progress");
        assert_eq!(task.description, "Broken on mobile");
        assert_eq!(task.assignees, vec!["ada", "bob"]);
        assert_eq!(
            task.due_date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap())
        );
        assert_eq!(task.start_date, None);
        assert_eq!(task.hours_spent().as_decimal(), dec!(2.50));
        assert_eq!(task.hours_estimated().as_decimal(), dec!(1.00));
        assert_eq!(task.points, 3);
        assert_eq!(task.list_name, "Sprint 12");
    }

    #[test]
    fn due_date_literal_null_string_is_ignored() {
        let json = r#"{"tasks": [{"id": "t", "name": "x", "due_date": "null"}]}"#;
        let parsed: TasksResponse = serde_json::from_str(json).unwrap();
        let list = TaskList::new("l1", "L");
        let task = parsed.tasks.into_iter().next().unwrap().into_task(&list);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn drop_down_custom_field_resolves_option_name() {
        let json = r#"{
            "tasks": [{
                "id": "t",
                "name": "x",
                "custom_fields": [
                    {
                        "name": "Priority",
                        "type": "drop_down",
                        "value": 1,
                        "type_config": {"options": [
                            {"id": "opt-a", "name": "Low", "orderindex": 0},
                            {"id": "opt-b", "name": "High", "orderindex": 1}
                        ]}
                    },
                    {
                        "name": "Progress",
                        "type": "automatic_progress",
                        "value": {"percent_complete": 62.5}
                    },
                    {"name": "Notes", "type": "short_text", "value": "needs QA"},
                    {"name": "Unset", "type": "short_text"}
                ]
            }]
        }"#;

        let parsed: TasksResponse = serde_json::from_str(json).unwrap();
        let list = TaskList::new("l1", "L");
        let task = parsed.tasks.into_iter().next().unwrap().into_task(&list);

        assert_eq!(task.custom_fields["Priority"], "High");
        assert_eq!(task.custom_fields["Progress"], "62.5%");
        assert_eq!(task.custom_fields["Notes"], "needs QA");
        assert_eq!(task.custom_fields["Unset"], "");
    }

    #[test]
    fn drop_down_matches_option_by_id() {
        let json = r#"{
            "tasks": [{
                "id": "t",
                "name": "x",
                "custom_fields": [{
                    "name": "Team",
                    "type": "drop_down",
                    "value": "opt-b",
                    "type_config": {"options": [
                        {"id": "opt-a", "name": "Platform", "orderindex": 0},
                        {"id": "opt-b", "name": "Mobile", "orderindex": 1}
                    ]}
                }]
            }]
        }"#;

        let parsed: TasksResponse = serde_json::from_str(json).unwrap();
        let list = TaskList::new("l1", "L");
        let task = parsed.tasks.into_iter().next().unwrap().into_task(&list);
        assert_eq!(task.custom_fields["Team"], "Mobile");
    }
}
