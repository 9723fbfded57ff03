//! # worklog-client
//!
//! Blocking client for the ClickUp v2 REST API.
//!
//! All requests are sequential GETs carrying the personal token verbatim in
//! the `Authorization` header, matching how ClickUp personal tokens work.
//! Responses are decoded through the wire structs in [`wire`] and handed
//! back as `worklog-core` domain types.
//!
//! ## Example
//!
//! ```rust,no_run
//! use worklog_client::ClickUpClient;
//!
//! let client = ClickUpClient::new("pk_12345_ABCDE")?;
//! for workspace in client.workspaces()? {
//!     println!("{}", workspace.display_name());
//! }
//! # Ok::<(), worklog_client::ClientError>(())
//! ```

use chrono::{Days, NaiveDate};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use worklog_core::{Folder, Space, Task, TaskList, TimeEntry, Workspace};

mod text;
mod wire;

pub use text::clean_text;

/// Production API endpoint
pub const BASE_URL: &str = "https://api.clickup.com/api/v2";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client error
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication token not set")]
    MissingToken,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// ClickUp API client.
///
/// Cheap to clone; holds the personal token and a pooled blocking HTTP
/// client.
#[derive(Clone, Debug)]
pub struct ClickUpClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl ClickUpClient {
    /// Create a client for the production API.
    ///
    /// An empty token is rejected up front so misconfiguration surfaces
    /// before the first request.
    pub fn new(token: impl Into<String>) -> Result<Self, ClientError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            token,
        })
    }

    /// Point the client at a different base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch all workspaces/teams visible to the token
    pub fn workspaces(&self) -> Result<Vec<Workspace>, ClientError> {
        let response: wire::TeamsResponse = self.get_json("team", &[])?;
        Ok(response
            .teams
            .into_iter()
            .map(wire::TeamDto::into_workspace)
            .collect())
    }

    /// Fetch the spaces of a workspace
    pub fn spaces(&self, team_id: &str) -> Result<Vec<Space>, ClientError> {
        let response: wire::SpacesResponse = self.get_json(&format!("team/{team_id}/space"), &[])?;
        Ok(response
            .spaces
            .into_iter()
            .map(|s| s.into_space(team_id))
            .collect())
    }

    /// Fetch the folders of a space
    pub fn folders(&self, space_id: &str) -> Result<Vec<Folder>, ClientError> {
        let response: wire::FoldersResponse =
            self.get_json(&format!("space/{space_id}/folder"), &[])?;
        Ok(response
            .folders
            .into_iter()
            .map(wire::FolderDto::into_folder)
            .collect())
    }

    /// Fetch the lists of a folder
    pub fn lists(&self, folder_id: &str) -> Result<Vec<TaskList>, ClientError> {
        let response: wire::ListsResponse =
            self.get_json(&format!("folder/{folder_id}/list"), &[])?;
        Ok(response.lists.into_iter().map(wire::ListDto::into_list).collect())
    }

    /// Fetch the tasks of a list, closed ones included
    pub fn tasks(&self, list: &TaskList) -> Result<Vec<Task>, ClientError> {
        let response: wire::TasksResponse = self.get_json(
            &format!("list/{}/task", list.id),
            &[("include_closed", "true".into())],
        )?;
        Ok(response
            .tasks
            .into_iter()
            .map(|t| t.into_task(list))
            .collect())
    }

    /// Fetch every task in a folder, walking its lists.
    ///
    /// A list whose task fetch fails is logged and skipped; the folder's
    /// remaining lists still contribute.
    pub fn folder_tasks(&self, folder: &Folder) -> Result<Vec<Task>, ClientError> {
        let lists = self.lists(&folder.id)?;
        let mut all_tasks = Vec::new();
        for list in &lists {
            match self.tasks(list) {
                Ok(mut tasks) => {
                    for task in &mut tasks {
                        task.folder_id = folder.id.clone();
                        task.folder_name = folder.name.clone();
                    }
                    all_tasks.append(&mut tasks);
                }
                Err(err) => {
                    tracing::warn!(
                        list = %list.name,
                        folder = %folder.name,
                        error = %err,
                        "skipping list after failed task fetch"
                    );
                }
            }
        }
        Ok(all_tasks)
    }

    /// Fetch a user's time entries over an inclusive date range
    pub fn time_entries(
        &self,
        team_id: &str,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>, ClientError> {
        let (start, end) = date_range_millis(from, to);
        let response: wire::TimeEntriesResponse = self.get_json(
            &format!("team/{team_id}/time_entries"),
            &[
                ("assignee", user_id.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
                ("include_task_tags", "true".into()),
                ("include_location_names", "true".into()),
            ],
        )?;
        Ok(response
            .data
            .into_iter()
            .map(wire::TimeEntryDto::into_entry)
            .collect())
    }

    /// GET a JSON payload, translating non-2xx into `ClientError::Api`
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.token.as_str())
            .query(query)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Convert an inclusive `YYYY-MM-DD` range into the API's epoch-millisecond
/// window. The end bound moves to the next midnight so entries logged on
/// the last day are included.
pub fn date_range_millis(from: NaiveDate, to: NaiveDate) -> (i64, i64) {
    let start = from
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis();
    let end = to
        .checked_add_days(Days::new(1))
        .unwrap_or(to)
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis();
    (start, end)
}
