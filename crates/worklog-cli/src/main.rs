//! worklog CLI - ClickUp reporting and spreadsheet export
//!
//! Command-line interface for browsing workspaces, fetching time entries
//! and tasks, and exporting formatted XLSX reports.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use worklog_client::ClickUpClient;

mod commands;

#[derive(Parser)]
#[command(name = "worklog")]
#[command(author, version, about = "ClickUp reporting and spreadsheet export", long_about = None)]
struct Cli {
    /// Personal API token
    #[arg(long, env = "CLICKUP_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the token by listing workspaces
    Check,

    /// List workspaces and their members
    Workspaces,

    /// List the spaces of a workspace
    Spaces {
        /// Workspace id
        #[arg(long)]
        workspace: String,
    },

    /// List the folders of a space, with list/task counts
    Folders {
        /// Space id
        #[arg(long)]
        space: String,
    },

    /// Fetch time entries and export the time-tracking workbook
    TimeReport {
        /// Workspace id
        #[arg(long)]
        workspace: String,

        /// Comma-separated user ids (defaults to every member)
        #[arg(long, value_delimiter = ',')]
        users: Vec<String>,

        /// Range start, YYYY-MM-DD (defaults to 7 days ago)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Range end, YYYY-MM-DD, inclusive (defaults to today)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output file
        #[arg(short, long, value_name = "FILE.xlsx")]
        output: std::path::PathBuf,
    },

    /// Fetch folder tasks and export the task workbook
    TaskReport {
        /// Space id
        #[arg(long)]
        space: String,

        /// Comma-separated folder ids (defaults to every folder)
        #[arg(long, value_delimiter = ',')]
        folders: Vec<String>,

        /// Skip custom field columns
        #[arg(long)]
        no_custom_fields: bool,

        /// Skip time tracking columns and the Time Tracking sheet
        #[arg(long)]
        no_time_tracking: bool,

        /// Skip the assignee column
        #[arg(long)]
        no_assignees: bool,

        /// Skip due/start date columns
        #[arg(long)]
        no_dates: bool,

        /// Output file
        #[arg(short, long, value_name = "FILE.xlsx")]
        output: std::path::PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; -v/-vv raise the default level otherwise
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let Some(command) = cli.command else {
        println!("worklog - ClickUp reporting and spreadsheet export");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let client = build_client(cli.token)?;

    match command {
        Commands::Check => commands::check(&client),
        Commands::Workspaces => commands::workspaces(&client),
        Commands::Spaces { workspace } => commands::spaces(&client, &workspace),
        Commands::Folders { space } => commands::folders(&client, &space),
        Commands::TimeReport {
            workspace,
            users,
            from,
            to,
            output,
        } => commands::time_report(
            &client,
            commands::TimeReportArgs {
                workspace,
                users,
                from,
                to,
                output,
            },
        ),
        Commands::TaskReport {
            space,
            folders,
            no_custom_fields,
            no_time_tracking,
            no_assignees,
            no_dates,
            output,
        } => commands::task_report(
            &client,
            commands::TaskReportArgs {
                space,
                folders,
                no_custom_fields,
                no_time_tracking,
                no_assignees,
                no_dates,
                output,
            },
        ),
    }
}

/// Build the API client, failing fast when no token is configured
fn build_client(token: Option<String>) -> Result<ClickUpClient> {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        bail!("no API token: pass --token or set CLICKUP_TOKEN");
    };
    Ok(ClickUpClient::new(token)?)
}
