//! # worklog-report
//!
//! Aggregation of fetched records into report rows.
//!
//! This crate provides:
//! - The hierarchical time summary (workspace → list → task → member)
//! - Per-user totals
//! - The per-folder task summary with status buckets
//!
//! All computation is pure and in-memory; the inputs are the fetch results
//! from `worklog-client`, the outputs the report types from `worklog-core`.

mod tasks;
mod time;

pub use tasks::{build_task_report, folder_summary, status_bucket, StatusBucket};
pub use time::{build_time_report, hierarchical_summary, user_summary};
