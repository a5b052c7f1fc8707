//! Data models for the issue digest.
//!
//! This module contains the core data structures used throughout the
//! application: the issues fetched from the tracker and the statistics
//! summary derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used when an issue has no assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// Label used when an issue belongs to no project.
pub const NO_PROJECT: &str = "No project";

/// Label used when an issue belongs to no team.
pub const NO_TEAM: &str = "No team";

/// Workflow state of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Display name (e.g. "In Progress").
    pub name: String,
    /// State category (e.g. "started", "completed", "canceled").
    pub category: String,
}

/// A single issue retrieved from the tracking system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable external identifier.
    pub id: String,
    /// Human-readable short code (e.g. "ENG-42").
    pub identifier: String,
    /// Issue title.
    pub title: String,
    /// Link to the issue in the tracker UI.
    pub url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Calendar date the issue is due, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// When the issue was completed. Absent means the issue is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Current workflow state.
    pub state: WorkflowState,
    /// Assignee display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Project display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Team display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Numeric priority (0 = none, 1 = urgent ... 4 = low).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl Issue {
    /// Returns `true` if the issue has not been completed.
    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }

    /// Returns `true` if the issue is open and its due date lies before `now`.
    ///
    /// Due dates carry no time of day, so the comparison is made against the
    /// UTC calendar date of `now`: an issue due today is not yet overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open()
            && self
                .due_date
                .is_some_and(|due| due < now.date_naive())
    }

    /// Assignee name, or [`UNASSIGNED`].
    pub fn assignee_label(&self) -> &str {
        self.assignee.as_deref().unwrap_or(UNASSIGNED)
    }

    /// Project name, or [`NO_PROJECT`].
    pub fn project_label(&self) -> &str {
        self.project.as_deref().unwrap_or(NO_PROJECT)
    }

    /// Team name, or [`NO_TEAM`].
    pub fn team_label(&self) -> &str {
        self.team.as_deref().unwrap_or(NO_TEAM)
    }

    /// Short reference used in rendered output: "ENG-42 Fix the thing".
    pub fn reference(&self) -> String {
        format!("{} {}", self.identifier, self.title)
    }
}

/// Per-assignee counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeStats {
    /// Open issues assigned to this person.
    pub open: usize,
    /// Of those, how many are overdue.
    pub overdue: usize,
}

/// Summary statistics over one fetch of issues.
///
/// Built once per run by [`crate::analysis::compute_stats`] and then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// The evaluation instant every comparison was made against.
    pub generated_at: DateTime<Utc>,
    /// Number of issues considered.
    pub total_count: usize,
    /// Issues with no completion timestamp.
    pub open_count: usize,
    /// Open issues past their due date. Always equals `overdue_list.len()`.
    pub overdue_count: usize,
    /// Issues completed within the trailing window.
    pub completed_this_week: Vec<Issue>,
    /// Open/overdue counts keyed by assignee label.
    pub by_assignee: BTreeMap<String, AssigneeStats>,
    /// Open counts keyed by project label.
    pub by_project: BTreeMap<String, usize>,
    /// Open counts keyed by team label.
    pub by_team: BTreeMap<String, usize>,
    /// Overdue issues in fetch order.
    pub overdue_list: Vec<Issue>,
}
