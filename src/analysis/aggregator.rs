//! Issue aggregation and statistics.
//!
//! This module turns the flat list of fetched issues into a
//! [`StatsSummary`] and provides the ordered views the renderers use.

use crate::models::{AssigneeStats, Issue, StatsSummary};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Default length of the "completed this week" window, in days.
pub const COMPLETED_WINDOW_DAYS: i64 = 7;

/// Compute summary statistics over `issues` as of `now`.
///
/// Uses the default seven-day completion window.
pub fn compute_stats(issues: &[Issue], now: DateTime<Utc>) -> StatsSummary {
    compute_stats_with_window(issues, now, Duration::days(COMPLETED_WINDOW_DAYS))
}

/// Compute summary statistics with a custom completion window.
///
/// An issue completed exactly `window` before `now` counts as completed
/// within the window.
pub fn compute_stats_with_window(
    issues: &[Issue],
    now: DateTime<Utc>,
    window: Duration,
) -> StatsSummary {
    let window_start = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut open_count = 0;
    let mut completed_this_week = Vec::new();
    let mut overdue_list = Vec::new();
    let mut by_assignee: BTreeMap<String, AssigneeStats> = BTreeMap::new();
    let mut by_project: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_team: BTreeMap<String, usize> = BTreeMap::new();

    for issue in issues {
        let Some(completed_at) = issue.completed_at else {
            open_count += 1;
            let overdue = issue.is_overdue(now);

            let assignee = by_assignee
                .entry(issue.assignee_label().to_string())
                .or_default();
            assignee.open += 1;
            if overdue {
                assignee.overdue += 1;
                overdue_list.push(issue.clone());
            }

            *by_project
                .entry(issue.project_label().to_string())
                .or_default() += 1;
            *by_team.entry(issue.team_label().to_string()).or_default() += 1;
            continue;
        };

        if completed_at >= window_start {
            completed_this_week.push(issue.clone());
        }
    }

    StatsSummary {
        generated_at: now,
        total_count: issues.len(),
        open_count,
        overdue_count: overdue_list.len(),
        completed_this_week,
        by_assignee,
        by_project,
        by_team,
        overdue_list,
    }
}

/// Assignee breakdown in lexicographic order of name.
pub fn assignees_sorted(summary: &StatsSummary) -> Vec<(&str, AssigneeStats)> {
    summary
        .by_assignee
        .iter()
        .map(|(name, stats)| (name.as_str(), *stats))
        .collect()
}

/// Project breakdown by descending open count, ties by name.
pub fn projects_by_count(summary: &StatsSummary) -> Vec<(&str, usize)> {
    sort_by_count(&summary.by_project)
}

/// Team breakdown by descending open count, ties by name.
pub fn teams_by_count(summary: &StatsSummary) -> Vec<(&str, usize)> {
    sort_by_count(&summary.by_team)
}

fn sort_by_count(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut sorted: Vec<_> = counts
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();

    // Stable sort keeps the map's name order among equal counts.
    sorted.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    sorted
}

/// The first `n` overdue issues, in fetch order.
pub fn top_overdue(summary: &StatsSummary, n: usize) -> &[Issue] {
    let end = n.min(summary.overdue_list.len());
    &summary.overdue_list[..end]
}
