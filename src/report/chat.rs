//! Chat message rendering.
//!
//! Produces a Discord-style webhook payload: no plain content, one embed
//! whose description carries the whole digest as Markdown.

use crate::analysis::{assignees_sorted, projects_by_count, top_overdue};
use crate::models::{Issue, StatsSummary};
use serde::{Deserialize, Serialize};

/// Discord rejects embed descriptions longer than this.
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

/// Webhook request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPayload {
    /// Always `null`; everything lives in the embed.
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

/// A single embed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
}

/// Build the webhook payload for `summary`.
pub fn render_chat_payload(summary: &StatsSummary, title: &str, overdue_limit: usize) -> ChatPayload {
    ChatPayload {
        content: None,
        embeds: vec![Embed {
            title: format!(
                "{} for {}",
                title,
                summary.generated_at.format("%Y-%m-%d")
            ),
            description: clip(&render_chat_text(summary, overdue_limit), MAX_DESCRIPTION_CHARS),
        }],
    }
}

/// Render the digest as the Markdown text block used in the embed.
pub fn render_chat_text(summary: &StatsSummary, overdue_limit: usize) -> String {
    let mut lines = Vec::new();

    lines.push(format!("**Open issues:** {}", summary.open_count));
    lines.push(format!("**Overdue:** {}", summary.overdue_count));
    lines.push(format!(
        "**Completed this week:** {}",
        summary.completed_this_week.len()
    ));

    let assignees = assignees_sorted(summary);
    if !assignees.is_empty() {
        lines.push(String::new());
        lines.push("**By assignee**".to_string());
        for (name, stats) in assignees {
            if stats.overdue > 0 {
                lines.push(format!(
                    "• {}: {} open ({} overdue)",
                    name, stats.open, stats.overdue
                ));
            } else {
                lines.push(format!("• {}: {} open", name, stats.open));
            }
        }
    }

    let projects = projects_by_count(summary);
    if !projects.is_empty() {
        lines.push(String::new());
        lines.push("**By project**".to_string());
        for (name, count) in projects {
            lines.push(format!("• {}: {}", name, count));
        }
    }

    if !summary.overdue_list.is_empty() {
        lines.push(String::new());
        lines.push("**Overdue issues**".to_string());
        for issue in top_overdue(summary, overdue_limit) {
            lines.push(format!("• {}", issue_link(issue)));
        }

        let hidden = summary.overdue_list.len().saturating_sub(overdue_limit);
        if hidden > 0 {
            lines.push(format!("…and {} more", hidden));
        }
    }

    lines.join("\n")
}

/// `[ENG-1 Title](url) (due 2026-10-14)`
fn issue_link(issue: &Issue) -> String {
    let title = issue.title.replace(['[', ']'], "");
    match issue.due_date {
        Some(due) => format!(
            "[{} {}]({}) (due {})",
            issue.identifier,
            title,
            issue.url,
            due.format("%Y-%m-%d")
        ),
        None => format!("[{} {}]({})", issue.identifier, title, issue.url),
    }
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}
