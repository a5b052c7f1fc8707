//! HTML email rendering.
//!
//! Generates a self-contained HTML document (inline styles only, since most
//! mail clients strip `<style>` blocks) from a statistics summary.

use crate::analysis::{assignees_sorted, projects_by_count, teams_by_count, top_overdue};
use crate::models::StatsSummary;

const TABLE_STYLE: &str = "border-collapse:collapse;margin-bottom:16px;";
const CELL_STYLE: &str = "border:1px solid #ddd;padding:4px 8px;text-align:left;";

/// Generate the complete HTML digest.
pub fn render_email_html(summary: &StatsSummary, title: &str, overdue_limit: usize) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    output.push_str("</head>\n");
    output.push_str("<body style=\"font-family:sans-serif;color:#1a1a1a;\">\n");

    output.push_str(&format!(
        "<h1>{}</h1>\n<p>Generated {}</p>\n",
        html_escape(title),
        summary.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output.push_str(&generate_totals_section(summary));
    output.push_str(&generate_assignee_section(summary));
    output.push_str(&generate_count_section(
        "By project",
        "Project",
        &projects_by_count(summary),
    ));
    output.push_str(&generate_count_section(
        "By team",
        "Team",
        &teams_by_count(summary),
    ));
    output.push_str(&generate_overdue_section(summary, overdue_limit));
    output.push_str(&generate_completed_section(summary));

    output.push_str("</body>\n</html>\n");
    output
}

fn generate_totals_section(summary: &StatsSummary) -> String {
    let mut section = String::new();

    section.push_str("<h2>Summary</h2>\n");
    section.push_str(&format!("<table style=\"{}\">\n", TABLE_STYLE));
    for (label, value) in [
        ("Open issues", summary.open_count),
        ("Overdue", summary.overdue_count),
        ("Completed this week", summary.completed_this_week.len()),
    ] {
        section.push_str(&format!(
            "<tr><th style=\"{cell}\">{}</th><td style=\"{cell}\">{}</td></tr>\n",
            label,
            value,
            cell = CELL_STYLE
        ));
    }
    section.push_str("</table>\n");

    section
}

fn generate_assignee_section(summary: &StatsSummary) -> String {
    let assignees = assignees_sorted(summary);
    if assignees.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("<h2>By assignee</h2>\n");
    section.push_str(&format!("<table style=\"{}\">\n", TABLE_STYLE));
    section.push_str(&format!(
        "<tr><th style=\"{cell}\">Assignee</th><th style=\"{cell}\">Open</th><th style=\"{cell}\">Overdue</th></tr>\n",
        cell = CELL_STYLE
    ));
    for (name, stats) in assignees {
        section.push_str(&format!(
            "<tr><td style=\"{cell}\">{}</td><td style=\"{cell}\">{}</td><td style=\"{cell}\">{}</td></tr>\n",
            html_escape(name),
            stats.open,
            stats.overdue,
            cell = CELL_STYLE
        ));
    }
    section.push_str("</table>\n");

    section
}

fn generate_count_section(heading: &str, column: &str, rows: &[(&str, usize)]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("<h2>{}</h2>\n", heading));
    section.push_str(&format!("<table style=\"{}\">\n", TABLE_STYLE));
    section.push_str(&format!(
        "<tr><th style=\"{cell}\">{}</th><th style=\"{cell}\">Open</th></tr>\n",
        column,
        cell = CELL_STYLE
    ));
    for (name, count) in rows {
        section.push_str(&format!(
            "<tr><td style=\"{cell}\">{}</td><td style=\"{cell}\">{}</td></tr>\n",
            html_escape(name),
            count,
            cell = CELL_STYLE
        ));
    }
    section.push_str("</table>\n");

    section
}

fn generate_overdue_section(summary: &StatsSummary, limit: usize) -> String {
    let mut section = String::new();

    section.push_str("<h2>Overdue issues</h2>\n");

    if summary.overdue_list.is_empty() {
        section.push_str("<p>Nothing is overdue.</p>\n");
        return section;
    }

    section.push_str("<ul>\n");
    for issue in top_overdue(summary, limit) {
        let due = issue
            .due_date
            .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        section.push_str(&format!(
            "<li>{} &ndash; {}{} <em>{}</em></li>\n",
            html_escape(&issue.identifier),
            html_escape(&issue.title),
            due,
            html_escape(issue.assignee_label())
        ));
    }
    section.push_str("</ul>\n");

    let hidden = summary.overdue_list.len().saturating_sub(limit);
    if hidden > 0 {
        section.push_str(&format!("<p>&hellip;and {} more.</p>\n", hidden));
    }

    section
}

fn generate_completed_section(summary: &StatsSummary) -> String {
    if summary.completed_this_week.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("<h2>Completed this week</h2>\n<ul>\n");
    for issue in &summary.completed_this_week {
        section.push_str(&format!("<li>{}</li>\n", html_escape(&issue.reference())));
    }
    section.push_str("</ul>\n");

    section
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
