//! Digest rendering.
//!
//! Renderers are pure functions over a [`StatsSummary`]; delivery lives in
//! [`crate::publish`].

pub mod chat;
pub mod email;

pub use chat::{render_chat_payload, render_chat_text, ChatPayload};
pub use email::render_email_html;

use crate::models::StatsSummary;
use anyhow::Result;

/// Render the summary as pretty-printed JSON.
pub fn render_json(summary: &StatsSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_stats;
    use crate::models::fixtures::{issue, now};

    #[test]
    fn test_render_json() {
        let summary = compute_stats(&[issue("ENG-1")], now());
        let json = render_json(&summary).unwrap();

        assert!(json.contains("\"open_count\": 1"));
        assert!(json.contains("\"by_assignee\""));
        assert!(json.contains("\"Unassigned\""));

        let parsed: StatsSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
