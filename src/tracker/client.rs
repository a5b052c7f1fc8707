//! GraphQL client for the Linear API.
//!
//! Walks the `issues` connection with cursor pagination until the server
//! reports no further pages, or the configured page ceiling is hit.

use crate::config::TrackerConfig;
use crate::error::FetchError;
use crate::models::{Issue, WorkflowState};
use chrono::{DateTime, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const ISSUES_QUERY: &str = r#"query Issues($first: Int!, $after: String) {
  issues(first: $first, after: $after, includeArchived: false) {
    nodes {
      id identifier title url
      createdAt updatedAt dueDate completedAt
      priority
      state { name type }
      assignee { name }
      project { name }
      team { name }
    }
    pageInfo { hasNextPage endCursor }
  }
}"#;

#[derive(Debug, Deserialize)]
struct IssuesData {
    issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueConnection {
    nodes: Vec<IssueNode>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    id: String,
    identifier: String,
    title: String,
    url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    due_date: Option<NaiveDate>,
    completed_at: Option<DateTime<Utc>>,
    priority: Option<f64>,
    state: StateNode,
    assignee: Option<NameRef>,
    project: Option<NameRef>,
    team: Option<NameRef>,
}

#[derive(Debug, Deserialize)]
struct StateNode {
    name: String,
    #[serde(rename = "type")]
    state_type: String,
}

#[derive(Debug, Deserialize)]
struct NameRef {
    name: String,
}

impl From<IssueNode> for Issue {
    fn from(n: IssueNode) -> Self {
        Issue {
            id: n.id,
            identifier: n.identifier,
            title: n.title,
            url: n.url,
            created_at: n.created_at,
            updated_at: n.updated_at,
            due_date: n.due_date,
            completed_at: n.completed_at,
            state: WorkflowState {
                name: n.state.name,
                category: n.state.state_type,
            },
            assignee: n.assignee.map(|a| a.name),
            project: n.project.map(|p| p.name),
            team: n.team.map(|t| t.name),
            // Linear reports priority as a float (0-4).
            priority: n.priority.map(|p| p.round().clamp(0.0, u8::MAX as f64) as u8),
        }
    }
}

/// One page of results.
#[derive(Debug)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Client for the tracker's GraphQL API.
pub struct TrackerClient {
    http_client: reqwest::Client,
    config: TrackerConfig,
    show_progress: bool,
}

impl TrackerClient {
    /// Create a client from tracker settings.
    pub fn new(config: TrackerConfig, show_progress: bool) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("issue-digest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            config,
            show_progress,
        })
    }

    /// Fetch every non-archived issue, following cursors until exhausted.
    ///
    /// Issues are returned in page order, then in the order the server
    /// listed them within each page.
    pub async fn fetch_all_issues(&self) -> Result<Vec<Issue>, FetchError> {
        if self.config.api_key.is_none() {
            return Err(FetchError::MissingCredential);
        }

        let progress = self.progress_bar();
        let result = self.fetch_pages(&progress).await;
        progress.finish_and_clear();

        let (issues, pages) = result?;
        info!("Fetched {} issues in {} pages", issues.len(), pages);
        Ok(issues)
    }

    async fn fetch_pages(&self, progress: &ProgressBar) -> Result<(Vec<Issue>, usize), FetchError> {
        let mut issues = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0;

        loop {
            if page == self.config.max_pages {
                return Err(FetchError::TooManyPages {
                    max_pages: self.config.max_pages,
                });
            }
            page += 1;

            let batch = self.fetch_page(cursor.as_deref()).await?;
            debug!(
                "Page {}: {} issues (has_next_page={})",
                page,
                batch.issues.len(),
                batch.has_next_page
            );

            issues.extend(batch.issues);
            progress.set_message(format!("Fetched {} issues ({} pages)", issues.len(), page));

            if !batch.has_next_page {
                return Ok((issues, page));
            }

            cursor = Some(batch.end_cursor.ok_or(FetchError::MissingCursor { page })?);
        }
    }

    /// Fetch a single page starting after `cursor`.
    pub async fn fetch_page(&self, cursor: Option<&str>) -> Result<IssuePage, FetchError> {
        let variables = serde_json::json!({
            "first": self.config.page_size,
            "after": cursor,
        });

        let data: IssuesData = self.graphql(ISSUES_QUERY, variables).await?;
        let connection = data.issues;

        Ok(IssuePage {
            issues: connection.nodes.into_iter().map(Issue::from).collect(),
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        })
    }

    async fn graphql<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, FetchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingCredential)?;

        let body = serde_json::json!({ "query": query, "variables": variables });
        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("Authorization", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized(status));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Status(status, text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        if let Some(errors) = json.get("errors") {
            return Err(FetchError::GraphQl(errors.to_string()));
        }

        let data = json
            .get("data")
            .filter(|d| !d.is_null())
            .ok_or_else(|| FetchError::Decode("missing 'data' in response".to_string()))?;

        Ok(serde_json::from_value(data.clone())?)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message("Fetching issues...");
        pb
    }
}
