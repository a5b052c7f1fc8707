//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.issue-digest.toml` files, environment variables and CLI flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".issue-digest.toml";

/// Largest page the tracker API accepts.
pub const MAX_PAGE_SIZE: usize = 250;

/// Longest "completed" window, in days.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tracking API settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Chat webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Email settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Aggregation and rendering settings.
    #[serde(default)]
    pub digest: DigestConfig,
}

/// Tracking API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key sent in the `Authorization` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Issues requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper bound on the number of pages fetched in one run.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.linear.app/graphql".to_string()
}

fn default_page_size() -> usize {
    200
}

fn default_max_pages() -> usize {
    500
}

fn default_timeout() -> u64 {
    30
}

/// Chat webhook settings. The sink is skipped when `url` is unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL to POST the digest to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// SMTP settings. The sink is skipped when `smtp_host` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,

    /// Sender address. Falls back to the SMTP user, then `issue-digest@localhost`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Comma-separated recipients. Falls back to the sender address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Subject line of the digest email.
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_password: None,
            from: None,
            to: None,
            subject: default_subject(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_subject() -> String {
    "Issue Digest".to_string()
}

impl EmailConfig {
    /// The sender address after applying fallbacks.
    pub fn from_address(&self) -> String {
        self.from
            .clone()
            .or_else(|| self.smtp_user.clone())
            .unwrap_or_else(|| "issue-digest@localhost".to_string())
    }

    /// The recipient list after applying fallbacks.
    pub fn to_addresses(&self) -> Vec<String> {
        let raw = self.to.clone().unwrap_or_else(|| self.from_address());
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Aggregation and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Title of the chat message.
    #[serde(default = "default_title")]
    pub title: String,

    /// Trailing window for "completed this week", in days.
    #[serde(default = "default_window_days")]
    pub completed_window_days: i64,

    /// Overdue issues listed in the chat message.
    #[serde(default = "default_chat_limit")]
    pub chat_overdue_limit: usize,

    /// Overdue issues listed in the email.
    #[serde(default = "default_email_limit")]
    pub email_overdue_limit: usize,

    /// Deliver to all sinks concurrently instead of one after another.
    #[serde(default)]
    pub parallel_delivery: bool,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            completed_window_days: default_window_days(),
            chat_overdue_limit: default_chat_limit(),
            email_overdue_limit: default_email_limit(),
            parallel_delivery: false,
        }
    }
}

fn default_title() -> String {
    "Issue Digest".to_string()
}

fn default_window_days() -> i64 {
    7
}

fn default_chat_limit() -> usize {
    10
}

fn default_email_limit() -> usize {
    15
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Values from flags or environment variables take precedence over the
    /// config file; anything left unset keeps the file's value.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.tracker.api_url = url.clone();
        }
        if let Some(ref key) = args.api_key {
            self.tracker.api_key = Some(key.clone());
        }
        if let Some(page_size) = args.page_size {
            self.tracker.page_size = page_size;
        }
        if let Some(max_pages) = args.max_pages {
            self.tracker.max_pages = max_pages;
        }

        if let Some(ref url) = args.webhook_url {
            self.webhook.url = Some(url.clone());
        }

        if let Some(ref host) = args.smtp_host {
            self.email.smtp_host = Some(host.clone());
        }
        if let Some(port) = args.smtp_port {
            self.email.smtp_port = port;
        }
        if let Some(ref user) = args.smtp_user {
            self.email.smtp_user = Some(user.clone());
        }
        if let Some(ref password) = args.smtp_password {
            self.email.smtp_password = Some(password.clone());
        }
        if let Some(ref from) = args.mail_from {
            self.email.from = Some(from.clone());
        }
        if let Some(ref to) = args.mail_to {
            self.email.to = Some(to.clone());
        }

        // Flags always override
        if args.parallel_delivery {
            self.digest.parallel_delivery = true;
        }

        self.drop_blank_values();
    }

    /// Treat empty strings (e.g. `SMTP_HOST=`) as unset.
    fn drop_blank_values(&mut self) {
        for value in [
            &mut self.tracker.api_key,
            &mut self.webhook.url,
            &mut self.email.smtp_host,
            &mut self.email.smtp_user,
            &mut self.email.smtp_password,
            &mut self.email.from,
            &mut self.email.to,
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
    }

    /// Check numeric settings that come from the config file.
    ///
    /// CLI flags are checked by `Args::validate`; this covers the merged result.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.tracker.page_size) {
            bail!(
                "tracker.page_size must be between 1 and {} (got {})",
                MAX_PAGE_SIZE,
                self.tracker.page_size
            );
        }

        if self.tracker.max_pages == 0 {
            bail!("tracker.max_pages must be at least 1");
        }

        if self.tracker.timeout_seconds == 0 {
            bail!("tracker.timeout_seconds must be at least 1");
        }

        if !(1..=MAX_WINDOW_DAYS).contains(&self.digest.completed_window_days) {
            bail!(
                "digest.completed_window_days must be between 1 and {} (got {})",
                MAX_WINDOW_DAYS,
                self.digest.completed_window_days
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.api_url, "https://api.linear.app/graphql");
        assert_eq!(config.tracker.page_size, 200);
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.digest.chat_overdue_limit, 10);
        assert_eq!(config.digest.email_overdue_limit, 15);
        assert!(config.webhook.url.is_none());
        assert!(config.email.smtp_host.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[tracker]
page_size = 50
max_pages = 10

[webhook]
url = "https://discord.com/api/webhooks/1/abc"

[email]
smtp_host = "smtp.example.com"
smtp_port = 465
to = "team@example.com, lead@example.com"

[digest]
chat_overdue_limit = 5
parallel_delivery = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.tracker.page_size, 50);
        assert_eq!(config.tracker.max_pages, 10);
        assert_eq!(config.tracker.timeout_seconds, 30);
        assert_eq!(
            config.webhook.url.as_deref(),
            Some("https://discord.com/api/webhooks/1/abc")
        );
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(
            config.email.to_addresses(),
            vec!["team@example.com", "lead@example.com"]
        );
        assert_eq!(config.digest.chat_overdue_limit, 5);
        assert_eq!(config.digest.email_overdue_limit, 15);
        assert!(config.digest.parallel_delivery);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[email]\nsmtp_host = \"mail.local\"\nsmtp_port = 1025").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.email.smtp_host.as_deref(), Some("mail.local"));
        assert_eq!(config.email.smtp_port, 1025);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tracker\npage_size = ").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_email_address_fallbacks() {
        let mut email = EmailConfig::default();
        assert_eq!(email.from_address(), "issue-digest@localhost");
        assert_eq!(email.to_addresses(), vec!["issue-digest@localhost"]);

        email.smtp_user = Some("bot@example.com".to_string());
        assert_eq!(email.from_address(), "bot@example.com");
        assert_eq!(email.to_addresses(), vec!["bot@example.com"]);

        email.from = Some("digest@example.com".to_string());
        email.to = Some("team@example.com".to_string());
        assert_eq!(email.from_address(), "digest@example.com");
        assert_eq!(email.to_addresses(), vec!["team@example.com"]);
    }

    #[test]
    fn test_merge_with_args_overrides_file() {
        let mut config: Config = toml::from_str(
            r#"
[tracker]
api_key = "from-file"
page_size = 100

[email]
smtp_host = "file.example.com"
"#,
        )
        .unwrap();

        let args = temp_env::with_vars_unset(crate::cli::tests::ENV_VARS, || {
            Args::try_parse_from([
                "issue-digest",
                "--api-key",
                "from-cli",
                "--webhook-url",
                "https://hooks.example.com/x",
                "--smtp-host",
                "",
                "--parallel-delivery",
            ])
            .unwrap()
        });
        config.merge_with_args(&args);

        assert_eq!(config.tracker.api_key.as_deref(), Some("from-cli"));
        assert_eq!(config.tracker.page_size, 100);
        assert_eq!(
            config.webhook.url.as_deref(),
            Some("https://hooks.example.com/x")
        );
        assert!(config.email.smtp_host.is_none());
        assert!(config.digest.parallel_delivery);
    }

    fn parse(toml_content: &str) -> Config {
        toml::from_str(toml_content).unwrap()
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(parse("[tracker]\npage_size = 0").validate().is_err());
        assert!(parse("[tracker]\npage_size = 300").validate().is_err());
        assert!(parse("[tracker]\npage_size = 250").validate().is_ok());
        assert!(parse("[tracker]\npage_size = 1").validate().is_ok());
    }

    #[test]
    fn test_validate_max_pages() {
        let err = parse("[tracker]\nmax_pages = 0").validate().unwrap_err();
        assert!(err.to_string().contains("max_pages"));
        assert!(parse("[tracker]\nmax_pages = 1").validate().is_ok());
    }

    #[test]
    fn test_validate_timeout() {
        assert!(parse("[tracker]\ntimeout_seconds = 0").validate().is_err());
    }

    #[test]
    fn test_validate_completed_window() {
        assert!(parse("[digest]\ncompleted_window_days = 0").validate().is_err());
        assert!(parse("[digest]\ncompleted_window_days = -3").validate().is_err());
        assert!(parse("[digest]\ncompleted_window_days = 1000000000")
            .validate()
            .is_err());
        assert!(parse("[digest]\ncompleted_window_days = 30").validate().is_ok());
    }

    #[test]
    fn test_validate_after_cli_merge() {
        let mut config = parse("[tracker]\npage_size = 0");
        let args = temp_env::with_vars_unset(crate::cli::tests::ENV_VARS, || {
            Args::try_parse_from(["issue-digest", "--page-size", "100"]).unwrap()
        });
        config.merge_with_args(&args);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[tracker]"));
        assert!(toml_str.contains("[email]"));
        assert!(toml_str.contains("[digest]"));
        assert!(!toml_str.contains("api_key"));
    }
}
