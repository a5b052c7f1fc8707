//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and environment-variable sourcing.

use clap::Parser;
use std::path::PathBuf;

/// issue-digest - weekly issue statistics for your team
///
/// Pulls every non-archived issue from Linear, computes open/overdue
/// statistics and posts the digest to a chat webhook and/or by email.
/// A sink without a destination is skipped.
///
/// Examples:
///   LINEAR_API_KEY=lin_api_... DISCORD_WEBHOOK_URL=https://... issue-digest
///   issue-digest --dry-run --format html > digest.html
///   issue-digest --config team.toml --parallel-delivery
///   issue-digest --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .issue-digest.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tracker API key
    #[arg(long, env = "LINEAR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Tracker GraphQL endpoint
    #[arg(long, value_name = "URL", env = "LINEAR_API_URL")]
    pub api_url: Option<String>,

    /// Issues requested per page (1-250)
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Stop with an error after this many pages
    #[arg(long, value_name = "COUNT")]
    pub max_pages: Option<usize>,

    /// Chat webhook URL; the chat digest is skipped when unset
    #[arg(long, value_name = "URL", env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// SMTP server host; the email digest is skipped when unset
    #[arg(long, value_name = "HOST", env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP server port (465 = TLS, 587 = STARTTLS, other = plain)
    #[arg(long, value_name = "PORT", env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// SMTP username
    #[arg(long, value_name = "USER", env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, value_name = "PASSWORD", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address (defaults to the SMTP user)
    #[arg(long, value_name = "ADDRESS", env = "MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Recipient addresses, comma-separated (defaults to the sender)
    #[arg(long, value_name = "ADDRESSES", env = "MAIL_TO")]
    pub mail_to: Option<String>,

    /// Deliver to the webhook and email at the same time
    ///
    /// Both sinks are attempted even if one fails.
    #[arg(long)]
    pub parallel_delivery: bool,

    /// Fetch and aggregate, print the digest, deliver nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .issue-digest.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for --dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// The chat message text (default)
    #[default]
    Text,
    /// The email HTML document
    Html,
    /// The statistics summary as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(page_size) = self.page_size {
            if page_size == 0 || page_size > crate::config::MAX_PAGE_SIZE {
                return Err(format!(
                    "Page size must be between 1 and {}",
                    crate::config::MAX_PAGE_SIZE
                ));
            }
        }

        if self.max_pages == Some(0) {
            return Err("Max pages must be at least 1".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref url) = self.webhook_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Webhook URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
