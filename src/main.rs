//! issue-digest - weekly issue statistics for chat and email
//!
//! Fetches every non-archived issue from the tracker, aggregates open,
//! overdue and recently completed counts, and delivers the digest to a chat
//! webhook and/or an email address.
//!
//! Exit codes:
//!   0 - Success (including runs where every sink was skipped)
//!   1 - Any error (configuration, fetch, delivery)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod publish;
mod report;
mod tracker;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use cli::{Args, OutputFormat};
use config::Config;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("issue-digest v{}", env!("CARGO_PKG_VERSION"));
    debug!("Dry run: {}, format: {:?}", args.dry_run, args.format);

    match run_digest(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Digest failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .issue-digest.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::DEFAULT_CONFIG_FILE);
    println!("   Secrets are best kept in LINEAR_API_KEY, SMTP_PASSWORD, etc.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Fetch, aggregate and deliver one digest.
async fn run_digest(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // One evaluation instant for the whole run.
    let now = Utc::now();

    // Step 1: Fetch
    if !args.quiet {
        println!("📥 Fetching issues from {}", config.tracker.api_url);
    }
    let client = tracker::TrackerClient::new(config.tracker.clone(), !args.quiet)?;
    let issues = client
        .fetch_all_issues()
        .await
        .context("Failed to fetch issues")?;

    // Step 2: Aggregate
    let window_days = config.digest.completed_window_days;
    let summary = if window_days == analysis::COMPLETED_WINDOW_DAYS {
        analysis::compute_stats(&issues, now)
    } else {
        analysis::compute_stats_with_window(&issues, now, Duration::days(window_days))
    };
    drop(issues);
    info!(
        "{} open, {} overdue, {} completed in the last {} days",
        summary.open_count,
        summary.overdue_count,
        summary.completed_this_week.len(),
        config.digest.completed_window_days
    );

    // Step 3: Render or deliver
    if args.dry_run {
        let output = match args.format {
            OutputFormat::Text => report::render_chat_text(&summary, config.digest.chat_overdue_limit),
            OutputFormat::Html => report::render_email_html(
                &summary,
                &config.email.subject,
                config.digest.email_overdue_limit,
            ),
            OutputFormat::Json => report::render_json(&summary)?,
        };
        println!("{}", output);
        return Ok(());
    }

    let sinks = publish::configured_sinks(&config)?;
    if sinks.is_empty() {
        warn!("No webhook URL or SMTP host configured; nothing to deliver");
    }

    let delivered = publish::deliver_all(&sinks, &summary, &config)
        .await
        .context("Failed to deliver digest")?;

    if !args.quiet {
        println!("\n📊 Digest Summary:");
        println!("   Open: {} | Overdue: {}", summary.open_count, summary.overdue_count);
        println!("   Completed this week: {}", summary.completed_this_week.len());
        if !delivered.is_empty() {
            println!("   Delivered via: {}", delivered.join(", "));
        }
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    }
    println!("✅ Digest complete");

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
