//! # Daily Digest
//!
//! Reads the day's story activity from the project tracker and posts a
//! grouped summary to a Slack channel on weekday evenings.
//!
//! Usage:
//!   daily-digest                          # Start the scheduler (default)
//!   daily-digest generate --date 2026-10-19   # Print the digest
//!   daily-digest post                     # Build and post today's digest once

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use digest_channels::SlackNotifier;
use digest_core::DigestConfig;
use digest_report::DailyReport;
use digest_scheduler::{SchedulerEngine, Task, spawn_scheduler};
use digest_tracker::PivotalClient;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "daily-digest",
    version,
    about = "📋 Daily Digest — tracker activity summary for Slack"
)]
struct Cli {
    /// Config file (default: ~/.daily-digest/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the scheduler and post on every matching slot
    Run,
    /// Build the digest and print it
    Generate {
        /// Day to report on, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Build the digest and post it once
    Post {
        /// Day to report on, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn load_config(path: Option<&str>) -> Result<DigestConfig> {
    let mut config = match path {
        Some(p) => DigestConfig::load_from(std::path::Path::new(&expand_path(p)))?,
        None => DigestConfig::load()?,
    };
    config.apply_env();
    Ok(config)
}

fn build_report(config: &DigestConfig) -> Result<DailyReport> {
    config.validate_tracker()?;
    let client = PivotalClient::new(config.tracker.clone())?;
    Ok(DailyReport::new(
        Arc::new(client),
        &config.tracker,
        config.report.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "daily_digest=debug,digest_core=debug,digest_tracker=debug,digest_report=debug,digest_channels=debug,digest_scheduler=debug"
    } else {
        "daily_digest=info,digest_core=info,digest_tracker=info,digest_report=info,digest_channels=info,digest_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Generate { date } => {
            let report = build_report(&config)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let message = report.generate(date).await?;
            println!("{message}");
        }
        Command::Post { date } => {
            config.validate_slack()?;
            let report = build_report(&config)?;
            let notifier = SlackNotifier::new(config.slack.clone())?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            report.deliver(date, &notifier, &config.slack.channel).await?;
        }
        Command::Run => run_scheduler(config).await?,
    }

    Ok(())
}

async fn run_scheduler(config: DigestConfig) -> Result<()> {
    config.validate_slack()?;
    let report = Arc::new(build_report(&config)?);
    let notifier = Arc::new(SlackNotifier::new(config.slack.clone())?);
    let channel = config.slack.channel.clone();

    match notifier.auth_test().await {
        Ok(user) => tracing::info!("Slack token OK (posting as @{user})"),
        Err(e) => tracing::warn!("⚠️ Slack auth check failed: {e}"),
    }

    let mut engine = SchedulerEngine::new();
    engine.add_task(Task::cron("daily-digest", &config.schedule.cron)?, &Local::now());
    let engine = Arc::new(Mutex::new(engine));

    let on_trigger = move |name: String, fired_at: chrono::DateTime<Local>| {
        let report = report.clone();
        let notifier = notifier.clone();
        let channel = channel.clone();
        async move {
            tracing::info!("📣 [{name}] writing daily to slack");
            let date = fired_at.date_naive();
            if let Err(e) = report.deliver(date, notifier.as_ref(), &channel).await {
                tracing::warn!("⚠️ [{name}] no digest for {date}: {e}");
            }
        }
    };

    tokio::select! {
        _ = spawn_scheduler(engine, on_trigger, config.schedule.check_interval_secs) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}
