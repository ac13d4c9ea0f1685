//! clipharvest - keyword-driven stock footage downloader
//!
//! Searches the material catalogue of a video editor's web API for each
//! keyword and downloads the matching clips, their covers and a batch report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipharvest::app::{self, SettingsOverrides};
use clipharvest::orchestrator::{BatchStats, DownloadStatusReport, KeywordStats};
use clipharvest::utils::config::DEFAULT_CONFIG_PATH;
use clipharvest::utils::logging::init_logging;
use clipharvest::utils::{format_duration, AppSettings};
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "clipharvest", version, about = "Keyword-driven stock footage downloader")]
struct Args {
    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides download.download_dir
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Browser cookie string, e.g. "sessionid=...; sid_tt=..."
    #[arg(long)]
    cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download every page of one keyword
    Download {
        keyword: String,
        /// Pages to fetch (default: search.max_pages)
        #[arg(long)]
        pages: Option<u32>,
        /// Concurrent downloads per page
        #[arg(long)]
        workers: Option<usize>,
        /// Preferred resolution label, e.g. 1080p
        #[arg(long)]
        resolution: Option<String>,
        /// Skip cover images
        #[arg(long)]
        no_covers: bool,
    },
    /// Download several keywords in order (default: search.keywords)
    Batch { keywords: Vec<String> },
    /// Show what has been downloaded so far
    Status,
    /// Validate the settings and cookies
    Check,
    /// Write the effective settings to the settings file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = SettingsOverrides {
        download_dir: args.download_dir.clone(),
        cookie: args.cookie.clone(),
    };
    let mut settings = app::load_settings(&args.config, &overrides)?;

    if let Command::Download {
        workers,
        resolution,
        no_covers,
        ..
    } = &args.command
    {
        if let Some(workers) = workers {
            settings.download.max_workers = *workers;
        }
        if let Some(resolution) = resolution {
            settings.download.preferred_resolution = resolution.clone();
        }
        if *no_covers {
            settings.download.download_covers = false;
        }
    }

    // Initialize logging
    if let Some(log_path) = init_logging(&settings.logging)? {
        info!("Logging to {}", log_path.display());
    }

    for problem in settings.validate() {
        warn!("Configuration: {}", problem);
    }

    match args.command {
        Command::Download { keyword, pages, .. } => {
            let orchestrator = app::build_orchestrator(&settings)?;
            if let Some(stats) = interruptible(orchestrator.download_keyword(&keyword, pages)).await {
                print_keyword(&stats?);
            }
        }
        Command::Batch { keywords } => {
            let orchestrator = app::build_orchestrator(&settings)?;
            if let Some(stats) = interruptible(orchestrator.batch_download(&keywords)).await {
                print_batch(&stats?);
            }
        }
        Command::Status => {
            let orchestrator = app::build_orchestrator(&settings)?;
            print_status(&orchestrator.status().await?);
        }
        Command::Check => print_check(&settings),
        Command::InitConfig => {
            settings
                .save(&args.config)
                .with_context(|| format!("Failed to write {}", args.config.display()))?;
            println!("Settings written to {}", args.config.display());
        }
    }

    Ok(())
}

/// Runs `work` until it finishes or Ctrl-C is pressed.
///
/// Dropping the future on interruption removes any partially written file.
async fn interruptible<T>(work: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        result = work => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping downloads");
            println!("\nInterrupted.");
            None
        }
    }
}

fn print_keyword(stats: &KeywordStats) {
    println!("\nKeyword: {}", stats.keyword);
    println!("  Found:      {}", stats.total_found);
    println!("  Downloaded: {}", stats.total_downloaded);
    println!("  Failed:     {}", stats.failed_downloads);
    for video in stats.videos.iter().filter(|v| v.success) {
        println!(
            "  [{}] {} - {}",
            format_duration(video.duration),
            video.title,
            video.author
        );
    }
}

fn print_batch(batch: &BatchStats) {
    println!("\nBatch finished");
    println!(
        "  Keywords:   {}/{} completed",
        batch.completed_keywords, batch.total_keywords
    );
    println!("  Found:      {}", batch.total_found);
    println!("  Downloaded: {}", batch.total_downloaded);
    println!("  Failed:     {}", batch.total_failed);
    if let Some(finished_at) = batch.finished_at {
        let elapsed = (finished_at - batch.started_at).num_seconds().max(0) as u64;
        println!("  Elapsed:    {}", format_duration(elapsed));
    }
    for stats in &batch.keyword_stats {
        match &stats.error {
            Some(error) => println!("  - {}: failed ({})", stats.keyword, error),
            None => println!(
                "  - {}: {}/{} downloaded",
                stats.keyword, stats.total_downloaded, stats.total_found
            ),
        }
    }
}

fn print_status(report: &DownloadStatusReport) {
    match report {
        DownloadStatusReport::NotStarted => println!("Nothing downloaded yet."),
        DownloadStatusReport::Active {
            total_files,
            total_size,
            keyword_stats,
            download_dir,
            ..
        } => {
            println!("Download directory: {}", download_dir.display());
            println!("Total files: {} ({})", total_files, total_size);
            for (keyword, counts) in keyword_stats {
                println!(
                    "  {}: {} videos, {} covers",
                    keyword, counts.videos, counts.covers
                );
            }
        }
    }
}

fn print_check(settings: &AppSettings) {
    let problems = settings.validate();
    if problems.is_empty() {
        println!("Configuration OK");
    } else {
        println!("Configuration problems:");
        for problem in &problems {
            println!("  - {}", problem);
        }
    }

    if settings.is_cookies_configured() {
        println!("Cookies: configured");
    } else {
        println!("Cookies: missing {}", settings.missing_cookies().join(", "));
    }
    println!(
        "Download directory: {}",
        settings.download.download_dir.display()
    );
    println!("Largest accepted clip: {}", format_duration(settings.search.max_duration));
}
