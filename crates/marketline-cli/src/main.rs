//! marketline - Product catalog harvester for Tiki, Shopee and Lazada
//!
//! Crawls every configured seller's listing, fetches product details and
//! variants under one shared concurrency limit, and writes one JSON batch
//! per seller.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "marketline")]
#[command(about = "Product catalog harvester for Tiki, Shopee and Lazada")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./marketline.toml or ~/.config/marketline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Maximum detail/variant requests in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest the catalogs of configured sellers
    Harvest(cmd::harvest::HarvestArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(marketline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug: progress bars show activity
    //   non-TTY: info unless --debug: logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    marketline_core::init_logging(quiet, cli.debug, multi);

    let mut config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(n) = cli.max_retries {
        config.http.max_retries = n;
    }
    if let Some(n) = cli.concurrency {
        config.http.max_concurrency = n;
    }

    match cli.command {
        Command::Harvest(args) => cmd::harvest::run(args, &config, &progress),
        Command::Config => {
            cmd::show_config(&config, &progress);
            Ok(ExitCode::SUCCESS)
        }
    }
}
