// Command-line front end for the media scraper
//
// Runs one scrape and prints the result as JSON. Errors are reported with a
// generic message and a non-zero exit status; details go to the log.

use anyhow::{Context, Result};
use clap::Parser;
use kodegen_tools_mediascrape::{ScrapeConfig, ScrapeError, Scraper};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kodegen-mediascrape")]
#[command(about = "Scrape media listings from hostile sites")]
struct Cli {
    /// Source to scrape (peakpx, pixiv)
    source: String,

    /// Search query
    query: String,

    /// Page number; invalid values fall back to 1
    page: Option<String>,

    /// Maximum concurrently open browser pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// JSON config file; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<ScrapeConfig> {
    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<ScrapeConfig>(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => ScrapeConfig::default(),
    };

    let mut builder = config.to_builder();
    if let Some(max_pages) = cli.max_pages {
        builder = builder.max_pages(max_pages);
    }
    if cli.headful {
        builder = builder.headless(false);
    }
    builder.build()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let scraper = match load_config(&cli).and_then(Scraper::new) {
        Ok(scraper) => scraper,
        Err(e) => {
            tracing::error!("Startup failed: {e:#}");
            eprintln!("error: could not start scraper");
            return ExitCode::FAILURE;
        }
    };

    let result = match scraper.request(&cli.source, &cli.query, cli.page.as_deref()) {
        Ok(request) => {
            let ctrl_c = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            scraper.scrape_until(&request, ctrl_c).await
        }
        Err(e) => Err(e),
    };

    scraper.shutdown().await;

    match result {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Failed to serialize result: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!("Scrape failed: {e}");
            let hint = match &e {
                ScrapeError::Validation(_) | ScrapeError::UnknownSource(_) => "invalid request",
                ScrapeError::Blocked { .. } => "source is blocking requests; try again later",
                ScrapeError::Cancelled => "cancelled",
                _ => "scrape failed",
            };
            eprintln!("error: {hint}");
            ExitCode::FAILURE
        }
    }
}
