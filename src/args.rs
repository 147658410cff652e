use clap::{Parser, Subcommand};
use std::path::PathBuf;
use yield_sections::{Scraper, ScraperConfig};

#[derive(Parser, Debug)]
#[command(name = "yield-sections")]
#[command(about = "Extracts typed content sections from web pages")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file (fields not given keep their defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape one URL and print the response as JSON
    Scrape(ScrapeArgs),

    /// Serve the scrape API over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(clap::Args, Debug)]
pub struct ScrapeArgs {
    /// URL to scrape (https:// is assumed when no scheme is given)
    pub url: String,

    /// Maximum number of sections to keep
    #[arg(long)]
    pub max_sections: Option<usize>,

    /// Maximum number of scrolls while rendering
    #[arg(long)]
    pub max_scrolls: Option<u32>,

    /// Maximum number of next pages to record
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Static request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Build the scraper from the config file, the environment and the flags
pub fn build_scraper(
    config: Option<&PathBuf>,
    scrape: Option<&ScrapeArgs>,
) -> Result<Scraper, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };
    let mut scraper = Scraper::new(config.with_env_overrides());

    if let Some(args) = scrape {
        if let Some(value) = args.max_sections {
            scraper = scraper.with_max_sections(value);
        }
        if let Some(value) = args.max_scrolls {
            scraper = scraper.with_max_scrolls(value);
        }
        if let Some(value) = args.max_pages {
            scraper = scraper.with_max_pages(value);
        }
        if let Some(value) = args.timeout {
            scraper = scraper.with_request_timeout(value);
        }
    }

    Ok(scraper)
}
