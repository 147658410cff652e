use clap::Parser;
use yield_sections::service::{self, ScrapeRequest, ServiceError};

mod args;
use args::{Args, Command, build_scraper};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        Command::Scrape(scrape) => {
            let scraper = build_scraper(args.config.as_ref(), Some(scrape))?;
            ::log::info!("Scraping {}", scrape.url);
            ::log::debug!("Using WebDriver at {}", scraper.config().webdriver_url);

            let request = ScrapeRequest {
                url: scrape.url.clone(),
            };
            let response = match service::handle_scrape(&scraper, request).await {
                Ok(response) => response,
                Err(ServiceError::BadRequest(reason)) => {
                    return Err(format!("invalid URL {:?}: {}", scrape.url, reason).into());
                }
                Err(e) => return Err(e.into()),
            };

            let json = if scrape.pretty {
                serde_json::to_string_pretty(&response)?
            } else {
                serde_json::to_string(&response)?
            };
            println!("{}", json);
        }
        Command::Serve { host, port } => {
            let scraper = build_scraper(args.config.as_ref(), None)?;
            println!("Note: rendering requires a WebDriver server (e.g., ChromeDriver).");
            println!(
                "Set WEBDRIVER_URL if not using {}",
                scraper.config().webdriver_url
            );
            yield_sections::server::serve(scraper, host, *port).await?;
        }
    }
    Ok(())
}
