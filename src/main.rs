use clap::Parser;
use news_harvest::{Browser, WebDriverBrowser};
use std::error::Error;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging, RUST_LOG still wins
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.load_config()?;

    println!("Note: harvesting requires a WebDriver server (e.g. msedgedriver or ChromeDriver).");
    println!("Set WEBDRIVER_URL or --webdriver-url if not using {}", config.webdriver_url);

    ::log::info!("Starting browser session via {}", config.webdriver_url);
    let browser = WebDriverBrowser::connect(&config).await?;

    let start_time = std::time::Instant::now();
    let outcome = news_harvest::harvest(&browser, &config).await;

    // The session is released on every path
    match browser.quit().await {
        Ok(()) => ::log::info!("Browser closed"),
        Err(e) => ::log::warn!("Failed to close browser session: {}", e),
    }

    let report = outcome?;
    match report.output {
        Some(path) => println!(
            "Extracted {} articles in {:.0} seconds, saved to {}",
            report.articles,
            start_time.elapsed().as_secs_f64(),
            path.display()
        ),
        None => println!("No article data extracted, nothing written"),
    }
    Ok(())
}
