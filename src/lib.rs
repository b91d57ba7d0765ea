//! Harvests China Daily search results into a CSV file.
//!
//! A [`browser::Browser`] session walks the result pages of one fixed search,
//! collects the article links, opens every article in an isolated view to pull
//! its title and body, and hands the records to [`sink`].

pub mod browser;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod parsers;
pub mod results;
pub mod sink;
pub mod utils;

// Re-export commonly used types for convenience
pub use browser::{Browser, Diagnostics, WebDriverBrowser};
pub use config::{HarvestConfig, SEARCH_URL};
pub use crawlers::Pacing;
pub use error::CrawlError;
pub use results::{ArticleRecord, ExtractedArticle, LinkRecord};

use std::path::PathBuf;

/// What a finished harvest produced
#[derive(Debug)]
pub struct HarvestReport {
    pub articles: usize,
    /// `None` when nothing was extracted and no file was written
    pub output: Option<PathBuf>,
}

/// Runs the fixed search through `browser` and saves the result.
///
/// Does not close the session; the caller owns it.
pub async fn harvest<B: Browser + ?Sized>(
    browser: &B,
    config: &HarvestConfig,
) -> Result<HarvestReport, CrawlError> {
    std::fs::create_dir_all(&config.output_dir)?;
    std::fs::create_dir_all(&config.diagnostics_dir)?;

    let diagnostics = Diagnostics::new(&config.diagnostics_dir);
    let records = crawlers::run(browser, SEARCH_URL, &diagnostics, &Pacing::default()).await?;

    let output = sink::save(&records, &config.output_dir, &config.output_prefix)?;
    Ok(HarvestReport {
        articles: records.len(),
        output,
    })
}
