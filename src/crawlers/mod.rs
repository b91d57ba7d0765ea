//! The extraction pipeline: walk the result pages, harvest their links, then
//! extract every linked article.

pub mod article;
pub mod harvest;
pub mod pagination;


use crate::browser::{self, Browser, Diagnostics};
use crate::error::CrawlError;
use crate::results::{ArticleRecord, LinkRecord};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Upper bound of every wait for an element to appear
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound of the initial wait for the pagination controls
pub const LAYOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// One article entry in the result list
pub const ENTRY_SELECTOR: &str = ".lft_art .art_detail";

/// The "1-10 of N results" counter
pub const COUNTER_SELECTOR: &str = ".results span";

/// Pagination controls or result counter, whichever renders
const LAYOUT_SELECTOR: &str = ".page, .results";

/// Politeness delays, in seconds.
///
/// Every pause draws a fresh duration from its range.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub between_pages: RangeInclusive<f64>,
    pub between_articles: RangeInclusive<f64>,
    pub after_article: RangeInclusive<f64>,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_pages: 3.0..=5.0,
            between_articles: 3.0..=6.0,
            after_article: 1.0..=2.0,
        }
    }
}

impl Pacing {
    pub async fn between_pages(&self) {
        pause(&self.between_pages, true).await;
    }

    pub async fn between_articles(&self) {
        pause(&self.between_articles, true).await;
    }

    pub async fn after_article(&self) {
        pause(&self.after_article, false).await;
    }
}

/// A uniformly random duration from `range`
pub fn draw(range: &RangeInclusive<f64>) -> Duration {
    Duration::from_secs_f64(rand::rng().random_range(range.clone()))
}

async fn pause(range: &RangeInclusive<f64>, announce: bool) {
    let delay = draw(range);
    if announce {
        ::log::info!("Waiting {:.1} seconds before continuing...", delay.as_secs_f64());
    } else {
        ::log::debug!("Pausing {:.1} seconds", delay.as_secs_f64());
    }
    tokio::time::sleep(delay).await;
}

/// Runs the whole pipeline against the search at `start_url`.
///
/// Returns the successfully extracted articles in link order; an empty list
/// when no links were found or every extraction failed. Only a failure to load
/// the search page itself is an error.
pub async fn run<B: Browser + ?Sized>(
    browser: &B,
    start_url: &str,
    diagnostics: &Diagnostics,
    pacing: &Pacing,
) -> Result<Vec<ArticleRecord>, CrawlError> {
    ::log::info!("Opening search page: {}", start_url);
    browser.goto(start_url).await?;

    if let Err(e) = browser::wait_for_any(browser, &[ENTRY_SELECTOR], WAIT_TIMEOUT).await {
        ::log::warn!("Result list did not load: {}", e);
    }
    if let Err(e) = browser::wait_for_any(browser, &[LAYOUT_SELECTOR], LAYOUT_TIMEOUT).await {
        ::log::warn!("Pagination controls did not load: {}", e);
    }

    let total_pages = match browser.source().await {
        Ok(source) => pagination::infer_total_pages(&source),
        Err(e) => {
            ::log::warn!("Could not read search page, assuming 1 page: {}", e);
            1
        }
    };
    ::log::info!("Detected {} result pages", total_pages);

    let links = pagination::walk(browser, total_pages, diagnostics, pacing, Vec::new()).await;
    if links.is_empty() {
        ::log::warn!("No article links found");
        return Ok(Vec::new());
    }

    Ok(extract_all(browser, &links, diagnostics, pacing).await)
}

/// Extracts every link in order, keeping only the articles that succeeded
pub async fn extract_all<B: Browser + ?Sized>(
    browser: &B,
    links: &[LinkRecord],
    diagnostics: &Diagnostics,
    pacing: &Pacing,
) -> Vec<ArticleRecord> {
    let mut records = Vec::with_capacity(links.len());

    for (i, link) in links.iter().enumerate() {
        ::log::info!("Processing article {}/{}: {}", i + 1, links.len(), link.title);

        match article::extract(browser, &link.url, diagnostics, pacing).await {
            Ok(extracted) => records.push(ArticleRecord::from_parts(link, extracted)),
            Err(e) => ::log::warn!("No content extracted from {}: {}", link.url, e),
        }

        pacing.between_articles().await;
    }

    ::log::info!(
        "Extracted {} of {} articles",
        records.len(),
        links.len()
    );
    records
}

#[cfg(test)]
mod pacing_tests {
    use super::*;

    #[test]
    fn test_draw_stays_in_range() {
        let range = 1.0..=2.0;
        for _ in 0..200 {
            let d = draw(&range).as_secs_f64();
            assert!((1.0..=2.0).contains(&d), "{} out of range", d);
        }
    }

    #[test]
    fn test_draws_are_independent() {
        let range = 3.0..=6.0;
        let draws = (0..20).map(|_| draw(&range)).collect::<Vec<_>>();
        assert!(draws.iter().any(|d| *d != draws[0]));
    }
}
