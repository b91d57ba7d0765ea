use crate::browser::{self, Browser};
use crate::crawlers::{ENTRY_SELECTOR, WAIT_TIMEOUT};
use crate::error::CrawlError;
use crate::parsers::html;
use crate::results::LinkRecord;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ENTRY: LazyLock<Selector> = LazyLock::new(|| html::css(ENTRY_SELECTOR));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| html::css("h4 a"));
static SOURCE_TIME: LazyLock<Selector> = LazyLock::new(|| html::css("b"));

/// Collects the article links of the results page shown in the main view.
///
/// A page whose entries never appear yields an empty list; it is skipped, not
/// retried.
pub async fn harvest<B: Browser + ?Sized>(browser: &B) -> Vec<LinkRecord> {
    ::log::info!("Collecting article links...");

    if let Err(e) = browser::wait_for_any(browser, &[ENTRY_SELECTOR], WAIT_TIMEOUT).await {
        ::log::warn!("Result list did not load: {}", e);
        return Vec::new();
    }

    match snapshot(browser).await {
        Ok((source, base)) => parse_link_records(&source, &base),
        Err(e) => {
            ::log::error!("Could not read results page: {}", e);
            Vec::new()
        }
    }
}

async fn snapshot<B: Browser + ?Sized>(browser: &B) -> Result<(String, Url), CrawlError> {
    let source = browser.source().await?;
    let base = browser.current_url().await?;
    Ok((source, base))
}

/// Pulls every well-formed entry out of a results page snapshot, in DOM order
pub fn parse_link_records(source: &str, base: &Url) -> Vec<LinkRecord> {
    let doc = Html::parse_document(source);
    let entries = doc.select(&ENTRY).collect::<Vec<_>>();
    ::log::info!("Found {} result entries", entries.len());

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match parse_entry(entry, base) {
            Ok(record) => Some(record),
            Err(e) => {
                ::log::warn!("Skipping result entry {}: {}", i + 1, e);
                None
            }
        })
        .collect()
}

fn parse_entry(entry: ElementRef<'_>, base: &Url) -> Result<LinkRecord, CrawlError> {
    let link = entry
        .select(&TITLE_LINK)
        .next()
        .ok_or_else(|| CrawlError::MalformedEntry("no title link".to_string()))?;

    let href = link
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| CrawlError::MalformedEntry("title link has no href".to_string()))?;

    let url = base
        .join(href)
        .map_err(|e| CrawlError::MalformedEntry(format!("bad href {}: {}", href, e)))?;

    let source_time = html::first_text(entry, &SOURCE_TIME)
        .ok_or_else(|| CrawlError::MalformedEntry("no source/time label".to_string()))?;

    Ok(LinkRecord::new(html::element_text(link), url, source_time))
}
