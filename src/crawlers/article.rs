use crate::browser::{self, Browser, Diagnostics, IsolatedView};
use crate::crawlers::{Pacing, WAIT_TIMEOUT};
use crate::error::CrawlError;
use crate::parsers::html::{self, Probe};
use crate::parsers::{probe_first, text};
use crate::results::ExtractedArticle;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Where article titles live, site template first, generic fallbacks after
pub const TITLE_SELECTORS: [&str; 5] = [".dabiaoti", ".Artical_Title", "h1", ".title", ".headline"];

/// Where article bodies live, in the same priority order
pub const CONTENT_SELECTORS: [&str; 6] = [
    "#zw",
    "#Content",
    ".Artical_Content",
    ".article",
    ".article-content",
    ".article-body",
];

static TITLE_PROBES: LazyLock<Vec<Probe<String>>> = LazyLock::new(|| {
    TITLE_SELECTORS
        .into_iter()
        .map(|selector| Probe::new(selector, html::non_empty_text))
        .collect()
});

static CONTENT_PROBES: LazyLock<Vec<Probe<String>>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .into_iter()
        .map(|selector| Probe::new(selector, body_text))
        .collect()
});

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| html::css("p"));

/// Opens `url` in an isolated view and extracts its title and body.
///
/// Whatever happens, the isolated view is closed, the main view is active
/// again and the post-extraction pause has elapsed when this returns.
pub async fn extract<B: Browser + ?Sized>(
    browser: &B,
    url: &str,
    diagnostics: &Diagnostics,
    pacing: &Pacing,
) -> Result<ExtractedArticle, CrawlError> {
    ::log::info!("Opening article: {}", url);

    let result = match IsolatedView::open(browser).await {
        Ok(view) => {
            let result = extract_in_view(browser, url).await;
            if let Err(e) = &result {
                ::log::error!("Failed to extract {}: {}", url, e);
                diagnostics.capture(browser, "error").await;
            }
            view.close(browser).await;
            result
        }
        Err(e) => {
            ::log::error!("Could not open a view for {}: {}", url, e);
            Err(e)
        }
    };

    pacing.after_article().await;
    result
}

async fn extract_in_view<B: Browser + ?Sized>(
    browser: &B,
    url: &str,
) -> Result<ExtractedArticle, CrawlError> {
    browser.goto(url).await?;

    // Only confirms some title-shaped element exists; parse_article decides
    // which one is used
    browser::wait_for_any(browser, &TITLE_SELECTORS, WAIT_TIMEOUT).await?;

    let source = browser.source().await?;
    let article = parse_article(&source)?;
    ::log::info!("Extracted {} characters", article.content.chars().count());
    Ok(article)
}

/// Title and cleaned body of an article page snapshot.
///
/// Deterministic: the same source always produces the same article.
pub fn parse_article(source: &str) -> Result<ExtractedArticle, CrawlError> {
    let doc = Html::parse_document(source);

    let title = match probe_first(&doc, &TITLE_PROBES) {
        Some((selector, title)) => {
            ::log::debug!("Title found with '{}'", selector);
            title
        }
        None => {
            ::log::warn!("No title found");
            String::new()
        }
    };

    let (selector, content) = probe_first(&doc, &CONTENT_PROBES)
        .ok_or_else(|| CrawlError::SelectorNotFound(CONTENT_SELECTORS.join(", ")))?;
    ::log::debug!("Content container found with '{}'", selector);

    if content.is_empty() {
        return Err(CrawlError::EmptyContent);
    }

    Ok(ExtractedArticle { title, content })
}

/// Body text of a content container.
///
/// Always yields a value so the probe commits to the first container that
/// exists, even an empty one.
fn body_text(container: ElementRef<'_>) -> Option<String> {
    let paragraphs = text::join_paragraphs(container.select(&PARAGRAPH).map(html::rendered_text));

    let raw = if paragraphs.is_empty() {
        ::log::warn!("No paragraphs in content container, using its full text");
        html::rendered_text(container)
    } else {
        paragraphs
    };

    Some(text::clean_article_text(&raw))
}
