use crate::browser::{self, Browser, Diagnostics};
use crate::crawlers::{COUNTER_SELECTOR, ENTRY_SELECTOR, Pacing, WAIT_TIMEOUT, harvest};
use crate::error::CrawlError;
use crate::parsers::html;
use crate::results::LinkRecord;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Results the search shows per page
pub const RESULTS_PER_PAGE: u32 = 10;

/// Text of the link that advances to the next results page
pub const NEXT_LABEL: &str = "NEXT";

static COUNTER: LazyLock<Selector> = LazyLock::new(|| html::css(COUNTER_SELECTOR));
static PAGE_ROW: LazyLock<Selector> = LazyLock::new(|| html::css(".page.rt"));
static PAGE_LINK: LazyLock<Selector> = LazyLock::new(|| html::css("a"));
static PAGE_NO: LazyLock<Selector> = LazyLock::new(|| html::css(".selectpage .pageno a"));

/// Page-count heuristics, most reliable first
const STRATEGIES: [(&str, fn(&Html) -> Option<u32>); 3] = [
    ("result counter", from_result_counter),
    ("page controls", from_page_controls),
    ("page label", from_page_label),
];

/// Best-effort number of result pages for the search shown in `source`.
///
/// Falls back to a single page when no heuristic produces a positive count,
/// so an unreadable page truncates the run instead of failing it.
pub fn infer_total_pages(source: &str) -> u32 {
    let doc = Html::parse_document(source);

    for (name, strategy) in STRATEGIES {
        match strategy(&doc) {
            Some(pages) if pages > 0 => {
                ::log::info!("Total pages from {}: {}", name, pages);
                return pages;
            }
            _ => ::log::debug!("Page count via {} not available", name),
        }
    }

    ::log::warn!("Could not determine page count, assuming 1 page");
    1
}

/// "1-10 of 47 results": ceil(47 / page size)
fn from_result_counter(doc: &Html) -> Option<u32> {
    let text = html::first_text_in(doc, &COUNTER)?;
    ::log::debug!("Result counter text: {}", text);

    let total = text.split("of").nth(1)?.split_whitespace().next()?;
    let total = total.parse::<u32>().ok()?;
    Some(total.div_ceil(RESULTS_PER_PAGE))
}

/// "Page:1 2 3 4 5 NEXT >>": the control before NEXT is the last page.
///
/// When that control is not a number, the number of page controls is used
/// instead; this is approximate.
fn from_page_controls(doc: &Html) -> Option<u32> {
    let row = doc.select(&PAGE_ROW).next()?;
    let text = html::element_text(row);
    ::log::debug!("Page control text: {}", text);
    if !text.contains(NEXT_LABEL) {
        return None;
    }

    let buttons = row.select(&PAGE_LINK).collect::<Vec<ElementRef<'_>>>();
    if buttons.len() < 2 {
        return None;
    }

    let last = html::element_text(buttons[buttons.len() - 2]);
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        last.parse().ok()
    } else {
        u32::try_from(buttons.len() - 1).ok()
    }
}

/// "1/6": the denominator
fn from_page_label(doc: &Html) -> Option<u32> {
    let text = html::first_text_in(doc, &PAGE_NO)?;
    ::log::debug!("Page label text: {}", text);

    let (_, total) = text.split_once('/')?;
    if total.contains('/') {
        return None;
    }
    total.trim().parse().ok()
}

/// Position in the result listing while walking it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
}

impl PaginationState {
    pub fn new(total_pages: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: total_pages.max(1),
        }
    }

    pub fn is_last(&self) -> bool {
        self.current_page >= self.total_pages
    }

    /// Move to the next page; refuses to go past the last one
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current_page += 1;
        true
    }
}

/// Clicks "NEXT" and waits until the next page has rendered.
///
/// On any failure a `page_error` screenshot is saved and `false` returned; the
/// caller stops walking but keeps what it already has.
pub async fn advance_to_next_page<B: Browser + ?Sized>(
    browser: &B,
    current_page: u32,
    diagnostics: &Diagnostics,
) -> bool {
    ::log::info!("Navigating to page {}...", current_page + 1);

    match try_advance(browser).await {
        Ok(()) => {
            ::log::info!("Reached page {}", current_page + 1);
            true
        }
        Err(e) => {
            ::log::error!("Failed to navigate to page {}: {}", current_page + 1, e);
            diagnostics.capture(browser, "page_error").await;
            false
        }
    }
}

async fn try_advance<B: Browser + ?Sized>(browser: &B) -> Result<(), CrawlError> {
    browser
        .click_link_containing(NEXT_LABEL)
        .await
        .map_err(|e| CrawlError::NavigationFailure(format!("no usable {} link: {}", NEXT_LABEL, e)))?;

    // Counter text and the article list together mean the page has rendered
    browser::wait_for_text(browser, COUNTER_SELECTOR, WAIT_TIMEOUT).await?;
    browser::wait_for_any(browser, &[ENTRY_SELECTOR], WAIT_TIMEOUT).await?;
    Ok(())
}

/// Harvests the page currently shown and appends its links to `links`
pub async fn process_page<B: Browser + ?Sized>(
    browser: &B,
    state: PaginationState,
    mut links: Vec<LinkRecord>,
) -> Vec<LinkRecord> {
    ::log::info!("Processing page {}/{}", state.current_page, state.total_pages);

    let found = harvest::harvest(browser).await;
    if found.is_empty() {
        ::log::warn!("No article links on page {}", state.current_page);
    } else {
        ::log::info!("Collected {} article links", found.len());
        links.extend(found);
    }
    links
}

/// Walks the result pages from the one currently shown, collecting links.
///
/// Stops after `total_pages` pages or at the first page that cannot be
/// reached; links gathered up to that point are returned either way.
pub async fn walk<B: Browser + ?Sized>(
    browser: &B,
    total_pages: u32,
    diagnostics: &Diagnostics,
    pacing: &Pacing,
    mut links: Vec<LinkRecord>,
) -> Vec<LinkRecord> {
    let mut state = PaginationState::new(total_pages);

    loop {
        links = process_page(browser, state, links).await;

        if state.is_last() {
            break;
        }
        if !advance_to_next_page(browser, state.current_page, diagnostics).await {
            ::log::warn!("Cannot reach the next page, stopping pagination");
            break;
        }
        state.advance();
        pacing.between_pages().await;
    }

    ::log::info!("Collected {} article links in total", links.len());
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><body>{}</body></html>", body)
    }

    #[test]
    fn test_counter_rounds_up() {
        let html = page(r#"<div class="results"><span>1-10 of 47 results</span></div>"#);
        assert_eq!(infer_total_pages(&html), 5);
    }

    #[test]
    fn test_counter_exact_multiple() {
        let html = page(r#"<div class="results"><span>共 of 60 条</span></div>"#);
        assert_eq!(infer_total_pages(&html), 6);
    }

    #[test]
    fn test_zero_results_fall_through_to_default() {
        let html = page(r#"<div class="results"><span>0 of 0 results</span></div>"#);
        assert_eq!(infer_total_pages(&html), 1);
    }

    #[test]
    fn test_page_controls_second_to_last() {
        let html = page(
            r#"<div class="page rt">Page:<a>1</a><a>2</a><a>3</a><a>4</a><a>5</a><a>NEXT &gt;&gt;</a></div>"#,
        );
        assert_eq!(infer_total_pages(&html), 5);
    }

    #[test]
    fn test_page_controls_non_numeric_counts_controls() {
        let html = page(
            r#"<div class="page rt">Page:<a>1</a><a>2</a><a>3</a><a>...</a><a>NEXT &gt;&gt;</a></div>"#,
        );
        assert_eq!(infer_total_pages(&html), 4);
    }

    #[test]
    fn test_page_controls_need_next() {
        let html = page(r#"<div class="page rt"><a>1</a><a>2</a></div>"#);
        assert_eq!(infer_total_pages(&html), 1);
    }

    #[test]
    fn test_page_label_when_counter_unparseable() {
        let html = page(
            r#"<div class="results"><span>about many results</span></div>
               <div class="selectpage"><span class="pageno"><a>1/6</a></span></div>"#,
        );
        assert_eq!(infer_total_pages(&html), 6);
    }

    #[test]
    fn test_counter_wins_over_label() {
        let html = page(
            r#"<div class="results"><span>1-10 of 23 results</span></div>
               <div class="selectpage"><span class="pageno"><a>1/6</a></span></div>"#,
        );
        assert_eq!(infer_total_pages(&html), 3);
    }

    #[test]
    fn test_defaults_to_one_page() {
        assert_eq!(infer_total_pages(&page("<p>nothing</p>")), 1);
        assert_eq!(infer_total_pages(""), 1);
        let html = page(r#"<div class="selectpage"><span class="pageno"><a>1/x</a></span></div>"#);
        assert_eq!(infer_total_pages(&html), 1);
    }

    #[test]
    fn test_state_never_passes_total() {
        let mut state = PaginationState::new(2);
        assert_eq!(state.current_page, 1);
        assert!(!state.is_last());
        assert!(state.advance());
        assert!(state.is_last());
        assert!(!state.advance());
        assert_eq!(state.current_page, 2);
    }

    #[test]
    fn test_state_clamps_zero_total() {
        let state = PaginationState::new(0);
        assert_eq!(state.total_pages, 1);
        assert!(state.is_last());
    }
}
