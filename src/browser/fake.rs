//! In-memory browser serving canned HTML, for pipeline tests.

use crate::browser::Browser;
use crate::error::CrawlError;
use crate::parsers::html;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use url::Url;

const BLANK: &str = "about:blank";

#[derive(Default)]
struct State {
    pages: HashMap<String, String>,
    unreachable: HashSet<String>,
    /// Open views by id with the URL each shows, the first one is the main view
    views: Vec<(usize, String)>,
    active: usize,
    next_view: usize,
    failing_switches: usize,
    visits: Vec<String>,
    screenshots: usize,
    views_opened: usize,
    views_closed: usize,
}

pub(crate) struct FakeBrowser {
    state: Mutex<State>,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                views: vec![(0, BLANK.to_string())],
                next_view: 1,
                ..State::default()
            }),
        }
    }

    /// Serve `html` for `url`
    pub(crate) fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.lock().pages.insert(url.to_string(), html.into());
        self
    }

    /// Make navigation to `url` fail
    pub(crate) fn with_unreachable(self, url: &str) -> Self {
        self.lock().unreachable.insert(url.to_string());
        self
    }

    /// Make the next `n` view switches fail
    pub(crate) fn with_failing_switches(self, n: usize) -> Self {
        self.lock().failing_switches = n;
        self
    }

    pub(crate) fn visits(&self) -> Vec<String> {
        self.lock().visits.clone()
    }

    pub(crate) fn screenshots(&self) -> usize {
        self.lock().screenshots
    }

    pub(crate) fn views_opened(&self) -> usize {
        self.lock().views_opened
    }

    pub(crate) fn views_closed(&self) -> usize {
        self.lock().views_closed
    }

    pub(crate) fn open_views(&self) -> usize {
        self.lock().views.len()
    }

    pub(crate) fn active_url(&self) -> String {
        self.lock().active_url().to_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake browser state poisoned")
    }

    fn document(&self) -> (String, Html) {
        let state = self.lock();
        let url = state.active_url().to_string();
        let source = state
            .pages
            .get(&url)
            .cloned()
            .unwrap_or_else(|| "<html><head></head><body></body></html>".to_string());
        (url, Html::parse_document(&source))
    }

    fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        let mut state = self.lock();
        state.visits.push(url.to_string());
        if state.unreachable.contains(url) {
            return Err(CrawlError::NavigationFailure(format!("{} unreachable", url)));
        }
        let active = state.active;
        if let Some((_, shown)) = state.views.iter_mut().find(|(id, _)| *id == active) {
            *shown = url.to_string();
        }
        Ok(())
    }
}

impl State {
    fn active_url(&self) -> &str {
        self.views
            .iter()
            .find(|(id, _)| *id == self.active)
            .map_or(BLANK, |(_, url)| url.as_str())
    }
}

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|_| CrawlError::SelectorNotFound(css.to_string()))
}

#[async_trait]
impl Browser for FakeBrowser {
    type View = usize;

    async fn goto(&self, url: &str) -> Result<(), CrawlError> {
        self.navigate(url)
    }

    async fn current_url(&self) -> Result<Url, CrawlError> {
        let (url, _) = self.document();
        Url::parse(&url).map_err(|e| CrawlError::NavigationFailure(e.to_string()))
    }

    async fn source(&self) -> Result<String, CrawlError> {
        let (_, doc) = self.document();
        Ok(doc.html())
    }

    async fn count(&self, css: &str) -> Result<usize, CrawlError> {
        let sel = selector(css)?;
        let (_, doc) = self.document();
        Ok(doc.select(&sel).count())
    }

    async fn text_of(&self, css: &str) -> Result<Option<String>, CrawlError> {
        let sel = selector(css)?;
        let (_, doc) = self.document();
        Ok(html::first_text_in(&doc, &sel))
    }

    async fn click_link_containing(&self, text: &str) -> Result<(), CrawlError> {
        let (url, doc) = self.document();
        let link = doc
            .select(&html::css("a"))
            .find(|a| html::element_text(*a).contains(text))
            .ok_or_else(|| CrawlError::SelectorNotFound(format!("link containing {}", text)))?;
        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| CrawlError::NavigationFailure("link without href".to_string()))?;
        let target = Url::parse(&url)
            .and_then(|base| base.join(href))
            .map_err(|e| CrawlError::NavigationFailure(e.to_string()))?;
        self.navigate(target.as_str())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, CrawlError> {
        self.lock().screenshots += 1;
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn current_view(&self) -> Result<usize, CrawlError> {
        Ok(self.lock().active)
    }

    async fn new_view(&self) -> Result<usize, CrawlError> {
        let mut state = self.lock();
        let id = state.next_view;
        state.next_view += 1;
        state.views.push((id, BLANK.to_string()));
        state.views_opened += 1;
        Ok(id)
    }

    async fn switch_to(&self, view: usize) -> Result<(), CrawlError> {
        let mut state = self.lock();
        if state.failing_switches > 0 {
            state.failing_switches -= 1;
            return Err(CrawlError::NavigationFailure(format!("cannot switch to view {}", view)));
        }
        if !state.views.iter().any(|(id, _)| *id == view) {
            return Err(CrawlError::NavigationFailure(format!("no view {}", view)));
        }
        state.active = view;
        Ok(())
    }

    async fn close_view(&self, main: usize) -> Result<(), CrawlError> {
        let mut state = self.lock();
        let active = state.active;
        state.views.retain(|(id, _)| *id != active);
        state.active = main;
        state.views_closed += 1;
        Ok(())
    }

    async fn quit(&self) -> Result<(), CrawlError> {
        Ok(())
    }
}
