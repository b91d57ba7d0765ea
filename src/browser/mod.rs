//! The page-rendering engine the pipeline drives.
//!
//! The pipeline only talks to [`Browser`]; [`WebDriverBrowser`] is the real
//! implementation on top of a WebDriver session. Waits, the isolated article
//! view and diagnostic screenshots are built once on the trait so every engine
//! shares them.

pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use webdriver::WebDriverBrowser;

use crate::error::CrawlError;
use crate::utils;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, timeout};
use url::Url;

/// Interval between two polls of a wait condition
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle identifying a view (tab) of the session
    type View: Clone + Send + Sync;

    /// Navigate the current view
    async fn goto(&self, url: &str) -> Result<(), CrawlError>;

    /// URL of the document in the current view
    async fn current_url(&self) -> Result<Url, CrawlError>;

    /// Serialized DOM of the current view
    async fn source(&self) -> Result<String, CrawlError>;

    /// Number of elements matching a CSS selector
    async fn count(&self, selector: &str) -> Result<usize, CrawlError>;

    /// Rendered text of the first element matching a CSS selector
    async fn text_of(&self, selector: &str) -> Result<Option<String>, CrawlError>;

    /// Click the first link whose text contains `text`
    async fn click_link_containing(&self, text: &str) -> Result<(), CrawlError>;

    /// PNG capture of the current view
    async fn screenshot(&self) -> Result<Vec<u8>, CrawlError>;

    /// The view commands currently go to
    async fn current_view(&self) -> Result<Self::View, CrawlError>;

    /// Open a fresh blank view without switching to it
    async fn new_view(&self) -> Result<Self::View, CrawlError>;

    /// Send further commands to `view`
    async fn switch_to(&self, view: Self::View) -> Result<(), CrawlError>;

    /// Close the current view and switch back to `main`
    async fn close_view(&self, main: Self::View) -> Result<(), CrawlError>;

    /// End the session
    async fn quit(&self) -> Result<(), CrawlError>;
}

/// Block until any of `selectors` matches, or `limit` expires.
///
/// Returns the first selector (in list order) that matched on the successful
/// poll. Browser errors while polling count as "not yet".
pub async fn wait_for_any<'s, B: Browser + ?Sized>(
    browser: &B,
    selectors: &[&'s str],
    limit: Duration,
) -> Result<&'s str, CrawlError> {
    let poll = async {
        loop {
            for selector in selectors {
                match browser.count(selector).await {
                    Ok(n) if n > 0 => return *selector,
                    Ok(_) => {}
                    Err(e) => ::log::trace!("Polling {} failed: {}", selector, e),
                }
            }
            sleep(POLL_INTERVAL).await;
        }
    };

    timeout(limit, poll)
        .await
        .map_err(|_| CrawlError::timeout(selectors.join(", "), limit))
}

/// Block until the first element matching `selector` has non-empty text
pub async fn wait_for_text<B: Browser + ?Sized>(
    browser: &B,
    selector: &str,
    limit: Duration,
) -> Result<String, CrawlError> {
    let poll = async {
        loop {
            match browser.text_of(selector).await {
                Ok(Some(text)) if !text.trim().is_empty() => return text,
                Ok(_) => {}
                Err(e) => ::log::trace!("Polling text of {} failed: {}", selector, e),
            }
            sleep(POLL_INTERVAL).await;
        }
    };

    timeout(limit, poll)
        .await
        .map_err(|_| CrawlError::timeout(format!("text in {}", selector), limit))
}

/// An auxiliary view opened for the duration of one piece of work.
///
/// The main view keeps its document (and with it the pagination position)
/// while the auxiliary view is used. Must be released with [`close`](Self::close).
#[must_use = "an isolated view has to be closed to return to the main view"]
pub struct IsolatedView<V> {
    main: V,
}

impl<V: Clone + Send + Sync> IsolatedView<V> {
    /// Open an auxiliary view and switch to it.
    ///
    /// When the switch fails the new view is closed again before the error is
    /// returned, so a failed open leaves only the main view behind.
    pub async fn open<B>(browser: &B) -> Result<Self, CrawlError>
    where
        B: Browser<View = V> + ?Sized,
    {
        let main = browser.current_view().await?;
        let opened = browser.new_view().await?;

        if let Err(e) = browser.switch_to(opened.clone()).await {
            ::log::warn!("Could not switch to new view: {}", e);
            discard(browser, opened, main).await;
            return Err(e);
        }

        ::log::trace!("Opened isolated view");
        Ok(Self { main })
    }

    /// Close the auxiliary view and switch back to the main one
    pub async fn close<B>(self, browser: &B)
    where
        B: Browser<View = V> + ?Sized,
    {
        if let Err(e) = browser.close_view(self.main).await {
            ::log::warn!("Failed to close isolated view: {}", e);
        }
    }
}

/// Close `opened` and return to `main`, logging what could not be done
async fn discard<B: Browser + ?Sized>(browser: &B, opened: B::View, main: B::View) {
    match browser.switch_to(opened).await {
        Ok(()) => {
            if let Err(e) = browser.close_view(main).await {
                ::log::warn!("Failed to close abandoned view: {}", e);
            }
        }
        Err(e) => {
            ::log::warn!("Abandoned view left open: {}", e);
            if let Err(e) = browser.switch_to(main).await {
                ::log::warn!("Failed to return to main view: {}", e);
            }
        }
    }
}

/// Where diagnostic screenshots go
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create `{context}_YYYYMMDD_HHMMSS.png`, appending a counter when a
    /// capture from the same second already took the name
    async fn create_free(&self, context: &str) -> std::io::Result<(PathBuf, File)> {
        let stem = format!("{}_{}", context, utils::timestamp());
        let mut n = 0;
        loop {
            let name = match n {
                0 => format!("{}.png", stem),
                n => format!("{}_{}.png", stem, n),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Save a screenshot of the current view as `{context}_YYYYMMDD_HHMMSS.png`.
    ///
    /// Failing to take or write the screenshot is logged and otherwise ignored.
    pub async fn capture<B: Browser + ?Sized>(&self, browser: &B, context: &str) -> Option<PathBuf> {
        let png = match browser.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                ::log::warn!("Could not take {} screenshot: {}", context, e);
                return None;
            }
        };

        let written = async {
            let (path, mut file) = self.create_free(context).await?;
            file.write_all(&png).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(path)
        }
        .await;
        match written {
            Ok(path) => {
                ::log::info!("Saved page screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                ::log::warn!("Could not write {} screenshot: {}", context, e);
                None
            }
        }
    }
}
