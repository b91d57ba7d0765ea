use thiserror::Error;

/// Everything that can go wrong while harvesting.
///
/// Most variants are recovered close to where they happen: a timed-out wait
/// turns into an empty page, a malformed entry is skipped, a failed article is
/// dropped. Only losing the WebDriver session (or never getting one) ends a run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A bounded wait for an expected element expired
    #[error("timed out after {secs}s waiting for {what}")]
    PageLoadTimeout { what: String, secs: u64 },

    /// No element matched any selector in a probe list
    #[error("no element matched {0}")]
    SelectorNotFound(String),

    /// The "next page" affordance was missing or did not lead anywhere
    #[error("navigation failed: {0}")]
    NavigationFailure(String),

    /// A single result entry lacked its title link or source label
    #[error("malformed result entry: {0}")]
    MalformedEntry(String),

    /// The content container existed but held no text
    #[error("article content was empty")]
    EmptyContent,

    #[error("browser command failed: {0}")]
    Browser(#[from] fantoccini::error::CmdError),

    /// The WebDriver server answered but refused to start a session
    #[error("WebDriver session could not be created: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("no WebDriver session could be started (tried {0})")]
    NoWebDriver(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl CrawlError {
    pub(crate) fn timeout(what: impl Into<String>, after: std::time::Duration) -> Self {
        CrawlError::PageLoadTimeout {
            what: what.into(),
            secs: after.as_secs(),
        }
    }
}
