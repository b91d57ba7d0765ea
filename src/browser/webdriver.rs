use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::error::CrawlError;
use async_trait::async_trait;
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use url::Url;

/// Well-known local WebDriver endpoints tried when the configured one refuses
const FALLBACK_WEBDRIVER_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver / msedgedriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A single WebDriver session driving a real browser
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Connects to the configured WebDriver server, falling back to common
    /// local ports, and sizes the window.
    pub async fn connect(config: &HarvestConfig) -> Result<Self, CrawlError> {
        let client = connect_to_webdriver(config).await?;

        if let Err(e) = client
            .set_window_size(config.window_width, config.window_height)
            .await
        {
            ::log::warn!("Could not resize browser window: {}", e);
        }

        Ok(Self { client })
    }
}

/// Browser capabilities: window size, user agent and headless mode for both
/// Chromium-based drivers.
fn capabilities(config: &HarvestConfig) -> Map<String, Value> {
    let mut args = vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!(
            "--window-size={},{}",
            config.window_width, config.window_height
        ),
        format!("--user-agent={}", config.user_agent),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }

    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps.insert("ms:edgeOptions".to_string(), json!({ "args": args }));
    caps
}

async fn connect_to_webdriver(config: &HarvestConfig) -> Result<Client, CrawlError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities(config));

    let first_error = match builder.connect(&config.webdriver_url).await {
        Ok(client) => {
            ::log::info!("Connected to WebDriver at {}", config.webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            e
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == config.webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::info!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(connection_error(config, first_error))
}

/// Error after every endpoint refused: a driver that answered but would not
/// start a session is reported as such, anything else means no driver
fn connection_error(config: &HarvestConfig, first_error: NewSessionError) -> CrawlError {
    match first_error {
        e @ NewSessionError::SessionNotCreated(_) => CrawlError::Session(e),
        e => CrawlError::NoWebDriver(format!(
            "{}, {} (first error: {})",
            config.webdriver_url,
            FALLBACK_WEBDRIVER_URLS.join(", "),
            e
        )),
    }
}

/// A missing element is `None`, any other command failure stays an error
fn found<T>(result: Result<T, CmdError>) -> Result<Option<T>, CrawlError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_no_such_element() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type View = WindowHandle;

    async fn goto(&self, url: &str) -> Result<(), CrawlError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<Url, CrawlError> {
        Ok(self.client.current_url().await?)
    }

    async fn source(&self) -> Result<String, CrawlError> {
        Ok(self.client.source().await?)
    }

    async fn count(&self, selector: &str) -> Result<usize, CrawlError> {
        Ok(self.client.find_all(Locator::Css(selector)).await?.len())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>, CrawlError> {
        match found(self.client.find(Locator::Css(selector)).await)? {
            Some(element) => Ok(Some(element.text().await?)),
            None => Ok(None),
        }
    }

    async fn click_link_containing(&self, text: &str) -> Result<(), CrawlError> {
        let xpath = format!("//a[contains(., \"{}\")]", text);
        let link = found(self.client.find(Locator::XPath(&xpath)).await)?
            .ok_or(CrawlError::SelectorNotFound(xpath))?;
        link.click().await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, CrawlError> {
        Ok(self.client.screenshot().await?)
    }

    async fn current_view(&self) -> Result<WindowHandle, CrawlError> {
        Ok(self.client.window().await?)
    }

    async fn new_view(&self) -> Result<WindowHandle, CrawlError> {
        Ok(self.client.new_window(true).await?.handle)
    }

    async fn switch_to(&self, view: WindowHandle) -> Result<(), CrawlError> {
        self.client.switch_to_window(view).await?;
        Ok(())
    }

    async fn close_view(&self, main: WindowHandle) -> Result<(), CrawlError> {
        // Switch back even when closing failed, the main view must stay usable
        let closed = self.client.close_window().await;
        self.client.switch_to_window(main).await?;
        closed?;
        Ok(())
    }

    async fn quit(&self) -> Result<(), CrawlError> {
        self.client.clone().close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantoccini::error::{ErrorStatus, WebDriver};

    fn webdriver_error(status: ErrorStatus) -> CmdError {
        CmdError::Standard(WebDriver::new(status, "from driver"))
    }

    #[test]
    fn test_missing_element_is_none() {
        let result = found::<()>(Err(webdriver_error(ErrorStatus::NoSuchElement)));
        assert!(matches!(result, Ok(None)));
        assert!(matches!(found(Ok(7)), Ok(Some(7))));
    }

    #[test]
    fn test_other_command_errors_propagate() {
        let result = found::<()>(Err(webdriver_error(ErrorStatus::StaleElementReference)));
        assert!(matches!(result, Err(CrawlError::Browser(_))));
    }

    #[test]
    fn test_refused_session_keeps_driver_error() {
        let refused = NewSessionError::SessionNotCreated(WebDriver::new(
            ErrorStatus::SessionNotCreated,
            "browser binary not found",
        ));
        let error = connection_error(&HarvestConfig::default(), refused);
        assert!(matches!(error, CrawlError::Session(NewSessionError::SessionNotCreated(_))));
    }

    #[test]
    fn test_unreachable_driver_lists_endpoints() {
        let lost = NewSessionError::Lost(std::io::Error::other("connection refused"));
        let config = HarvestConfig::default();
        match connection_error(&config, lost) {
            CrawlError::NoWebDriver(tried) => {
                assert!(tried.contains(&config.webdriver_url));
                assert!(tried.contains("http://localhost:9515"));
                assert!(tried.contains("connection refused"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_headless_flag_reaches_both_drivers() {
        let config = HarvestConfig {
            headless: true,
            ..HarvestConfig::default()
        };
        let caps = capabilities(&config);
        for key in ["goog:chromeOptions", "ms:edgeOptions"] {
            let args = caps[key]["args"].as_array().unwrap();
            assert!(args.iter().any(|a| a == "--headless=new"));
            assert!(args.iter().any(|a| a == "--window-size=1920,1080"));
        }
    }
}
