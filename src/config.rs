use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The one search this harvester runs: China Daily Chinese-language news from
/// 2024-11-11 to 2024-11-22 that must mention 气候 and may mention cop29,
/// sorted by date with duplicates switched off.
pub const SEARCH_URL: &str = "https://newssearch.chinadaily.com.cn/cn/search?cond=%7B%22publishedDateFrom%22%3A%222024-11-11%22%2C%22publishedDateTo%22%3A%222024-11-22%22%2C%22fullMust%22%3A%22%E6%B0%94%E5%80%99%22%2C%22fullAny%22%3A%22cop29%22%2C%22sort%22%3A%22dp%22%2C%22duplication%22%3A%22off%22%7D&language=cn";

/// Runtime settings for a harvest.
///
/// The search itself, wait timeouts and politeness delays are fixed and not
/// part of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Directory the CSV file is written to
    #[serde(default = "default_dir")]
    pub output_dir: PathBuf,

    /// File name prefix of the CSV file
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Directory diagnostic screenshots are written to
    #[serde(default = "default_dir")]
    pub diagnostics_dir: PathBuf,

    /// Run the browser without a visible window
    #[serde(default)]
    pub headless: bool,

    /// User agent the browser announces
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_prefix() -> String {
    "china_daily_climate_news".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.0.0".to_string()
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            output_dir: default_dir(),
            output_prefix: default_output_prefix(),
            diagnostics_dir: default_dir(),
            headless: false,
            user_agent: default_user_agent(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the WebDriver URL with an environment variable if provided
    pub fn apply_env(&mut self) {
        self.apply_webdriver_override(std::env::var("WEBDRIVER_URL").ok());
    }

    fn apply_webdriver_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|url| !url.is_empty()) {
            ::log::debug!("WebDriver URL overridden to {}", url);
            self.webdriver_url = url;
        }
    }
}
