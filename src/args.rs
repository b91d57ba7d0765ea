use clap::Parser;
use news_harvest::HarvestConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "news-harvest")]
#[command(about = "Harvests China Daily climate news search results into a CSV file")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides config file and WEBDRIVER_URL)
    #[arg(short, long)]
    pub webdriver_url: Option<String>,

    /// Directory for the CSV output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for diagnostic screenshots
    #[arg(long)]
    pub diagnostics_dir: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,
}

impl Args {
    /// Config file (or defaults), then environment, then flags
    pub fn load_config(&self) -> Result<HarvestConfig, news_harvest::CrawlError> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_file(path)?,
            None => HarvestConfig::default(),
        };
        config.apply_env();

        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.diagnostics_dir {
            config.diagnostics_dir = dir.clone();
        }
        if self.headless {
            config.headless = true;
        }
        Ok(config)
    }
}
