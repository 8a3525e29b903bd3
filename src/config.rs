use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use crate::delay_manager::{Backoff, DelaySpec};
use crate::downloader::DownloadMode;
use crate::pattern_loader;
use crate::search_engine::SearchOptions;

#[derive(Parser, Debug, Clone)]
#[command(name = "gfu", version, about = "Search dork runner and file downloader")]
pub struct Settings {
    /// Target string for the search (e.g. company name or domain); comma-separated for several
    #[arg(short, long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Output folder for gfu.log and downloaded files
    #[arg(short, long, default_value = "gfu")]
    pub output: PathBuf,

    /// Comma-separated pattern names (e.g. api,secrets,repos)
    #[arg(short, long, value_delimiter = ',')]
    pub pattern: Vec<String>,

    /// Seconds between search requests: fixed ("30") or random range ("10-40")
    #[arg(short, long, default_value = "30")]
    pub delay: DelaySpec,

    /// Only download files with this extension (e.g. pdf, txt)
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Download every result regardless of type
    #[arg(short = 'x', long)]
    pub extended: bool,

    /// List the available pattern files
    #[arg(short, long)]
    pub list: bool,

    /// Run every pattern in the pattern folder
    #[arg(short, long)]
    pub aggressive: bool,

    /// Custom dork query (e.g. 'site:{target} filetype:pdf')
    #[arg(short, long)]
    pub custom: Option<String>,

    /// Folder holding the pattern JSON files [default: ~/.gfu]
    #[arg(long, env = "GFU_PATTERN_DIR")]
    pub pattern_dir: Option<PathBuf>,

    /// Maximum result pages fetched per query
    #[arg(long, default_value_t = 50)]
    pub max_pages: u32,

    /// Results requested per page
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub results_per_page: u32,

    /// Retries of a rate-limited (HTTP 429) page before the query is abandoned
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// Seconds to wait after the first HTTP 429; doubles on each retry
    #[arg(long, default_value_t = 60)]
    pub retry_wait: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Settings {
    pub fn targets(&self) -> Vec<&str> {
        self.target
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn pattern_names(&self) -> Vec<&str> {
        self.pattern
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn pattern_dir(&self) -> PathBuf {
        pattern_loader::pattern_dir(self.pattern_dir.as_deref())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_pages: self.max_pages,
            results_per_page: self.results_per_page,
            delay: self.delay,
            backoff: Backoff::new(Duration::from_secs(self.retry_wait), self.max_retries),
        }
    }

    pub fn download_mode(&self) -> DownloadMode {
        DownloadMode::from_flags(self.extension.as_deref(), self.extended)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
