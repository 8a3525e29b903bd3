use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use std::collections::HashSet;
use std::time::Duration;
use log::{debug, info, warn, error};
use rand::seq::SliceRandom;
use crate::delay_manager::{Backoff, DelaySpec};
use crate::error::GfuError;
use crate::extractor::{self, Extractor};
use crate::url_log::UrlLog;

pub const SEARCH_URL: &str = "https://www.google.com/search";
pub const MAX_RESULTS_PER_PAGE: u32 = 100;

pub const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

pub fn search_url(query: &str, page: u32, results_per_page: u32) -> String {
    format!(
        "{}?q={}&start={}&num={}",
        SEARCH_URL,
        urlencoding::encode(query),
        page * results_per_page,
        results_per_page
    )
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Seam between the paging loop and the network.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, GfuError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, GfuError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, GfuError> {
        let resp = self.client.get(url).header(USER_AGENT, random_user_agent()).send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(FetchedPage { status, body })
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_pages: u32,
    pub results_per_page: u32,
    pub delay: DelaySpec,
    pub backoff: Backoff,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_pages: 50,
            results_per_page: 10,
            delay: DelaySpec::default(),
            backoff: Backoff::default(),
        }
    }
}

pub struct SearchEngine<F: PageFetcher = HttpFetcher> {
    fetcher: F,
    extractor: Extractor,
    options: SearchOptions,
}

impl SearchEngine<HttpFetcher> {
    pub fn new(options: SearchOptions, timeout: Duration) -> Result<Self, GfuError> {
        Ok(Self::with_fetcher(HttpFetcher::new(timeout)?, options))
    }
}

impl<F: PageFetcher> SearchEngine<F> {
    pub fn with_fetcher(fetcher: F, mut options: SearchOptions) -> Self {
        options.results_per_page = options.results_per_page.clamp(1, MAX_RESULTS_PER_PAGE);
        SearchEngine {
            fetcher,
            extractor: Extractor::new(),
            options,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs every query of one pattern. URLs are deduplicated across all of its
    /// queries and pages; allow-listed ones are appended to `log` as they appear
    /// and returned in discovery order.
    pub fn search(&self, queries: &[String], valid_sites: &[String], log: &mut UrlLog) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for query in queries {
            info!("Searching for: {}", query);
            match self.search_query(query, valid_sites, &mut seen, log) {
                Ok(urls) => found.extend(urls),
                Err(e) => error!("Abandoning query '{}': {}", query, e),
            }
        }
        found
    }

    fn search_query(
        &self,
        query: &str,
        valid_sites: &[String],
        seen: &mut HashSet<String>,
        log: &mut UrlLog,
    ) -> Result<Vec<String>, GfuError> {
        let mut kept = Vec::new();

        for page in 0..self.options.max_pages {
            let url = search_url(query, page, self.options.results_per_page);
            let html = match self.fetch_with_backoff(&url) {
                Ok(html) => html,
                Err(e) if kept.is_empty() => return Err(e),
                Err(e) => {
                    // Whatever was collected before the failure is still valid.
                    warn!(
                        "Failed to fetch page {}: {}. Keeping {} earlier results.",
                        page + 1,
                        e,
                        kept.len()
                    );
                    return Ok(kept);
                }
            };

            let fresh = self.extractor.new_links(&html, seen);
            if fresh.is_empty() {
                info!("Stopping search: No new results found on page {}.", page + 1);
                self.options.delay.wait();
                break;
            }

            let allowed = extractor::filter_valid_sites(&fresh, valid_sites);
            if let Err(e) = log.append(&allowed) {
                error!("Failed to write URLs to {:?}: {}", log.path(), e);
            }
            info!(
                "Page {}: {} new results found ({} kept).",
                page + 1,
                fresh.len(),
                allowed.len()
            );
            kept.extend(allowed);
            self.options.delay.wait();
        }
        Ok(kept)
    }

    fn fetch_with_backoff(&self, url: &str) -> Result<String, GfuError> {
        let mut attempt = 0;
        loop {
            debug!("GET {}", url);
            let page = self.fetcher.fetch(url)?;
            match page.status {
                429 => {
                    attempt += 1;
                    if !self.options.backoff.wait(attempt) {
                        return Err(GfuError::RateLimited(self.options.backoff.max_retries));
                    }
                }
                200..=299 => return Ok(page.body),
                status => {
                    return Err(GfuError::Status {
                        status,
                        url: url.to_string(),
                    })
                }
            }
        }
    }
}
