use std::collections::HashSet;
use std::path::PathBuf;
use log::{info, error};
use crate::config::Settings;
use crate::downloader::{DownloadReport, Downloader};
use crate::error::GfuError;
use crate::pattern_loader::{self, Pattern};
use crate::query_builder;
use crate::search_engine::{HttpFetcher, PageFetcher, SearchEngine};
use crate::url_log::UrlLog;

const CUSTOM_SECTION: &str = "custom_query";

#[derive(Debug, Default)]
pub struct RunSummary {
    pub urls: Vec<String>,
    pub downloads: DownloadReport,
}

/// Ties one invocation together: pattern selection, searching, cross-pattern dedupe, downloads.
pub struct Runner<F: PageFetcher = HttpFetcher> {
    settings: Settings,
    engine: SearchEngine<F>,
    pattern_dir: PathBuf,
}

impl Runner<HttpFetcher> {
    pub fn new(settings: Settings) -> Result<Self, GfuError> {
        let engine = SearchEngine::new(settings.search_options(), settings.request_timeout())?;
        Ok(Self::with_engine(settings, engine))
    }
}

impl<F: PageFetcher> Runner<F> {
    pub fn with_engine(settings: Settings, engine: SearchEngine<F>) -> Self {
        let pattern_dir = settings.pattern_dir();
        Runner { settings, engine, pattern_dir }
    }

    pub fn run(&self) -> Result<RunSummary, GfuError> {
        let urls = self.collect()?;
        let downloader = Downloader::new(&self.settings.output, self.settings.request_timeout())?;
        let downloads = downloader.download_all(&urls, &self.settings.download_mode());
        Ok(RunSummary { urls, downloads })
    }

    /// Search phase only. Returns every kept URL once, in discovery order.
    pub fn collect(&self) -> Result<Vec<String>, GfuError> {
        if let Some(query) = &self.settings.custom {
            return self.collect_custom(query);
        }

        let targets = self.settings.targets();
        if targets.is_empty() {
            return Err(GfuError::MissingTarget(
                "a target (-t) must be specified for pattern searches".to_string(),
            ));
        }
        let patterns = self.selected_patterns()?;

        let mut log = UrlLog::open(&self.settings.output)?;
        let mut unique = Unique::default();
        for target in &targets {
            for pattern in &patterns {
                info!("Processing pattern: {} (target: {})", pattern.name, target);
                let section = if targets.len() > 1 {
                    format!("{} [{}]", pattern.name, target)
                } else {
                    pattern.name.clone()
                };
                log.section(&section)?;

                let queries = query_builder::build_queries(pattern, target);
                let valid_sites = query_builder::build_valid_sites(pattern, target);
                let urls = self.engine.search(&queries, &valid_sites, &mut log);
                info!("Pattern {}: {} URLs kept.", pattern.name, urls.len());
                unique.extend(urls);
            }
        }

        info!("Total unique URLs found: {}", unique.urls.len());
        info!("Logged URLs to: {}", log.path().display());
        Ok(unique.urls)
    }

    fn collect_custom(&self, query: &str) -> Result<Vec<String>, GfuError> {
        let targets = self.settings.targets();
        let queries = if query.contains(query_builder::TARGET_PLACEHOLDER) && !targets.is_empty() {
            targets
                .iter()
                .map(|t| query_builder::render_custom(query, Some(*t)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![query_builder::render_custom(query, None)?]
        };

        let mut log = UrlLog::open(&self.settings.output)?;
        log.section(CUSTOM_SECTION)?;
        for query in &queries {
            info!("Executing custom query: {}", query);
        }
        let mut unique = Unique::default();
        unique.extend(self.engine.search(&queries, &[], &mut log));

        info!("Total unique URLs found: {}", unique.urls.len());
        info!("Logged URLs to: {}", log.path().display());
        Ok(unique.urls)
    }

    fn selected_patterns(&self) -> Result<Vec<Pattern>, GfuError> {
        if self.settings.aggressive {
            info!("Aggressive mode enabled. Testing all patterns in {:?}.", self.pattern_dir);
            return pattern_loader::load_all_patterns(&self.pattern_dir);
        }

        let names = self.settings.pattern_names();
        if names.is_empty() {
            return Err(GfuError::NoPatternSelected);
        }
        let mut patterns = Vec::new();
        for name in names {
            match pattern_loader::load_pattern(&self.pattern_dir, name) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => error!("{}", e),
            }
        }
        Ok(patterns)
    }
}

#[derive(Default)]
struct Unique {
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl Unique {
    fn extend(&mut self, urls: Vec<String>) {
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.urls.push(url);
            }
        }
    }
}
