pub mod config;
pub mod delay_manager;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logger;
pub mod pattern_loader;
pub mod query_builder;
pub mod runner;
pub mod search_engine;
pub mod url_log;

// Exporting types for convenience
pub use config::Settings;
pub use delay_manager::{Backoff, DelaySpec};
pub use downloader::{DownloadMode, DownloadReport, Downloader};
pub use error::GfuError;
pub use extractor::Extractor;
pub use pattern_loader::Pattern;
pub use runner::{RunSummary, Runner};
pub use search_engine::{PageFetcher, SearchEngine, SearchOptions};
pub use url_log::UrlLog;
