use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GfuError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pattern file not found: {}", .0.display())]
    PatternNotFound(PathBuf),

    #[error("Invalid pattern file {}: {source}", path.display())]
    InvalidPattern {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid pattern name '{0}': names must not contain path separators")]
    InvalidPatternName(String),

    #[error("No pattern files found in folder: {}", .0.display())]
    NoPatterns(PathBuf),

    #[error("A target is required: {0}")]
    MissingTarget(String),

    #[error("No pattern selected (use -p, -a, -c or -l)")]
    NoPatternSelected,

    #[error("Invalid delay '{0}': expected seconds (\"30\") or a range (\"10-40\")")]
    InvalidDelay(String),

    #[error("Rate limited after {0} retries")]
    RateLimited(u32),

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },
}
