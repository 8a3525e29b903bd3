use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{info, warn, error};
use url::Url;
use crate::error::GfuError;
use crate::search_engine::random_user_agent;

const FALLBACK_FILE_NAME: &str = "download";

/// Which result URLs get fetched to disk.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadMode {
    Disabled,
    /// Only URLs whose path ends in this extension (stored lowercase, no dot).
    Extension(String),
    All,
}

impl DownloadMode {
    pub fn from_flags(extension: Option<&str>, extended: bool) -> Self {
        if extended {
            return DownloadMode::All;
        }
        match extension.map(|e| e.trim().trim_start_matches('.').to_lowercase()) {
            Some(ext) if !ext.is_empty() => DownloadMode::Extension(ext),
            _ => DownloadMode::Disabled,
        }
    }

    pub fn selects(&self, url: &str) -> bool {
        match self {
            DownloadMode::Disabled => false,
            DownloadMode::All => true,
            DownloadMode::Extension(ext) => url_path(url)
                .to_lowercase()
                .ends_with(&format!(".{}", ext)),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: &Path, timeout: Duration) -> Result<Self, GfuError> {
        let client = Client::builder().timeout(timeout).cookie_store(true).build()?;
        Ok(Self::with_client(client, output_dir))
    }

    pub fn with_client(client: Client, output_dir: &Path) -> Self {
        Downloader {
            client,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Streams `url` into the output folder without overwriting existing files.
    pub fn download(&self, url: &str) -> Result<PathBuf, GfuError> {
        let mut resp = self.client.get(url).header(USER_AGENT, random_user_agent()).send()?;
        if !resp.status().is_success() {
            return Err(GfuError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        fs::create_dir_all(&self.output_dir)?;
        let path = unique_path(&self.output_dir, &file_name_for(url));
        let mut writer = BufWriter::new(File::create(&path)?);
        if let Err(e) = resp.copy_to(&mut writer) {
            drop(writer);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        writer.flush()?;
        Ok(path)
    }

    /// One failed download never stops the rest.
    pub fn download_all(&self, urls: &[String], mode: &DownloadMode) -> DownloadReport {
        let mut report = DownloadReport::default();
        if *mode == DownloadMode::Disabled {
            info!("No download options specified, skipping file downloads.");
            return report;
        }

        for url in urls {
            if !mode.selects(url) {
                warn!("Skipping file (extension): {}", url);
                report.skipped += 1;
                continue;
            }
            match self.download(url) {
                Ok(path) => {
                    info!("Downloaded file: {}", path.display());
                    report.downloaded.push(path);
                }
                Err(e) => {
                    error!("Failed to download file: {}: {}", url, e);
                    report.failed += 1;
                }
            }
        }
        info!(
            "Downloads finished: {} saved, {} skipped, {} failed.",
            report.downloaded.len(),
            report.skipped,
            report.failed
        );
        report
    }
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// Last non-empty path segment, percent-decoded and reduced to a safe file name.
pub fn file_name_for(url: &str) -> String {
    let path = url_path(url);
    let segment = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    let cleaned: String = decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// `report.pdf`, then `report (1).pdf`, `report (2).pdf`, ...
fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    let mut n = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
