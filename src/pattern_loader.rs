use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use log::{info, error, warn};
use serde::Deserialize;
use crate::error::GfuError;

pub const PATTERN_DIR_ENV: &str = "GFU_PATTERN_DIR";
const PATTERN_EXT: &str = "json";

/// A named set of dork templates, loaded from `<pattern_dir>/<name>.json`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Pattern {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub templates: Vec<String>,
    /// Substrings a result URL must contain to be kept. Empty keeps everything.
    #[serde(default, alias = "validSites")]
    pub valid_sites: Vec<String>,
}

/// Resolution order: explicit override, `$GFU_PATTERN_DIR`, then `~/.gfu`.
pub fn pattern_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Ok(dir) = env::var(PATTERN_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".gfu")
}

pub fn load_pattern(dir: &Path, name: &str) -> Result<Pattern, GfuError> {
    let name = name.trim();
    let escapes_dir = name.is_empty()
        || name.contains(['/', '\\'])
        || name == ".."
        || name.starts_with('.');
    if escapes_dir {
        return Err(GfuError::InvalidPatternName(name.to_string()));
    }
    let path = dir.join(format!("{}.{}", name, PATTERN_EXT));
    if !path.is_file() {
        return Err(GfuError::PatternNotFound(path));
    }

    let content = fs::read_to_string(&path)?;
    let mut pattern: Pattern = serde_json::from_str(&content)
        .map_err(|source| GfuError::InvalidPattern { path: path.clone(), source })?;
    pattern.name = name.to_string();

    if pattern.templates.is_empty() {
        warn!("Pattern '{}' has no templates.", name);
    }
    Ok(pattern)
}

/// Pattern file names (`api.json`, ...) in the folder, sorted.
pub fn list_patterns(dir: &Path) -> Result<Vec<String>, GfuError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pattern = path.is_file()
            && path.extension().map_or(false, |ext| ext == PATTERN_EXT);
        if !is_pattern {
            continue;
        }
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            files.push(file_name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every pattern in the folder. Files with invalid JSON are skipped.
pub fn load_all_patterns(dir: &Path) -> Result<Vec<Pattern>, GfuError> {
    let files = match list_patterns(dir) {
        Ok(files) => files,
        Err(GfuError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };
    if files.is_empty() {
        return Err(GfuError::NoPatterns(dir.to_path_buf()));
    }

    let mut patterns = Vec::new();
    for file in &files {
        let name = file.trim_end_matches(&format!(".{}", PATTERN_EXT));
        match load_pattern(dir, name) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => error!("Failed to load pattern file {}: {}", file, e),
        }
    }
    info!("Loaded {} patterns from {:?}", patterns.len(), dir);
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn loads_templates_and_valid_sites() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "docs.json",
            r#"{"templates": ["site:{target} ext:pdf"], "valid_sites": ["{target}"]}"#,
        );

        let pattern = load_pattern(tmp.path(), "docs").unwrap();
        assert_eq!(pattern.name, "docs");
        assert_eq!(pattern.templates, vec!["site:{target} ext:pdf"]);
        assert_eq!(pattern.valid_sites, vec!["{target}"]);
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "bare.json", "{}");

        let pattern = load_pattern(tmp.path(), "bare").unwrap();
        assert!(pattern.templates.is_empty());
        assert!(pattern.valid_sites.is_empty());
    }

    #[test]
    fn missing_and_invalid_files_are_errors() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "broken.json", "{ not json");

        assert!(matches!(
            load_pattern(tmp.path(), "nope"),
            Err(GfuError::PatternNotFound(_))
        ));
        assert!(matches!(
            load_pattern(tmp.path(), "broken"),
            Err(GfuError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn names_cannot_leave_the_pattern_folder() {
        let tmp = TempDir::new().unwrap();
        let patterns = tmp.path().join("patterns");
        fs::create_dir_all(&patterns).unwrap();
        write(tmp.path(), "outside.json", r#"{"templates": ["x"]}"#);

        for name in ["../outside", "..", "sub/outside", "..\\outside", ".hidden", ""] {
            assert!(
                matches!(load_pattern(&patterns, name), Err(GfuError::InvalidPatternName(_))),
                "accepted {:?}",
                name
            );
        }
    }

    #[test]
    fn lists_only_json_files_sorted() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "secrets.json", "{}");
        write(tmp.path(), "api.json", "{}");
        write(tmp.path(), "README.md", "notes");

        assert_eq!(list_patterns(tmp.path()).unwrap(), vec!["api.json", "secrets.json"]);
    }

    #[test]
    fn load_all_skips_invalid_json() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "api.json", r#"{"templates": ["a {target}"]}"#);
        write(tmp.path(), "broken.json", "[1, 2");

        let patterns = load_all_patterns(tmp.path()).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "api");
    }

    #[test]
    fn load_all_without_patterns_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(load_all_patterns(tmp.path()), Err(GfuError::NoPatterns(_))));
        assert!(matches!(
            load_all_patterns(&tmp.path().join("missing")),
            Err(GfuError::NoPatterns(_))
        ));
    }

    #[test]
    fn explicit_dir_wins() {
        let dir = Path::new("/tmp/my-patterns");
        assert_eq!(pattern_dir(Some(dir)), dir.to_path_buf());
    }
}
