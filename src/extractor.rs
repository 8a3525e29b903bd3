use regex::{Captures, Regex};
use std::collections::HashSet;
use url::Url;

/// Search engine and cache hosts that show up in every result page. An entry
/// matches its own host and the `www.` form of it, so `google.com` does not
/// hide results hosted on `drive.google.com` or `docs.google.com`.
pub const EXCLUDED_DOMAINS: [&str; 10] = [
    "google.com",
    "webcache.googleusercontent.com",
    "www.gstatic.com",
    "search.app.goo.gl",
    "www.google.se",
    "accounts.google.com",
    "support.google.com",
    "policies.google.com",
    "maps.google.com",
    "translate.google.com",
];

pub struct Extractor {
    href_regex: Regex,
    entity_regex: Regex,
    excluded: Vec<String>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_exclusions(EXCLUDED_DOMAINS.iter().map(|d| d.to_string()).collect())
    }

    pub fn with_exclusions(excluded: Vec<String>) -> Self {
        Extractor {
            // Absolute links only; relative hrefs point back into the engine.
            href_regex: Regex::new(r#"href="(http[^"]+)""#).expect("static regex"),
            entity_regex: Regex::new(r"(?i)&(?:#x([0-9a-f]+)|#([0-9]+)|(amp|quot|apos|lt|gt));")
                .expect("static regex"),
            excluded,
        }
    }

    /// Raw `href="http..."` values, in document order.
    pub fn extract_links<'a>(&self, html: &'a str) -> Vec<&'a str> {
        self.href_regex
            .captures_iter(html)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// Host-based match; unparsable URLs fall back to a substring test.
    pub fn is_excluded(&self, url: &str) -> bool {
        let host = match Url::parse(url) {
            Ok(parsed) => parsed.host_str().map(|h| h.to_ascii_lowercase()),
            Err(_) => None,
        };
        match host {
            Some(host) => self.excluded.iter().any(|domain| {
                host == *domain || host.strip_prefix("www.") == Some(domain.as_str())
            }),
            None => self.excluded.iter().any(|domain| url.contains(domain.as_str())),
        }
    }

    /// Numeric (`&#61;`, `&#x3D;`, any case) and the common named entities.
    pub fn decode_entities(&self, raw: &str) -> String {
        if !raw.contains('&') {
            return raw.to_string();
        }
        self.entity_regex
            .replace_all(raw, |caps: &Captures| {
                let code = match (caps.get(1), caps.get(2), caps.get(3)) {
                    (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                    (_, Some(dec), _) => dec.as_str().parse().ok(),
                    (_, _, Some(name)) => match name.as_str().to_ascii_lowercase().as_str() {
                        "amp" => Some(u32::from('&')),
                        "quot" => Some(u32::from('"')),
                        "apos" => Some(u32::from('\'')),
                        "lt" => Some(u32::from('<')),
                        _ => Some(u32::from('>')),
                    },
                    _ => None,
                };
                match code.and_then(char::from_u32) {
                    Some(c) => c.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Links on the page that are neither excluded nor in `seen`. Newly returned URLs
    /// are added to `seen`, so duplicates within the page collapse too.
    pub fn new_links(&self, html: &str, seen: &mut HashSet<String>) -> Vec<String> {
        let mut fresh = Vec::new();
        for link in self.extract_links(html) {
            let link = self.decode_entities(link);
            if !link.starts_with("http") || self.is_excluded(&link) {
                continue;
            }
            if seen.insert(link.clone()) {
                fresh.push(link);
            }
        }
        fresh
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// An empty allow-list accepts every URL.
pub fn is_valid_site(url: &str, valid_sites: &[String]) -> bool {
    valid_sites.is_empty() || valid_sites.iter().any(|site| url.contains(site.as_str()))
}

pub fn filter_valid_sites(urls: &[String], valid_sites: &[String]) -> Vec<String> {
    urls.iter()
        .filter(|url| is_valid_site(url, valid_sites))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <a href="/search?q=next">next</a>
        <a href="https://www.google.com/preferences">prefs</a>
        <a href="https://acme.io/files/report.pdf">Report</a>
        <a href="https://webcache.googleusercontent.com/search?q=cache:x">cached</a>
        <a href="https://docs.acme.io/a?x=1&amp;y=2">Docs</a>
        <a href="https://acme.io/files/report.pdf">Report again</a>
        <img src="https://www.gstatic.com/logo.png">
    "#;

    #[test]
    fn extracts_absolute_links_in_order() {
        let extractor = Extractor::new();
        let links = extractor.extract_links(PAGE);
        assert_eq!(links.len(), 5);
        assert_eq!(links[0], "https://www.google.com/preferences");
        assert_eq!(links[1], "https://acme.io/files/report.pdf");
    }

    #[test]
    fn new_links_filter_exclusions_and_duplicates() {
        let extractor = Extractor::new();
        let mut seen = HashSet::new();

        let first = extractor.new_links(PAGE, &mut seen);
        assert_eq!(
            first,
            vec!["https://acme.io/files/report.pdf", "https://docs.acme.io/a?x=1&y=2"]
        );

        let second = extractor.new_links(PAGE, &mut seen);
        assert!(second.is_empty());
    }

    #[test]
    fn allow_list_matches_substrings() {
        let urls = vec![
            "https://drive.google.com/file/d/1".to_string(),
            "https://acme.io/a.pdf".to_string(),
        ];
        assert_eq!(filter_valid_sites(&urls, &[]), urls);
        assert_eq!(
            filter_valid_sites(&urls, &["drive.google.com".to_string()]),
            vec!["https://drive.google.com/file/d/1"]
        );
        assert!(!is_valid_site("https://acme.io", &["dropbox.com".to_string()]));
    }

    #[test]
    fn entity_spellings_collapse_to_one_url() {
        let extractor = Extractor::new();
        let page = r#"
            <a href="https://a.io/v?x&#x3d;1">lower</a>
            <a href="https://a.io/v?x&#X3D;1">upper</a>
            <a href="https://a.io/v?x&#61;1">decimal</a>
            <a href="https://a.io/v?x=1&AMP;y=2">named</a>
            <a href="https://a.io/v?x=1&y=2">plain</a>
        "#;
        let mut seen = HashSet::new();

        let links = extractor.new_links(page, &mut seen);

        assert_eq!(links, vec!["https://a.io/v?x=1", "https://a.io/v?x=1&y=2"]);
        assert_eq!(extractor.decode_entities("a&#xZZ;b&bogus;"), "a&#xZZ;b&bogus;");
    }

    #[test]
    fn exclusions_match_hosts_not_substrings() {
        let extractor = Extractor::new();
        assert!(extractor.is_excluded("https://google.com/search?q=x"));
        assert!(extractor.is_excluded("https://www.google.com/url?q=https://acme.io"));
        assert!(extractor.is_excluded("https://WWW.Google.com/preferences"));
        assert!(extractor.is_excluded("https://accounts.google.com/ServiceLogin"));
        assert!(extractor.is_excluded("https://webcache.googleusercontent.com/search?q=cache:x"));
        assert!(!extractor.is_excluded("https://drive.google.com/file/d/abc/view"));
        assert!(!extractor.is_excluded("https://docs.google.com/spreadsheets/d/1"));
        assert!(!extractor.is_excluded("https://acme.io/?ref=google.com"));
    }

    #[test]
    fn bundled_shares_pattern_keeps_drive_results() {
        let shares: crate::pattern_loader::Pattern =
            serde_json::from_str(include_str!("../patterns/shares.json")).unwrap();
        let extractor = Extractor::new();
        let page = r#"<a href="https://drive.google.com/file/d/abc/view">doc</a>"#;
        let mut seen = HashSet::new();

        let fresh = extractor.new_links(page, &mut seen);
        let kept = filter_valid_sites(&fresh, &shares.valid_sites);

        assert_eq!(kept, vec!["https://drive.google.com/file/d/abc/view"]);
    }
}
