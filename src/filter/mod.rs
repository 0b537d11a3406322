//! URL pre-filter
//!
//! Rejects candidates that are not worth fetching: binary or media files by
//! extension, and download/auth/cart/search pages by path pattern.

use crate::config::FilterSettings;
use crate::error::ConfigError;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use url::Url;

/// Predicate deciding whether a URL is a fetchable text page
#[derive(Debug, Clone)]
pub struct UrlFilter {
    excluded_extensions: HashSet<String>,
    excluded_paths: Vec<Regex>,
}

impl UrlFilter {
    /// Compile the exclusion rules; invalid patterns are a startup error
    pub fn new(settings: &FilterSettings) -> Result<Self, ConfigError> {
        let excluded_extensions = settings
            .excluded_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let excluded_paths = settings
            .excluded_path_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::Pattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            excluded_extensions,
            excluded_paths,
        })
    }

    /// Whether `url` should be fetched
    ///
    /// Extension rules are checked before path rules; the first match
    /// excludes. Malformed and non-http(s) URLs are excluded.
    pub fn is_fetchable(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }

        if self.has_excluded_extension(&parsed) {
            return false;
        }

        let target = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        !self.excluded_paths.iter().any(|re| re.is_match(&target))
    }

    /// Whether the last path segment carries an excluded extension
    pub fn has_excluded_extension(&self, url: &Url) -> bool {
        url_extension(url)
            .map(|ext| self.excluded_extensions.contains(&ext))
            .unwrap_or(false)
    }
}

/// Lowercased extension of the last path segment, if any
pub fn url_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> UrlFilter {
        UrlFilter::new(&FilterSettings::default()).unwrap()
    }

    #[test]
    fn test_allows_plain_pages() {
        let f = filter();
        assert!(f.is_fetchable("https://example.com/"));
        assert!(f.is_fetchable("https://example.com/blog/rust-async"));
        assert!(f.is_fetchable("https://example.com/page.html"));
        assert!(f.is_fetchable("http://docs.example.org/guide/index.php?page=2"));
    }

    #[test]
    fn test_excludes_by_extension() {
        let f = filter();
        assert!(!f.is_fetchable("https://example.com/paper.pdf"));
        assert!(!f.is_fetchable("https://example.com/files/archive.ZIP"));
        assert!(!f.is_fetchable("https://example.com/img/logo.png?v=3"));
        assert!(!f.is_fetchable("https://example.com/setup.exe"));
        assert!(!f.is_fetchable("https://example.com/talk.mp4"));
    }

    #[test]
    fn test_excludes_by_path_pattern() {
        let f = filter();
        assert!(!f.is_fetchable("https://example.com/download/file"));
        assert!(!f.is_fetchable("https://repository.example.edu/cgi/viewcontent.cgi?article=1"));
        assert!(!f.is_fetchable("https://example.com/Login"));
        assert!(!f.is_fetchable("https://shop.example.com/cart"));
        assert!(!f.is_fetchable("https://shop.example.com/checkout/step-1"));
        assert!(!f.is_fetchable("https://example.com/search?q=rust"));
    }

    #[test]
    fn test_excludes_malformed_and_non_http() {
        let f = filter();
        assert!(!f.is_fetchable("not a url"));
        assert!(!f.is_fetchable(""));
        assert!(!f.is_fetchable("ftp://example.com/readme"));
        assert!(!f.is_fetchable("mailto:someone@example.com"));
    }

    #[test]
    fn test_url_extension() {
        let url = Url::parse("https://example.com/a/b/Report.Final.PDF").unwrap();
        assert_eq!(url_extension(&url), Some("pdf".to_string()));

        let url = Url::parse("https://example.com/a/.hidden").unwrap();
        assert_eq!(url_extension(&url), None);

        let url = Url::parse("https://example.com/a/b/").unwrap();
        assert_eq!(url_extension(&url), None);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let settings = FilterSettings {
            excluded_extensions: vec![],
            excluded_path_patterns: vec!["(unclosed".to_string()],
        };
        assert!(matches!(
            UrlFilter::new(&settings),
            Err(ConfigError::Pattern { .. })
        ));
    }
}
