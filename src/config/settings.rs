//! Settings structures for search-context configuration

use crate::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub search: SearchSettings,
    pub fetch: FetchSettings,
    pub aggregation: AggregationSettings,
    pub filter: FilterSettings,
    pub extraction: ExtractionSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Reject timeouts and backoff values that cannot describe a duration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        positive("outgoing.request_timeout", self.outgoing.request_timeout)?;
        positive("search.timeout", self.search.timeout)?;
        positive("fetch.per_attempt_timeout", self.fetch.per_attempt_timeout)?;
        positive("aggregation.global_timeout", self.aggregation.global_timeout)?;

        let backoff = self.fetch.initial_backoff;
        if !backoff.is_finite() || backoff < 0.0 {
            return Err(invalid("fetch.initial_backoff", backoff));
        }
        let multiplier = self.fetch.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(invalid("fetch.backoff_multiplier", multiplier));
        }
        Ok(())
    }

    /// Merge with environment variables (SEARCH_CONTEXT_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("SEARCH_CONTEXT_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("SEARCH_CONTEXT_LOG") {
            self.general.log_level = val;
        }
        if let Ok(val) = std::env::var("SEARCH_CONTEXT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_CONTEXT_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("SEARCH_CONTEXT_MAX_TOTAL_CHARS") {
            if let Ok(chars) = val.parse() {
                self.aggregation.default_max_total_chars = chars;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_CONTEXT_GLOBAL_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.aggregation.global_timeout = secs;
            }
        }
    }
}

/// Longest duration any setting can express (one year)
const MAX_SECONDS: f64 = 31_536_000.0;

/// Seconds to `Duration`, clamped to `0..=MAX_SECONDS`; NaN maps to zero
pub fn seconds(value: f64) -> Duration {
    if value.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(value.clamp(0.0, MAX_SECONDS))
}

fn positive(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= MAX_SECONDS {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}

fn invalid(field: &'static str, value: f64) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Preferred content language sent in Accept-Language ("all" for any)
    pub language: String,
    /// How long resolved addresses stay cached, in seconds
    pub dns_cache_ttl: u64,
    /// Maximum number of cached host names
    pub dns_cache_capacity: u64,
    /// Page bodies are cut after this many bytes
    pub max_page_bytes: usize,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            language: "all".to_string(),
            dns_cache_ttl: 300,
            dns_cache_capacity: 1024,
            max_page_bytes: 5 * 1024 * 1024,
            proxies: ProxySettings::default(),
        }
    }
}

impl OutgoingSettings {
    pub fn request_timeout(&self) -> Duration {
        seconds(self.request_timeout)
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Search index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Custom Search JSON API endpoint
    pub endpoint: String,
    /// Number of candidates requested per query (1..=10)
    pub results_per_query: u32,
    /// Timeout of the search call in seconds
    pub timeout: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            results_per_query: crate::MAX_RESULTS_PER_QUERY,
            timeout: 10.0,
        }
    }
}

impl SearchSettings {
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout)
    }
}

/// Page fetch retry and gating settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds
    pub initial_backoff: f64,
    /// Factor applied to the delay before each subsequent retry
    pub backoff_multiplier: f64,
    /// HTTP statuses that are retried
    pub retryable_statuses: Vec<u16>,
    /// Timeout of a single attempt, in seconds
    pub per_attempt_timeout: f64,
    /// Pages whose extracted text is shorter are skipped
    pub min_content_chars: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: 2.0,
            backoff_multiplier: 2.0,
            retryable_statuses: vec![429, 502, 503, 504],
            per_attempt_timeout: 10.0,
            min_content_chars: 100,
        }
    }
}

impl FetchSettings {
    pub fn per_attempt_timeout(&self) -> Duration {
        seconds(self.per_attempt_timeout)
    }
}

/// Budget and deadline settings for a whole request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Character budget used when a request does not provide one
    pub default_max_total_chars: usize,
    /// Deadline of a whole aggregation, in seconds
    pub global_timeout: f64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            default_max_total_chars: crate::DEFAULT_MAX_TOTAL_CHARS,
            global_timeout: 60.0,
        }
    }
}

impl AggregationSettings {
    pub fn global_timeout(&self) -> Duration {
        seconds(self.global_timeout)
    }
}

/// URL exclusion rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// File extensions (without dot, lowercase) that are never fetched
    pub excluded_extensions: Vec<String>,
    /// Case-insensitive regexes matched against the URL path and query
    pub excluded_path_patterns: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            excluded_extensions: to_strings(&[
                // Documents
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf",
                "epub", // Archives
                "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", // Images
                "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tif", "tiff",
                // Executables and packages
                "exe", "msi", "dmg", "pkg", "deb", "rpm", "apk", "bin", "iso", // Media
                "mp3", "mp4", "wav", "avi", "mov", "mkv", "flv", "wmv", "ogg", "webm", "m4a",
                // Data
                "csv", "json", "xml",
            ]),
            excluded_path_patterns: to_strings(&[
                r"/downloads?(/|$)",
                r"/viewcontent",
                r"/view-content",
                r"/login",
                r"/log-in",
                r"/signin",
                r"/sign-in",
                r"/signup",
                r"/sign-up",
                r"/register",
                r"/auth(/|$)",
                r"/oauth",
                r"/cart(/|$)",
                r"/checkout",
                r"/search(/|$|\?)",
                r"[?&](q|query|search)=",
            ]),
        }
    }
}

/// Boilerplate removal and stopword settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Elements dropped together with their subtree
    pub excluded_tags: Vec<String>,
    /// ARIA roles dropped together with their subtree
    pub excluded_roles: Vec<String>,
    /// Class/id keywords marking non-content blocks
    pub excluded_class_keywords: Vec<String>,
    /// Tokens removed from the extracted text, compared case-insensitively
    pub stopwords: Vec<String>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            excluded_tags: to_strings(&[
                "head", "script", "style", "noscript", "template", "iframe", "object", "embed",
                "svg", "canvas", "nav", "header", "footer", "aside", "form", "button", "input",
                "select", "textarea", "label", "dialog", "menu",
            ]),
            excluded_roles: to_strings(&[
                "navigation",
                "banner",
                "contentinfo",
                "complementary",
                "dialog",
                "alertdialog",
                "search",
                "menu",
            ]),
            excluded_class_keywords: to_strings(&[
                "ad",
                "ads",
                "advert",
                "advertisement",
                "sponsored",
                "promo",
                "banner",
                "cookie",
                "cookies",
                "consent",
                "gdpr",
                "newsletter",
                "subscribe",
                "subscription",
                "modal",
                "popup",
                "overlay",
                "share",
                "social",
                "sidebar",
                "breadcrumb",
                "breadcrumbs",
                "comments",
                "related",
            ]),
            stopwords: default_stopwords(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Common English function words
fn default_stopwords() -> Vec<String> {
    to_strings(&[
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
        "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
        "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is",
        "it", "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not",
        "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
        "out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that",
        "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
        "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
        "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
        "would", "you", "your", "yours", "yourself", "yourselves",
    ])
}
