//! Request and response types exchanged with `HttpClient`

use std::collections::HashMap;

/// GET request to be issued by the client
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// URL to request
    pub url: String,
    /// Request headers, added on top of the browser profile
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: Vec<(String, String)>,
}

impl HttpRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            params: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Whether a content type can carry a readable page
pub fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("html") || content_type.contains("text")
}

/// HTTP response with the body already read as text
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl HttpResponse {
    /// Build a response by hand, mostly useful for scripted clients
    pub fn new(status: u16, content_type: Option<&str>, text: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        if let Some(ct) = content_type {
            headers.insert("content-type".to_string(), ct.to_string());
        }
        Self {
            status,
            headers,
            text: text.into(),
            url: String::new(),
        }
    }

    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.text)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Declared content type, if any
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = HttpResponse::new(200, Some("text/html; charset=utf-8"), "<p>x</p>");
        assert_eq!(resp.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(resp.content_type(), Some("text/html; charset=utf-8"));
        assert!(resp.is_success());
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("application/XHTML+xml"));
        assert!(is_textual("text/plain"));
        assert!(!is_textual("application/pdf"));
        assert!(!is_textual("application/octet-stream"));
    }

    #[test]
    fn test_request_builder_keeps_param_order() {
        let req = HttpRequest::get("https://example.com")
            .param("key", "k")
            .param("cx", "c")
            .param("q", "rust");
        let keys: Vec<_> = req.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["key", "cx", "q"]);
    }
}
