//! Readable text extraction
//!
//! Turns raw markup into flat, boilerplate-free text in reading order and
//! collects the page's same-origin outbound links. Extraction is a pure
//! function of the markup, the page URL and the configuration the extractor
//! was built with.

use crate::config::{ExtractionSettings, FilterSettings};
use crate::error::ConfigError;
use crate::filter::url_extension;
use crate::results::ExtractedPage;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements that break the text flow; a space is emitted around them
static BLOCK_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
        "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre",
        "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
    ]
    .into_iter()
    .collect()
});

/// Elements whose class/role are never used to discard them
static STRUCTURAL_ROOTS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["html", "body", "main", "article"].into_iter().collect());

/// Boilerplate-stripping text extractor
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    excluded_tags: HashSet<String>,
    excluded_roles: HashSet<String>,
    class_pattern: Option<Regex>,
    stopwords: HashSet<String>,
    excluded_extensions: HashSet<String>,
    link_selector: Selector,
}

enum Visit<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Break,
}

impl ContentExtractor {
    /// Build an extractor from the extraction rules and the URL filter's
    /// extension list (used to drop non-page links)
    pub fn new(
        settings: &ExtractionSettings,
        filter: &FilterSettings,
    ) -> Result<Self, ConfigError> {
        let lowercase = |items: &[String]| -> HashSet<String> {
            items.iter().map(|s| s.trim().to_lowercase()).collect()
        };

        let class_pattern = if settings.excluded_class_keywords.is_empty() {
            None
        } else {
            let alternation = settings
                .excluded_class_keywords
                .iter()
                .map(|k| regex::escape(k.trim()))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?:^|[\s_-])(?:{})(?:$|[\s_-])", alternation);
            let re = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
            Some(re)
        };

        let link_selector = Selector::parse("a[href]").map_err(|e| ConfigError::Selector {
            selector: "a[href]".to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(Self {
            excluded_tags: lowercase(&settings.excluded_tags),
            excluded_roles: lowercase(&settings.excluded_roles),
            class_pattern,
            stopwords: lowercase(&settings.stopwords),
            excluded_extensions: filter
                .excluded_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            link_selector,
        })
    }

    /// Extract cleaned text and same-origin links from `raw_html`
    pub fn extract(&self, raw_html: &str, page_url: &str) -> ExtractedPage {
        let document = Html::parse_document(raw_html);

        let text = self.clean_text(&self.visible_text(&document));
        let links = match Url::parse(page_url) {
            Ok(base) => self.same_origin_links(&document, &base),
            Err(_) => Vec::new(),
        };

        ExtractedPage { text, links }
    }

    /// Concatenate text nodes in document order, skipping excluded subtrees
    fn visible_text(&self, document: &Html) -> String {
        let mut out = String::new();
        let mut stack = vec![Visit::Element(document.root_element())];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Text(text) => out.push_str(text),
                Visit::Break => out.push(' '),
                Visit::Element(element) => {
                    if self.is_excluded(&element) {
                        continue;
                    }

                    let is_block = BLOCK_TAGS.contains(element.value().name());
                    if is_block {
                        out.push(' ');
                        stack.push(Visit::Break);
                    }

                    // Pushed in reverse so children pop in reading order
                    let children: Vec<_> = element.children().collect();
                    for child in children.into_iter().rev() {
                        match child.value() {
                            Node::Text(text) => stack.push(Visit::Text(&**text)),
                            Node::Element(_) => {
                                if let Some(el) = ElementRef::wrap(child) {
                                    stack.push(Visit::Element(el));
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        out
    }

    /// Whether an element and its subtree are boilerplate
    fn is_excluded(&self, element: &ElementRef) -> bool {
        let el = element.value();
        let name = el.name();

        if self.excluded_tags.contains(name) {
            return true;
        }

        if el.attr("hidden").is_some() {
            return true;
        }
        if el
            .attr("aria-hidden")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
        {
            return true;
        }
        if let Some(style) = el.attr("style") {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            if style.contains("display:none") || style.contains("visibility:hidden") {
                return true;
            }
        }

        if STRUCTURAL_ROOTS.contains(name) {
            return false;
        }

        if let Some(role) = el.attr("role") {
            if self.excluded_roles.contains(&role.trim().to_lowercase()) {
                return true;
            }
        }

        if let Some(ref pattern) = self.class_pattern {
            let class_hit = el.attr("class").map(|c| pattern.is_match(c)).unwrap_or(false);
            let id_hit = el.id().map(|id| pattern.is_match(id)).unwrap_or(false);
            if class_hit || id_hit {
                return true;
            }
        }

        false
    }

    /// Collapse whitespace, trim and drop stopwords
    pub fn clean_text(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|token| !self.stopwords.contains(&token.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Absolute links sharing the page's origin, in document order, deduplicated
    /// and excluding the page itself
    fn same_origin_links(&self, document: &Html, base: &Url) -> Vec<String> {
        let origin = base.origin();
        let mut page = base.clone();
        page.set_fragment(None);

        let mut seen = HashSet::new();
        seen.insert(page.to_string());
        let mut links = Vec::new();

        for anchor in document.select(&self.link_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            let Ok(mut link) = base.join(href.trim()) else {
                continue;
            };

            if !matches!(link.scheme(), "http" | "https") || link.origin() != origin {
                continue;
            }

            if url_extension(&link)
                .map(|ext| self.excluded_extensions.contains(&ext))
                .unwrap_or(false)
            {
                continue;
            }

            link.set_fragment(None);
            let link = link.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        links
    }
}
