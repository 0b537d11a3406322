//! Text layout of records and sections

use crate::results::{QuerySection, SearchResultItem};

/// Line closing every section
pub const SECTION_SEPARATOR: &str = "---";

/// Labeled record for one fetched page
pub fn format_record(item: &SearchResultItem, content: &str) -> String {
    format!(
        "Title: {}\nSource: {}\nContent: {}\n\n",
        item.title, item.link, content
    )
}

/// Section text wrapped with a header naming its query and a separator line
pub fn wrap_section(section: &QuerySection) -> String {
    format!(
        "## Search results for \"{}\"\n\n{}{}\n\n",
        section.query, section.text, SECTION_SEPARATOR
    )
}

/// Concatenate sections in order and cut the result to `max_chars`
///
/// The cut is a raw character slice and may end mid-record.
pub fn compose(sections: &[QuerySection], max_chars: usize) -> String {
    let joined: String = sections.iter().map(wrap_section).collect();
    truncate_chars(joined, max_chars)
}

/// Keep at most `max_chars` characters, never splitting one
pub fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
    text
}
