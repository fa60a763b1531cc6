//! Vector-graphic classification
//!
//! A generation session picks its own file names, so whether an artifact is
//! SVG is decided from both the file name and, when available, the content.

use std::path::Path;

/// File extension of vector graphics
pub const VECTOR_EXTENSION: &str = "svg";

/// Opening of the SVG root element
const SVG_ROOT_TAG: &str = "<svg";

/// Whether an artifact is a vector graphic
///
/// True when any of these hold:
/// - the file name ends in `.svg` (case-insensitive)
/// - the content, after leading whitespace, starts with `<svg`
/// - the content contains `<svg` followed by whitespace or `>`
#[must_use]
pub fn is_vector_graphic(file_name: &str, content: Option<&str>) -> bool {
    if has_vector_extension(file_name) {
        return true;
    }

    match content {
        Some(text) => text.trim_start().starts_with(SVG_ROOT_TAG) || contains_root_tag(text),
        None => false,
    }
}

fn has_vector_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(VECTOR_EXTENSION))
}

/// `<svg` followed by whitespace or `>` anywhere in the text
fn contains_root_tag(text: &str) -> bool {
    text.match_indices(SVG_ROOT_TAG).any(|(idx, tag)| {
        text[idx + tag.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '>')
    })
}
