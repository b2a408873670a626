//! Section representation for parsed documents.
//!
//! A section is a heading plus the lines that follow it up to the next heading of any level.
//! Sections form a flat ordered list annotated with depth; any hierarchy is rebuilt at display
//! time (see [`crate::outline`]) rather than stored as parent/child links.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Stable identifier the store assigns to a persisted section.
pub struct SectionId(pub i64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Document division with line coordinates for extraction and patching.
pub struct Section {
    /// Store-assigned identifier, absent until the section is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,
    /// Section heading text without markup symbols.
    pub title: String,
    /// Heading depth (number of leading `#` marks).
    pub level: usize,
    /// Body lines between this heading and the next, joined and trimmed.
    pub content: String,
    /// Zero-based line index of the heading line.
    pub start_index: usize,
    /// Zero-based line index of the last line belonging to this section.
    pub end_index: usize,
    /// Short generated description of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Section {
    #[must_use]
    /// Number of document lines covered, heading included.
    pub fn line_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Copies summaries from `previous` onto `sections` by exact title match.
///
/// Repeated titles pair up in order: the second "Notes" section takes the summary of the
/// second previous "Notes" section. Sections that already have a summary keep it.
pub fn carry_over_summaries(sections: &mut [Section], previous: &[Section]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for section in sections.iter_mut() {
        let occurrence = seen.entry(section.title.clone()).or_default();
        let rank = *occurrence;
        *occurrence += 1;
        if section.summary.is_some() {
            continue;
        }
        section.summary = previous
            .iter()
            .filter(|p| p.title == section.title)
            .nth(rank)
            .and_then(|p| p.summary.clone());
    }
}

#[cfg(test)]
#[path = "tests/section.rs"]
mod tests;
