//! Rebuilds a document with some sections rewritten and every other line left untouched.
//!
//! Patching works on the original line array. Each matched section's line range
//! `[start_index, end_index]` is swapped for a freshly rendered heading and the new content.
//! Splices are applied last-to-first by original `start_index`, so every range is still
//! expressed in the coordinates of the original text when it is applied, whatever order the
//! replacements arrived in.

use crate::formats::markdown::MarkdownFormat;
use crate::formats::Format;
use crate::section::Section;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of patching a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patched {
    /// The rebuilt document text.
    pub text: String,
    /// Replacement titles that named no section and were ignored.
    pub unmatched_titles: Vec<String>,
}

/// Replaces the named sections of `original_text` and returns the new text.
///
/// Titles are matched exactly and case-sensitively. When several sections share a title the
/// first one in document order is replaced. Titles that match no section are ignored; use
/// [`patch_document`] to learn which ones.
#[must_use]
pub fn apply_replacements(
    original_text: &str,
    original_sections: &[Section],
    replacements: &HashMap<String, String>,
) -> String {
    patch_document(&MarkdownFormat, original_text, original_sections, replacements).text
}

/// Replaces the named sections using the heading syntax of `format`.
///
/// Content before the first heading and every section not named in `replacements` is copied
/// through byte for byte. Within a replaced section the blank lines that separated the heading
/// from its body, and the body from the next heading, are kept.
#[must_use]
pub fn patch_document<F: Format + ?Sized>(
    format: &F,
    original_text: &str,
    original_sections: &[Section],
    replacements: &HashMap<String, String>,
) -> Patched {
    let mut lines: Vec<Cow<'_, str>> = original_text.split('\n').map(Cow::Borrowed).collect();

    let mut targets: Vec<(&Section, &str)> = Vec::new();
    let mut unmatched_titles = Vec::new();
    for (title, content) in replacements {
        match original_sections.iter().find(|s| &s.title == title) {
            Some(section) => targets.push((section, content.as_str())),
            None => unmatched_titles.push(title.clone()),
        }
    }
    unmatched_titles.sort();
    if !unmatched_titles.is_empty() {
        warn!(titles = ?unmatched_titles, "replacement titles matched no section");
    }

    targets.sort_by(|a, b| b.0.start_index.cmp(&a.0.start_index));

    // Start of the most recently applied splice; later (earlier-in-document) ranges must end
    // before it.
    let mut boundary = lines.len();
    for (section, content) in targets {
        if section.end_index >= boundary || section.start_index > section.end_index {
            warn!(
                title = %section.title,
                start = section.start_index,
                end = section.end_index,
                "section range is stale for this text, skipping"
            );
            continue;
        }
        let block = render_block(format, section, &lines, content);
        debug!(
            title = %section.title,
            removed = section.line_count(),
            inserted = block.len(),
            "splicing section"
        );
        lines.splice(
            section.start_index..=section.end_index,
            block.into_iter().map(Cow::Owned),
        );
        boundary = section.start_index;
    }

    Patched {
        text: lines.join("\n"),
        unmatched_titles,
    }
}

fn render_block<F: Format + ?Sized>(
    format: &F,
    section: &Section,
    lines: &[Cow<'_, str>],
    content: &str,
) -> Vec<String> {
    let body = &lines[section.start_index + 1..=section.end_index];
    let is_blank = |line: &&Cow<str>| line.trim().is_empty();
    let leading = body.iter().take_while(is_blank).count();
    let trailing = if leading == body.len() {
        0
    } else {
        body.iter().rev().take_while(is_blank).count()
    };

    // Inserted lines take the heading line's ending so CRLF documents stay CRLF.
    let eol = if lines[section.start_index].ends_with('\r') {
        "\r"
    } else {
        ""
    };

    let mut block = Vec::with_capacity(1 + leading + trailing);
    block.push(format!(
        "{}{eol}",
        format.render_heading(section.level, &section.title)
    ));
    block.extend(body[..leading].iter().map(ToString::to_string));
    let content = content.trim();
    if !content.is_empty() {
        block.extend(
            content
                .split('\n')
                .map(|line| format!("{}{eol}", line.trim_end_matches('\r'))),
        );
    }
    if trailing == 0 && !lines[section.end_index].ends_with('\r') {
        // The section's last line had no CR of its own (end of text without a newline).
        if let Some(last) = block.last_mut() {
            if last.ends_with('\r') {
                last.pop();
            }
        }
    }
    block.extend(body[body.len() - trailing..].iter().map(ToString::to_string));
    block
}

#[cfg(test)]
#[path = "tests/patcher.rs"]
mod tests;
