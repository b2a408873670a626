//! Splits document text into an ordered list of sections.
//!
//! Lines are obtained with `split('\n')`, so a trailing newline yields a final empty line and
//! `lines.join("\n")` always reproduces the input. Parsing never fails: text without headings
//! simply produces no sections, and lines before the first heading are not captured.

use crate::formats::markdown::MarkdownFormat;
use crate::formats::{Format, Heading};
use crate::section::Section;

/// Parses markdown `text` into sections using ATX headings.
#[must_use]
pub fn parse(text: &str) -> Vec<Section> {
    parse_with(&MarkdownFormat, text)
}

/// Parses `text` into sections using the heading rules of `format`.
#[must_use]
pub fn parse_with<F: Format + ?Sized>(format: &F, text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut open: Option<OpenSection<'_>> = None;
    let mut line_count = 0;

    for (index, line) in text.split('\n').enumerate() {
        line_count = index + 1;
        match format.heading(line) {
            Some(heading) => {
                if let Some(prev) = open.take() {
                    sections.push(prev.close(index - 1));
                }
                open = Some(OpenSection::new(heading, index));
            }
            None => {
                if let Some(current) = open.as_mut() {
                    current.body.push(line);
                }
            }
        }
    }

    if let Some(last) = open {
        sections.push(last.close(line_count - 1));
    }

    sections
}

struct OpenSection<'a> {
    heading: Heading,
    start_index: usize,
    body: Vec<&'a str>,
}

impl OpenSection<'_> {
    fn new(heading: Heading, start_index: usize) -> Self {
        Self {
            heading,
            start_index,
            body: Vec::new(),
        }
    }

    fn close(self, end_index: usize) -> Section {
        Section {
            id: None,
            title: self.heading.title,
            level: self.heading.level,
            content: self.body.join("\n").trim().to_string(),
            start_index: self.start_index,
            end_index,
            summary: None,
        }
    }
}

#[cfg(test)]
#[path = "tests/parser.rs"]
mod tests;
