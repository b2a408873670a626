//! Format trait and implementations for different document types.
//!
//! This module defines the `Format` trait which abstracts over how a document marks its section
//! headings, so the parser and patcher can share one notion of what a heading line is.

pub mod markdown;

/// A recognised heading line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// Heading depth, at least 1.
    pub level: usize,
    /// Heading text with markup and surrounding whitespace removed.
    pub title: String,
}

/// Recognises and renders the heading lines of a document format.
pub trait Format {
    /// Returns the heading on `line`, if the whole line is one.
    fn heading(&self, line: &str) -> Option<Heading>;
    /// Renders a heading line for `level` and `title`.
    fn render_heading(&self, level: usize, title: &str) -> String;
}
