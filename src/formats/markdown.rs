//! Markdown format implementation for ATX-style headings (`#` syntax).
//!
//! Setext headings (`===`/`---` underlines) are not recognised.

use crate::formats::{Format, Heading};
use regex::Regex;
use std::sync::LazyLock;

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^(#+)\s+(.+)$").unwrap()
});

/// ATX markdown headings of any depth.
pub struct MarkdownFormat;

impl Format for MarkdownFormat {
    fn heading(&self, line: &str) -> Option<Heading> {
        let caps = ATX_HEADING.captures(line)?;
        Some(Heading {
            level: caps[1].len(),
            title: caps[2].trim().to_string(),
        })
    }

    fn render_heading(&self, level: usize, title: &str) -> String {
        format!("{} {title}", "#".repeat(level))
    }
}
