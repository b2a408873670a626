//! Display-time hierarchy for a flat section list.
//!
//! Sections are stored flat with a `level`; nesting is reconstructed here in a single pass with
//! a depth stack. A section becomes the child of the nearest preceding section with a smaller
//! level, so skipped levels (`#` followed directly by `###`) still nest.

use crate::section::Section;
use std::fmt::Write;

/// One section in the reconstructed hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineNode {
    /// Position of the section in the flat list.
    pub index: usize,
    /// Heading depth copied from the section.
    pub level: usize,
    /// Section title.
    pub title: String,
    /// Section summary, if one was generated.
    pub summary: Option<String>,
    /// Nested sections in document order.
    pub children: Vec<OutlineNode>,
}

/// Builds the section tree, returning the top-level nodes.
#[must_use]
pub fn build_outline(sections: &[Section]) -> Vec<OutlineNode> {
    let mut roots = Vec::new();
    let mut stack: Vec<OutlineNode> = Vec::new();

    for (index, section) in sections.iter().enumerate() {
        while stack.last().is_some_and(|top| top.level >= section.level) {
            attach(&mut stack, &mut roots);
        }
        stack.push(OutlineNode {
            index,
            level: section.level,
            title: section.title.clone(),
            summary: section.summary.clone(),
            children: Vec::new(),
        });
    }
    while !stack.is_empty() {
        attach(&mut stack, &mut roots);
    }

    roots
}

fn attach(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Renders the outline as a box-drawn tree, one section per line.
///
/// Summaries follow the title after a colon and are cut to fit `wrap_width` characters.
#[must_use]
pub fn render_outline(nodes: &[OutlineNode], wrap_width: usize) -> String {
    let mut out = String::new();
    render_level(nodes, "", wrap_width, &mut out);
    out
}

fn render_level(nodes: &[OutlineNode], prefix: &str, wrap_width: usize, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i + 1 == nodes.len();
        let branch = if is_last { "└── " } else { "├── " };
        let mut line = format!("{prefix}{branch}{}", node.title);
        if let Some(summary) = node.summary.as_deref() {
            line.push_str(": ");
            line.push_str(summary.lines().next().unwrap_or_default());
        }
        if line.chars().count() > wrap_width {
            line = line.chars().take(wrap_width.saturating_sub(1)).collect();
            line.push('…');
        }
        let _ = writeln!(out, "{line}");

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        render_level(&node.children, &child_prefix, wrap_width, out);
    }
}

#[cfg(test)]
#[path = "tests/outline.rs"]
mod tests;
