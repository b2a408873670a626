use super::{build_outline, render_outline, OutlineNode};
use crate::parser::parse;
use pretty_assertions::assert_eq;

fn shape(nodes: &[OutlineNode]) -> Vec<(String, Vec<String>)> {
    nodes
        .iter()
        .map(|n| {
            (
                n.title.clone(),
                n.children.iter().map(|c| c.title.clone()).collect(),
            )
        })
        .collect()
}

#[test]
fn test_nesting_by_depth() {
    let sections = parse("# A\n## A1\n### A1a\n## A2\n# B\n## B1");
    let tree = build_outline(&sections);
    assert_eq!(
        shape(&tree),
        vec![
            ("A".to_string(), vec!["A1".to_string(), "A2".to_string()]),
            ("B".to_string(), vec!["B1".to_string()]),
        ]
    );
    assert_eq!(tree[0].children[0].children[0].title, "A1a");
    assert_eq!(tree[0].children[0].children[0].index, 2);
}

#[test]
fn test_skipped_levels_still_nest() {
    let sections = parse("# Top\n### Deep\n## Mid");
    let tree = build_outline(&sections);
    assert_eq!(tree.len(), 1);
    let children: Vec<&str> = tree[0].children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(children, vec!["Deep", "Mid"]);
}

#[test]
fn test_leading_deep_sections_are_roots() {
    let sections = parse("### Notes\n# Main\n## Sub");
    let tree = build_outline(&sections);
    let roots: Vec<&str> = tree.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(roots, vec!["Notes", "Main"]);
    assert_eq!(tree[1].children[0].title, "Sub");
}

#[test]
fn test_empty_outline() {
    assert!(build_outline(&[]).is_empty());
    assert_eq!(render_outline(&[], 80), "");
}

#[test]
fn test_render_tree() {
    let mut sections = parse("# A\n## A1\n## A2\n### A2a\n# B");
    sections[1].summary = Some("First child.\nSecond line ignored.".to_string());
    let rendered = render_outline(&build_outline(&sections), 80);
    assert_eq!(
        rendered,
        "├── A\n│   ├── A1: First child.\n│   └── A2\n│       └── A2a\n└── B\n"
    );
}

#[test]
fn test_render_truncates_to_width() {
    let mut sections = parse("# Title");
    sections[0].summary = Some("a very long summary that does not fit".to_string());
    let rendered = render_outline(&build_outline(&sections), 20);
    let line = rendered.lines().next().unwrap();
    assert_eq!(line.chars().count(), 20);
    assert!(line.ends_with('…'));
}
