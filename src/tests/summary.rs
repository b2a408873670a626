use super::{SummaryGenerator, EMPTY_SECTION_SUMMARY};
use crate::parser::parse;
use crate::test_support::ScriptedModel;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_summarizes_every_section() {
    let model = ScriptedModel::new();
    let mut sections = parse("# Goals\nShip it.\n## Metrics\nNPS above 40.\n# Risks\nNone.");
    SummaryGenerator::new(&model, "n/a")
        .summarize_missing(&mut sections)
        .await;

    let summaries: Vec<&str> = sections
        .iter()
        .map(|s| s.summary.as_deref().unwrap())
        .collect();
    assert_eq!(
        summaries,
        vec!["Summary of Goals", "Summary of Metrics", "Summary of Risks"]
    );
    assert_eq!(model.summary_calls(), 3);
}

#[tokio::test]
async fn test_existing_summaries_are_kept() {
    let model = ScriptedModel::new();
    let mut sections = parse("# A\na\n# B\nb");
    sections[0].summary = Some("kept".to_string());
    SummaryGenerator::new(&model, "n/a")
        .summarize_missing(&mut sections)
        .await;

    assert_eq!(sections[0].summary.as_deref(), Some("kept"));
    assert_eq!(sections[1].summary.as_deref(), Some("Summary of B"));
    assert_eq!(model.summary_calls(), 1);
}

#[tokio::test]
async fn test_failures_degrade_to_placeholder() {
    let model = ScriptedModel::new().failing_summaries();
    let mut sections = parse("# A\na\n# B\nb");
    SummaryGenerator::new(&model, "Summary unavailable.")
        .summarize_missing(&mut sections)
        .await;

    for section in &sections {
        assert_eq!(section.summary.as_deref(), Some("Summary unavailable."));
    }
}

#[tokio::test]
async fn test_empty_sections_skip_the_model() {
    let model = ScriptedModel::new();
    let mut sections = parse("# Empty\n\n# Full\ntext");
    SummaryGenerator::new(&model, "n/a")
        .summarize_missing(&mut sections)
        .await;

    assert_eq!(sections[0].summary.as_deref(), Some(EMPTY_SECTION_SUMMARY));
    assert_eq!(model.summary_calls(), 1);
}

#[test]
fn test_summary_request_carries_title_and_content() {
    let sections = parse("# Scope\nPhase one.");
    let messages = SummaryGenerator::<ScriptedModel>::messages(&sections[0]);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "Section: Scope\n\nPhase one.");
}
