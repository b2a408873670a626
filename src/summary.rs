//! Per-section summaries.
//!
//! One model call per section, issued concurrently. A failed call never fails the batch: the
//! section gets the configured placeholder instead, so a section list is always complete once
//! [`SummaryGenerator::summarize_missing`] returns.

use crate::model::{ChatModel, Message};
use crate::section::Section;
use futures::future::join_all;
use tracing::{debug, warn};

const SUMMARY_INSTRUCTIONS: &str = "You summarize sections of a Business Requirements Document. \
Reply with two or three plain sentences describing what the section requires. \
Do not use markdown and do not repeat the section title.";

/// Summary text used for sections without any body.
pub const EMPTY_SECTION_SUMMARY: &str = "This section has no content.";

/// Generates section summaries with a language model.
pub struct SummaryGenerator<'a, M: ?Sized> {
    model: &'a M,
    placeholder: &'a str,
}

impl<'a, M: ChatModel + ?Sized> SummaryGenerator<'a, M> {
    /// Uses `model`, falling back to `placeholder` when a call fails.
    pub fn new(model: &'a M, placeholder: &'a str) -> Self {
        Self { model, placeholder }
    }

    /// Messages sent to summarize `section`.
    #[must_use]
    pub fn messages(section: &Section) -> Vec<Message> {
        vec![
            Message::system(SUMMARY_INSTRUCTIONS),
            Message::user(format!(
                "Section: {}\n\n{}",
                section.title, section.content
            )),
        ]
    }

    /// Summarizes one section, degrading to the placeholder on failure.
    pub async fn summarize(&self, section: &Section) -> String {
        if section.content.is_empty() {
            return EMPTY_SECTION_SUMMARY.to_string();
        }
        match self.model.complete(&Self::messages(section)).await {
            Ok(summary) => {
                debug!(title = %section.title, "summary generated");
                summary.trim().to_string()
            }
            Err(e) => {
                warn!(title = %section.title, error = %e, "summary unavailable, using placeholder");
                self.placeholder.to_string()
            }
        }
    }

    /// Fills in every missing summary, one concurrent request per section.
    pub async fn summarize_missing(&self, sections: &mut [Section]) {
        let pending: Vec<usize> = sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.summary.is_none())
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return;
        }

        let summaries = {
            let shared: &[Section] = sections;
            join_all(pending.iter().map(|&i| self.summarize(&shared[i]))).await
        };
        for (i, summary) in pending.into_iter().zip(summaries) {
            sections[i].summary = Some(summary);
        }
    }
}

#[cfg(test)]
#[path = "tests/summary.rs"]
mod tests;
