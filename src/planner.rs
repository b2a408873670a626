//! Turns a free-text edit request into a validated [`EditPlan`].

use crate::edit_plan::EditPlan;
use crate::model::{ChatModel, Message, ModelError};
use crate::section::Section;
use std::fmt::Write;
use tracing::info;

const PLANNER_INSTRUCTIONS: &str = r#"You edit Business Requirements Documents written in markdown.
You receive every section of the document and a change request from the user.
Decide which sections must change to satisfy the request and rewrite only those.

Reply with a single JSON object and nothing else, shaped exactly like this:
{
  "sectionsToUpdate": [{"title": "<section title>", "reasoning": "<why it changes>"}],
  "updatedSections": [{"title": "<section title>", "content": "<full new body, without the heading line>"}],
  "summaryOfChanges": ["<one line per change>"]
}

Use section titles exactly as given. Leave sections that need no change out of both lists."#;

/// Asks a language model which sections to rewrite for a request.
pub struct EditPlanner<'a, M: ?Sized> {
    model: &'a M,
}

impl<'a, M: ChatModel + ?Sized> EditPlanner<'a, M> {
    /// Plans with `model`.
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Messages sent to plan `prompt` against `sections`.
    #[must_use]
    pub fn messages(sections: &[Section], prompt: &str) -> Vec<Message> {
        let mut document = String::new();
        for section in sections {
            let _ = writeln!(
                document,
                "=== Section: {} (level {}) ===\n{}\n",
                section.title, section.level, section.content
            );
        }
        vec![
            Message::system(PLANNER_INSTRUCTIONS),
            Message::user(format!(
                "Document sections:\n\n{document}\nChange request:\n{}",
                prompt.trim()
            )),
        ]
    }

    /// Produces a plan for `prompt`.
    ///
    /// A reply that is not a valid plan yields an empty plan explaining why, so callers can
    /// treat the result as safe to apply.
    ///
    /// # Errors
    ///
    /// Returns the model error when the model itself cannot be reached.
    pub async fn plan(&self, sections: &[Section], prompt: &str) -> Result<EditPlan, ModelError> {
        let reply = self
            .model
            .complete(&Self::messages(sections, prompt))
            .await?;
        let plan = EditPlan::from_response(&reply);
        info!(
            updates = plan.updated_sections.len(),
            changes = plan.summary_of_changes.len(),
            "edit plan ready"
        );
        Ok(plan)
    }
}

#[cfg(test)]
#[path = "tests/planner.rs"]
mod tests;
