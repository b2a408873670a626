//! The edit plan describes which sections a requested change rewrites and with what.
//!
//! Plans come back from the language model as JSON and are validated strictly before anything
//! touches the document. A response that fails validation never surfaces as an error to the
//! edit flow; it becomes an empty plan whose change summary explains what went wrong, so the
//! document is left exactly as it was.

use crate::formats::markdown::MarkdownFormat;
use crate::patcher::{patch_document, Patched};
use crate::section::Section;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

const SECTIONS_TO_UPDATE: &str = "sectionsToUpdate";
const UPDATED_SECTIONS: &str = "updatedSections";
const SUMMARY_OF_CHANGES: &str = "summaryOfChanges";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Serialisable set of section rewrites produced for one edit request.
pub struct EditPlan {
    /// Sections the planner chose to touch, with its reasoning. Informational only.
    pub sections_to_update: Vec<SectionUpdate>,
    /// Authoritative replacement content keyed by section title.
    pub updated_sections: Vec<UpdatedSection>,
    /// Human-readable description of the changes.
    pub summary_of_changes: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
/// Why the planner decided a section needs changing.
pub struct SectionUpdate {
    /// Title of the section.
    pub title: String,
    /// Planner's explanation.
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
/// New body for one section.
pub struct UpdatedSection {
    /// Title of the section to replace.
    pub title: String,
    /// Replacement body, without the heading line.
    pub content: String,
}

/// Reasons a planner response is rejected.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The response is not JSON.
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The response is JSON but not an object.
    #[error("response is not a JSON object")]
    NotAnObject,

    /// A required top-level key is absent or not an array.
    #[error("`{0}` is missing or not an array")]
    MissingArray(&'static str),

    /// An array entry has the wrong shape.
    #[error("entry {index} of `{field}` is malformed: {source}")]
    InvalidEntry {
        /// Top-level key holding the entry.
        field: &'static str,
        /// Position of the entry.
        index: usize,
        /// Underlying decoding error.
        source: serde_json::Error,
    },

    /// An updated section has an empty title.
    #[error("entry {index} of `updatedSections` has an empty title")]
    EmptyTitle {
        /// Position of the entry.
        index: usize,
    },

    /// An updated section has empty content.
    #[error("updated section {title:?} has empty content")]
    EmptyContent {
        /// Title of the offending entry.
        title: String,
    },
}

impl EditPlan {
    #[must_use]
    /// A plan that changes nothing and reports `message` as its only change summary.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            sections_to_update: Vec::new(),
            updated_sections: Vec::new(),
            summary_of_changes: vec![message.into()],
        }
    }

    /// Validates a raw planner response.
    ///
    /// A surrounding markdown code fence is tolerated. All three top-level arrays must be
    /// present (empty is fine) and every updated section needs a non-empty title and content.
    ///
    /// # Errors
    ///
    /// Returns the first rule the response breaks.
    pub fn validate(response: &str) -> Result<Self, PlanError> {
        let value: Value = serde_json::from_str(strip_code_fence(response))?;
        let object = value.as_object().ok_or(PlanError::NotAnObject)?;

        let sections_to_update: Vec<SectionUpdate> = entries(object, SECTIONS_TO_UPDATE)?;
        let updated_sections: Vec<UpdatedSection> = entries(object, UPDATED_SECTIONS)?;
        let summary_of_changes: Vec<String> = entries(object, SUMMARY_OF_CHANGES)?;

        for (index, section) in updated_sections.iter().enumerate() {
            if section.title.trim().is_empty() {
                return Err(PlanError::EmptyTitle { index });
            }
            if section.content.trim().is_empty() {
                return Err(PlanError::EmptyContent {
                    title: section.title.clone(),
                });
            }
        }

        Ok(Self {
            sections_to_update,
            updated_sections,
            summary_of_changes,
        })
    }

    #[must_use]
    /// Validates a raw planner response, degrading to [`EditPlan::failed`] on any problem.
    pub fn from_response(response: &str) -> Self {
        match Self::validate(response) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "rejecting edit plan");
                Self::failed(format!("The edit plan could not be used: {e}"))
            }
        }
    }

    #[must_use]
    /// True when applying the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.updated_sections.is_empty()
    }

    #[must_use]
    /// Replacement content keyed by title. The first entry for a repeated title wins.
    pub fn replacements(&self) -> HashMap<String, String> {
        let mut map = HashMap::with_capacity(self.updated_sections.len());
        for section in &self.updated_sections {
            map.entry(section.title.clone())
                .or_insert_with(|| section.content.clone());
        }
        map
    }

    #[must_use]
    /// Applies the plan's replacements to `text`, whose sections are `sections`.
    pub fn apply(&self, text: &str, sections: &[Section]) -> Patched {
        patch_document(&MarkdownFormat, text, sections, &self.replacements())
    }
}

fn entries<T: serde::de::DeserializeOwned>(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<T>, PlanError> {
    let array = object
        .get(field)
        .and_then(Value::as_array)
        .ok_or(PlanError::MissingArray(field))?;
    array
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            T::deserialize(entry).map_err(|source| PlanError::InvalidEntry {
                field,
                index,
                source,
            })
        })
        .collect()
}

/// Strips one surrounding markdown code fence (optionally tagged, e.g. ```` ```json ````).
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((_tag, inner)) => inner.trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
#[path = "tests/edit_plan.rs"]
mod tests;
