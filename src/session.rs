//! Editing sessions: the operations a front end drives.
//!
//! There is no ambient document state. Each operation takes the caller's [`Session`] by
//! reference and, on success, returns a new one; on failure the caller still holds the session
//! it passed in, which matches what is persisted because every write happens in a single
//! [`DocumentStore::commit_revision`] after all model calls have resolved.

use crate::edit_plan::EditPlan;
use crate::error::EditorError;
use crate::model::ChatModel;
use crate::parser::parse;
use crate::planner::EditPlanner;
use crate::section::{carry_over_summaries, Section};
use crate::store::{Document, DocumentId, DocumentStore, EditHistoryEntry, Revision};
use crate::summary::SummaryGenerator;
use std::collections::HashSet;
use tracing::info;

/// Default text stored when a summary cannot be generated.
pub const DEFAULT_SUMMARY_PLACEHOLDER: &str = "Summary unavailable.";

#[derive(Clone, Debug, PartialEq, Eq)]
/// A document together with the sections parsed from its current text.
pub struct Session {
    /// The stored document.
    pub document: Document,
    /// Sections of `document.content`, in order, with ids and summaries.
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Result of an AI edit request.
pub struct EditOutcome {
    /// The session after the edit (unchanged if the plan changed nothing).
    pub session: Session,
    /// The validated plan.
    pub plan: EditPlan,
    /// Lines to show the user describing what happened.
    pub change_summary: Vec<String>,
    /// Titles the plan rewrote that the document does not contain.
    pub unmatched_titles: Vec<String>,
}

/// Drives document operations against a model and a store.
pub struct Editor<M, S> {
    model: M,
    store: S,
    placeholder: String,
}

impl<M: ChatModel, S: DocumentStore> Editor<M, S> {
    #[must_use]
    /// An editor using `model` for summaries and plans and `store` for persistence.
    pub fn new(model: M, store: S) -> Self {
        Self {
            model,
            store,
            placeholder: DEFAULT_SUMMARY_PLACEHOLDER.to_string(),
        }
    }

    #[must_use]
    /// Uses `placeholder` for summaries that could not be generated.
    pub fn with_summary_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn summaries(&self) -> SummaryGenerator<'_, M> {
        SummaryGenerator::new(&self.model, &self.placeholder)
    }

    /// Parses, summarizes and stores a new document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be stored. Summary failures only produce
    /// placeholder summaries.
    pub async fn load_document(
        &mut self,
        content: &str,
        filename: &str,
    ) -> Result<Session, EditorError> {
        let mut sections = parse(content);
        info!(filename, sections = sections.len(), "loading document");
        self.summaries().summarize_missing(&mut sections).await;

        let (id, sections) = self.store.create_with_revision(
            filename,
            Revision {
                content,
                sections: &sections,
                history: None,
            },
        )?;
        Ok(Session {
            document: Document {
                id,
                filename: filename.to_string(),
                content: content.to_string(),
            },
            sections,
        })
    }

    /// Rebuilds a session for a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is unknown or cannot be read.
    pub fn open_session(&self, id: DocumentId) -> Result<Session, EditorError> {
        let document = self.store.get_document(id)?;
        let sections = self.store.list_sections(id)?;
        Ok(Session { document, sections })
    }

    /// Replaces the document text after a manual edit.
    ///
    /// Summaries carry over from sections with the same title; only sections without one are
    /// sent to the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the new revision cannot be stored.
    pub async fn update_document(
        &mut self,
        session: &Session,
        new_content: &str,
    ) -> Result<Session, EditorError> {
        let mut sections = parse(new_content);
        carry_over_summaries(&mut sections, &session.sections);
        self.summaries().summarize_missing(&mut sections).await;

        let id = session.document.id;
        let sections = self.store.commit_revision(
            id,
            Revision {
                content: new_content,
                sections: &sections,
                history: None,
            },
        )?;
        info!(%id, sections = sections.len(), "document updated");
        Ok(Session {
            document: Document {
                content: new_content.to_string(),
                ..session.document.clone()
            },
            sections,
        })
    }

    /// Plans and applies an AI edit for `prompt`.
    ///
    /// The plan resolves completely before anything is patched. Rewritten sections get fresh
    /// summaries; the others keep theirs. The request is recorded in the edit history even
    /// when the plan changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unavailable or the store fails. An unusable plan is
    /// not an error: it yields an unchanged session and an explanatory change summary.
    pub async fn request_edit(
        &mut self,
        session: &Session,
        prompt: &str,
    ) -> Result<EditOutcome, EditorError> {
        let id = session.document.id;
        let plan = EditPlanner::new(&self.model)
            .plan(&session.sections, prompt)
            .await?;

        let patched = plan.apply(&session.document.content, &session.sections);
        let mut change_summary = plan.summary_of_changes.clone();
        if !patched.unmatched_titles.is_empty() {
            change_summary.push(format!(
                "Skipped changes to sections not in the document: {}",
                patched.unmatched_titles.join(", ")
            ));
        }

        if plan.is_noop() || patched.text == session.document.content {
            self.store.record_edit_history(id, prompt, &plan)?;
            info!(%id, "edit request changed nothing");
            return Ok(EditOutcome {
                session: session.clone(),
                plan,
                change_summary,
                unmatched_titles: patched.unmatched_titles,
            });
        }

        let rewritten: HashSet<&str> = plan
            .updated_sections
            .iter()
            .map(|s| s.title.as_str())
            .filter(|title| !patched.unmatched_titles.iter().any(|t| t == title))
            .collect();
        let mut sections = parse(&patched.text);
        carry_over_summaries(&mut sections, &session.sections);
        // The patcher rewrites only the first section with each title; later namesakes keep
        // their summaries.
        for title in &rewritten {
            if let Some(section) = sections.iter_mut().find(|s| s.title == *title) {
                section.summary = None;
            }
        }
        self.summaries().summarize_missing(&mut sections).await;

        let sections = self.store.commit_revision(
            id,
            Revision {
                content: &patched.text,
                sections: &sections,
                history: Some((prompt, &plan)),
            },
        )?;
        info!(%id, rewritten = rewritten.len(), "edit applied");

        Ok(EditOutcome {
            session: Session {
                document: Document {
                    content: patched.text,
                    ..session.document.clone()
                },
                sections,
            },
            plan,
            change_summary,
            unmatched_titles: patched.unmatched_titles,
        })
    }

    /// Generates a new summary for the first section titled `title` and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownSection`] if no stored section has that title, or a store
    /// error if the write fails.
    pub async fn regenerate_summary(
        &mut self,
        session: &Session,
        title: &str,
    ) -> Result<Session, EditorError> {
        let index = session
            .sections
            .iter()
            .position(|s| s.title == title && s.id.is_some())
            .ok_or_else(|| EditorError::UnknownSection(title.to_string()))?;
        let section = &session.sections[index];
        let summary = self.summaries().summarize(section).await;

        if let Some(section_id) = section.id {
            self.store
                .replace_section_content(section_id, &section.content, Some(&summary))?;
        }

        let mut updated = session.clone();
        updated.sections[index].summary = Some(summary);
        Ok(updated)
    }

    /// Lists past edit requests for a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is unknown or the history cannot be read.
    pub fn history(&self, id: DocumentId) -> Result<Vec<EditHistoryEntry>, EditorError> {
        Ok(self.store.list_history(id)?)
    }
}

#[cfg(test)]
#[path = "tests/session.rs"]
mod tests;
