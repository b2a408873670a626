//! Errors surfaced at the editor's operation boundary.
//!
//! Parsing never fails and invalid edit plans degrade to empty plans, so the only failures a
//! caller sees are collaborators being unavailable or misbehaving.

use crate::model::ModelError;
use crate::store::StoreError;

/// Failure of a load, update or edit operation.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The language model could not be reached.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// No section in the session has this title.
    #[error("no section titled {0:?}")]
    UnknownSection(String),
}

impl EditorError {
    #[must_use]
    /// Short headline suitable for a notification title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Store(_) => "Could not save the document",
            Self::Model(_) => "The AI model is unavailable",
            Self::UnknownSection(_) => "Section not found",
        }
    }

    #[must_use]
    /// Human-readable explanation.
    pub fn description(&self) -> String {
        self.to_string()
    }

    #[must_use]
    /// True if repeating the operation later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}
