//! brdedit: section-aware editing of markdown requirements documents.
//!
//! A document is split into sections at its ATX headings ([`parser`]). Sections can be
//! rewritten by title without disturbing the rest of the text ([`patcher`]), summarized by a
//! language model ([`summary`]), and rewritten from a free-text request through a validated
//! [`edit_plan::EditPlan`] ([`planner`]). [`session::Editor`] ties these to a
//! [`store::DocumentStore`].

pub mod config;
pub mod edit_plan;
pub mod error;
pub mod formats;
pub mod model;
pub mod outline;
pub mod parser;
pub mod patcher;
pub mod planner;
pub mod section;
pub mod session;
pub mod store;
pub mod summary;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use edit_plan::EditPlan;
pub use error::EditorError;
pub use parser::parse;
pub use patcher::apply_replacements;
pub use section::Section;
pub use session::{EditOutcome, Editor, Session};
