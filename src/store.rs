//! Persistence for documents, their sections and the history of edit requests.
//!
//! [`DocumentStore`] is the contract the editor relies on; [`SqliteStore`] implements it on a
//! local SQLite database. Section rows are always replaced as a whole when a document changes,
//! and [`DocumentStore::commit_revision`] does so in one transaction together with the new
//! content and the history entry, so a failed commit leaves the previous revision intact.

use crate::edit_plan::EditPlan;
use crate::section::{Section, SectionId};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a stored document.
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// A stored document.
pub struct Document {
    /// Store identifier.
    pub id: DocumentId,
    /// Name the document was loaded under.
    pub filename: String,
    /// Current full text.
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// One recorded edit request.
pub struct EditHistoryEntry {
    /// Row identifier, increasing in insertion order.
    pub id: i64,
    /// The user's request text.
    pub prompt: String,
    /// The plan that was produced for it.
    pub plan: EditPlan,
    /// RFC 3339 timestamp of the request.
    pub created_at: String,
}

/// A complete new state of a document, written atomically.
#[derive(Clone, Copy, Debug)]
pub struct Revision<'a> {
    /// Full document text.
    pub content: &'a str,
    /// Sections parsed from `content`, summaries attached.
    pub sections: &'a [Section],
    /// Edit request and plan that produced this revision, if any.
    pub history: Option<(&'a str, &'a EditPlan)>,
}

/// Store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error.
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A plan could not be encoded or decoded.
    #[error("plan json: {0}")]
    Json(#[from] serde_json::Error),

    /// No document has this id.
    #[error("unknown document {0}")]
    UnknownDocument(DocumentId),

    /// No section has this id.
    #[error("unknown section {0}")]
    UnknownSection(SectionId),

    /// A stored value is out of range for its Rust type.
    #[error("corrupt row: {0}")]
    Corrupt(&'static str),
}

/// Durable storage of documents, sections and edit history.
pub trait DocumentStore {
    /// Stores a new document and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_document(&mut self, filename: &str, content: &str) -> Result<DocumentId, StoreError>;

    /// Stores a new document together with its first revision in one transaction.
    ///
    /// Returns the new id and the sections with their assigned ids.
    ///
    /// # Errors
    ///
    /// Returns an error, with nothing written, if any part fails.
    fn create_with_revision(
        &mut self,
        filename: &str,
        revision: Revision<'_>,
    ) -> Result<(DocumentId, Vec<Section>), StoreError>;

    /// Loads a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDocument`] if it does not exist.
    fn get_document(&self, id: DocumentId) -> Result<Document, StoreError>;

    /// Overwrites a document's text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDocument`] if it does not exist.
    fn update_document_content(&mut self, id: DocumentId, content: &str)
        -> Result<(), StoreError>;

    /// Lists a document's sections in document order, ids attached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDocument`] if it does not exist.
    fn list_sections(&self, id: DocumentId) -> Result<Vec<Section>, StoreError>;

    /// Overwrites one section's content and summary.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSection`] if it does not exist.
    fn replace_section_content(
        &mut self,
        section_id: SectionId,
        content: &str,
        summary: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Appends an edit request and its plan to the document's history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDocument`] if it does not exist.
    fn record_edit_history(
        &mut self,
        id: DocumentId,
        prompt: &str,
        plan: &EditPlan,
    ) -> Result<(), StoreError>;

    /// Lists the document's history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDocument`] if it does not exist.
    fn list_history(&self, id: DocumentId) -> Result<Vec<EditHistoryEntry>, StoreError>;

    /// Writes content, the full section list and the optional history entry atomically.
    ///
    /// Returns the sections with their newly assigned ids.
    ///
    /// # Errors
    ///
    /// Returns an error, with nothing written, if any part fails.
    fn commit_revision(
        &mut self,
        id: DocumentId,
        revision: Revision<'_>,
    ) -> Result<Vec<Section>, StoreError>;
}

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS sections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    level INTEGER NOT NULL,
    content TEXT NOT NULL,
    start_index INTEGER NOT NULL,
    end_index INTEGER NOT NULL,
    summary TEXT
);
CREATE INDEX IF NOT EXISTS sections_by_document ON sections(document_id, position);
CREATE TABLE IF NOT EXISTS edit_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    prompt TEXT NOT NULL,
    plan_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// [`DocumentStore`] backed by SQLite.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema installed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be installed.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteStore {
    fn create_document(&mut self, filename: &str, content: &str) -> Result<DocumentId, StoreError> {
        let id = insert_document_tx(&self.conn, filename, content)?;
        debug!(%id, filename, "document created");
        Ok(id)
    }

    fn create_with_revision(
        &mut self,
        filename: &str,
        revision: Revision<'_>,
    ) -> Result<(DocumentId, Vec<Section>), StoreError> {
        let tx = self.conn.transaction()?;
        let id = insert_document_tx(&tx, filename, revision.content)?;
        let sections = replace_sections_tx(&tx, id, revision.sections)?;
        if let Some((prompt, plan)) = revision.history {
            record_history_tx(&tx, id, prompt, plan)?;
        }
        tx.commit()?;
        debug!(%id, filename, sections = sections.len(), "document created");
        Ok((id, sections))
    }

    fn get_document(&self, id: DocumentId) -> Result<Document, StoreError> {
        self.conn
            .query_row(
                "SELECT filename, content FROM documents WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(Document {
                        id,
                        filename: row.get(0)?,
                        content: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::UnknownDocument(id))
    }

    fn update_document_content(
        &mut self,
        id: DocumentId,
        content: &str,
    ) -> Result<(), StoreError> {
        update_content_tx(&self.conn, id, content)
    }

    fn list_sections(&self, id: DocumentId) -> Result<Vec<Section>, StoreError> {
        ensure_document(&self.conn, id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, title, level, content, start_index, end_index, summary \
             FROM sections WHERE document_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok(SectionRow {
                id: row.get(0)?,
                title: row.get(1)?,
                level: row.get(2)?,
                content: row.get(3)?,
                start_index: row.get(4)?,
                end_index: row.get(5)?,
                summary: row.get(6)?,
            })
        })?;
        let mut sections = Vec::new();
        for row in rows {
            sections.push(row?.into_section()?);
        }
        Ok(sections)
    }

    fn replace_section_content(
        &mut self,
        section_id: SectionId,
        content: &str,
        summary: Option<&str>,
    ) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE sections SET content = ?1, summary = ?2 WHERE id = ?3",
            params![content, summary, section_id.0],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownSection(section_id));
        }
        Ok(())
    }

    fn record_edit_history(
        &mut self,
        id: DocumentId,
        prompt: &str,
        plan: &EditPlan,
    ) -> Result<(), StoreError> {
        record_history_tx(&self.conn, id, prompt, plan)
    }

    fn list_history(&self, id: DocumentId) -> Result<Vec<EditHistoryEntry>, StoreError> {
        ensure_document(&self.conn, id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, prompt, plan_json, created_at FROM edit_history \
             WHERE document_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut history = Vec::new();
        for row in rows {
            let (entry_id, prompt, plan_json, created_at) = row?;
            history.push(EditHistoryEntry {
                id: entry_id,
                prompt,
                plan: serde_json::from_str(&plan_json)?,
                created_at,
            });
        }
        Ok(history)
    }

    fn commit_revision(
        &mut self,
        id: DocumentId,
        revision: Revision<'_>,
    ) -> Result<Vec<Section>, StoreError> {
        let tx = self.conn.transaction()?;
        update_content_tx(&tx, id, revision.content)?;
        let sections = replace_sections_tx(&tx, id, revision.sections)?;
        if let Some((prompt, plan)) = revision.history {
            record_history_tx(&tx, id, prompt, plan)?;
        }
        tx.commit()?;
        debug!(%id, sections = sections.len(), "revision committed");
        Ok(sections)
    }
}

struct SectionRow {
    id: i64,
    title: String,
    level: i64,
    content: String,
    start_index: i64,
    end_index: i64,
    summary: Option<String>,
}

impl SectionRow {
    fn into_section(self) -> Result<Section, StoreError> {
        Ok(Section {
            id: Some(SectionId(self.id)),
            title: self.title,
            level: to_usize(self.level, "section level")?,
            content: self.content,
            start_index: to_usize(self.start_index, "section start index")?,
            end_index: to_usize(self.end_index, "section end index")?,
            summary: self.summary,
        })
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn to_usize(value: i64, what: &'static str) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::Corrupt(what))
}

fn to_i64(value: usize, what: &'static str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt(what))
}

fn ensure_document(conn: &Connection, id: DocumentId) -> Result<(), StoreError> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM documents WHERE id = ?1",
            params![id.0],
            |_| Ok(()),
        )
        .optional()?;
    exists.ok_or(StoreError::UnknownDocument(id))
}

fn insert_document_tx(
    conn: &Connection,
    filename: &str,
    content: &str,
) -> Result<DocumentId, StoreError> {
    conn.execute(
        "INSERT INTO documents(filename, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![filename, content, now()],
    )?;
    Ok(DocumentId(conn.last_insert_rowid()))
}

fn update_content_tx(conn: &Connection, id: DocumentId, content: &str) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE documents SET content = ?1, updated_at = ?2 WHERE id = ?3",
        params![content, now(), id.0],
    )?;
    if changed == 0 {
        return Err(StoreError::UnknownDocument(id));
    }
    Ok(())
}

fn replace_sections_tx(
    conn: &Connection,
    id: DocumentId,
    sections: &[Section],
) -> Result<Vec<Section>, StoreError> {
    conn.execute("DELETE FROM sections WHERE document_id = ?1", params![id.0])?;
    let mut stmt = conn.prepare(
        "INSERT INTO sections(document_id, position, title, level, content, start_index, end_index, summary) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut stored = Vec::with_capacity(sections.len());
    for (position, section) in sections.iter().enumerate() {
        stmt.execute(params![
            id.0,
            to_i64(position, "section position")?,
            section.title,
            to_i64(section.level, "section level")?,
            section.content,
            to_i64(section.start_index, "section start index")?,
            to_i64(section.end_index, "section end index")?,
            section.summary,
        ])?;
        let mut section = section.clone();
        section.id = Some(SectionId(conn.last_insert_rowid()));
        stored.push(section);
    }
    Ok(stored)
}

fn record_history_tx(
    conn: &Connection,
    id: DocumentId,
    prompt: &str,
    plan: &EditPlan,
) -> Result<(), StoreError> {
    ensure_document(conn, id)?;
    conn.execute(
        "INSERT INTO edit_history(document_id, prompt, plan_json, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id.0, prompt, serde_json::to_string(plan)?, now()],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod tests;
