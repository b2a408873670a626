use super::{DocumentId, DocumentStore, Revision, SqliteStore, StoreError};
use crate::edit_plan::EditPlan;
use crate::parser::parse;
use crate::section::SectionId;
use crate::test_support::plan_reply;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const DOC: &str = "# Goals\nShip.\n## Metrics\nNPS.\n";

fn store_with_doc() -> (SqliteStore, DocumentId) {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.create_document("brd.md", DOC).unwrap();
    let mut sections = parse(DOC);
    sections[0].summary = Some("About goals".to_string());
    store
        .commit_revision(
            id,
            Revision {
                content: DOC,
                sections: &sections,
                history: None,
            },
        )
        .unwrap();
    (store, id)
}

#[test]
fn test_create_and_get_document() {
    let (store, id) = store_with_doc();
    let doc = store.get_document(id).unwrap();
    assert_eq!(doc.id, id);
    assert_eq!(doc.filename, "brd.md");
    assert_eq!(doc.content, DOC);
}

#[test]
fn test_sections_round_trip_with_ids() {
    let (store, id) = store_with_doc();
    let stored = store.list_sections(id).unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|s| s.id.is_some()));

    let mut expected = parse(DOC);
    expected[0].summary = Some("About goals".to_string());
    for (stored, expected) in stored.iter().zip(&expected) {
        assert_eq!(stored.title, expected.title);
        assert_eq!(stored.level, expected.level);
        assert_eq!(stored.content, expected.content);
        assert_eq!(stored.start_index, expected.start_index);
        assert_eq!(stored.end_index, expected.end_index);
        assert_eq!(stored.summary, expected.summary);
    }
}

#[test]
fn test_commit_replaces_sections() {
    let (mut store, id) = store_with_doc();
    let text = "# Only\nbody";
    let returned = store
        .commit_revision(
            id,
            Revision {
                content: text,
                sections: &parse(text),
                history: None,
            },
        )
        .unwrap();
    let listed = store.list_sections(id).unwrap();
    assert_eq!(returned, listed);
    assert_eq!(listed.len(), 1);
    assert_eq!(store.get_document(id).unwrap().content, text);
}

#[test]
fn test_replace_section_content() {
    let (mut store, id) = store_with_doc();
    let section_id = store.list_sections(id).unwrap()[1].id.unwrap();
    store
        .replace_section_content(section_id, "NPS above 40.", Some("Targets"))
        .unwrap();
    let metrics = &store.list_sections(id).unwrap()[1];
    assert_eq!(metrics.content, "NPS above 40.");
    assert_eq!(metrics.summary.as_deref(), Some("Targets"));

    let err = store
        .replace_section_content(SectionId(9999), "x", None)
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownSection(SectionId(9999))));
}

#[test]
fn test_update_document_content() {
    let (mut store, id) = store_with_doc();
    store.update_document_content(id, "# New").unwrap();
    assert_eq!(store.get_document(id).unwrap().content, "# New");
    assert!(matches!(
        store.update_document_content(DocumentId(42), "x"),
        Err(StoreError::UnknownDocument(DocumentId(42)))
    ));
}

#[test]
fn test_edit_history_in_order() {
    let (mut store, id) = store_with_doc();
    let first = EditPlan::validate(&plan_reply(&[("Goals", "Ship fast.")], &["Faster"])).unwrap();
    let second = EditPlan::failed("nothing to do");
    store.record_edit_history(id, "speed up", &first).unwrap();
    store
        .commit_revision(
            id,
            Revision {
                content: DOC,
                sections: &parse(DOC),
                history: Some(("no-op", &second)),
            },
        )
        .unwrap();

    let history = store.list_history(id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].prompt, "speed up");
    assert_eq!(history[0].plan, first);
    assert_eq!(history[1].prompt, "no-op");
    assert_eq!(history[1].plan, second);
    assert!(history[0].id < history[1].id);
    assert!(chrono::DateTime::parse_from_rfc3339(&history[0].created_at).is_ok());
}

#[test]
fn test_unknown_document() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let missing = DocumentId(7);
    assert!(matches!(
        store.get_document(missing),
        Err(StoreError::UnknownDocument(_))
    ));
    assert!(matches!(
        store.list_sections(missing),
        Err(StoreError::UnknownDocument(_))
    ));
    assert!(matches!(
        store.record_edit_history(missing, "p", &EditPlan::default()),
        Err(StoreError::UnknownDocument(_))
    ));
}

#[test]
fn test_failed_commit_leaves_previous_revision() {
    let (mut store, id) = store_with_doc();
    let mut sections = parse("# X");
    sections[0].level = usize::MAX;
    let err = store
        .commit_revision(
            id,
            Revision {
                content: "# X",
                sections: &sections,
                history: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt("section level")));
    assert_eq!(store.get_document(id).unwrap().content, DOC);
    assert_eq!(store.list_sections(id).unwrap().len(), 2);
}

#[test]
fn test_create_with_revision() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let (id, sections) = store
        .create_with_revision(
            "brd.md",
            Revision {
                content: DOC,
                sections: &parse(DOC),
                history: None,
            },
        )
        .unwrap();
    assert_eq!(store.get_document(id).unwrap().content, DOC);
    assert_eq!(store.list_sections(id).unwrap(), sections);
}

#[test]
fn test_failed_create_leaves_no_document() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut sections = parse(DOC);
    sections[1].level = usize::MAX;
    let err = store
        .create_with_revision(
            "brd.md",
            Revision {
                content: DOC,
                sections: &sections,
                history: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt("section level")));

    let documents: i64 = store
        .conn
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .unwrap();
    let section_rows: i64 = store
        .conn
        .query_row("SELECT COUNT(*) FROM sections", [], |row| row.get(0))
        .unwrap();
    assert_eq!((documents, section_rows), (0, 0));
}

#[test]
fn test_reopen_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("brdedit.db");
    let id = {
        let mut store = SqliteStore::open(&path).unwrap();
        let id = store.create_document("a.md", "# A\na").unwrap();
        store
            .commit_revision(
                id,
                Revision {
                    content: "# A\na",
                    sections: &parse("# A\na"),
                    history: None,
                },
            )
            .unwrap();
        id
    };

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.get_document(id).unwrap().filename, "a.md");
    assert_eq!(store.list_sections(id).unwrap()[0].title, "A");
}
