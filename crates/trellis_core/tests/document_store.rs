use rusqlite::Connection;
use serde_json::json;
use trellis_core::db::migrations::latest_version;
use trellis_core::db::open_db_in_memory;
use trellis_core::{
    Document, DocumentKind, DocumentStore, Node, NodeKind, NodePath, PathTree,
    SqliteDocumentStore, StoreError,
};

fn menu() -> Document {
    let root = Node::new(NodeKind::Root, "Main").with_child(
        0,
        "shop",
        Node::new(NodeKind::Item, "Shop")
            .with_child(0, "shoes", Node::new(NodeKind::Item, "Shoes"))
            .with_child(1, "bags", Node::new(NodeKind::Item, "Bags")),
    );
    let mut document = Document::from_tree(PathTree::with_root(DocumentKind::Menu, root));
    document.title = Some("Main menu".to_string());
    document
        .settings
        .insert("orientation".to_string(), json!("horizontal"));
    document
}

#[test]
fn save_then_load_returns_the_same_document() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store.save(DocumentKind::Menu, "main", &menu()).unwrap();
    let loaded = store.load(DocumentKind::Menu, "main").unwrap().unwrap();

    assert_eq!(loaded, menu());
    assert_eq!(
        loaded.tree.column_of(&NodePath::parse("shop/bags").unwrap()),
        Some(1)
    );
}

#[test]
fn missing_document_loads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    assert!(store.load(DocumentKind::Layout, "home").unwrap().is_none());
    assert!(!store.exists(DocumentKind::Layout, "home").unwrap());
}

#[test]
fn save_overwrites_the_previous_body() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store.save(DocumentKind::Menu, "main", &menu()).unwrap();
    let mut renamed = menu();
    renamed.title = Some("Footer menu".to_string());
    store.save(DocumentKind::Menu, "main", &renamed).unwrap();

    let loaded = store.load(DocumentKind::Menu, "main").unwrap().unwrap();
    assert_eq!(loaded.title.as_deref(), Some("Footer menu"));
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn kinds_are_separate_namespaces() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store.save(DocumentKind::Menu, "main", &menu()).unwrap();

    assert!(store.exists(DocumentKind::Menu, "main").unwrap());
    assert!(!store.exists(DocumentKind::Layout, "main").unwrap());
}

#[test]
fn saving_a_document_under_the_wrong_kind_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    let err = store.save(DocumentKind::Layout, "main", &menu()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn body_decoding_to_another_kind_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let body = serde_json::to_string(&menu()).unwrap();
    conn.execute(
        "INSERT INTO documents (kind, doc_id, body) VALUES ('layout', 'home', ?1);",
        [body],
    )
    .unwrap();

    let err = store.load(DocumentKind::Layout, "home").unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn corrupt_body_reports_codec_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO documents (kind, doc_id, body) VALUES ('menu', 'broken', 'not json');",
        [],
    )
    .unwrap();

    let err = store.load(DocumentKind::Menu, "broken").unwrap_err();
    assert!(matches!(err, StoreError::Codec(_)));
}

#[test]
fn blank_id_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    let err = store.load(DocumentKind::Menu, "  ").unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocumentId(_)));
}

#[test]
fn list_ids_filters_by_prefix_in_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let layout = Document::new(DocumentKind::Layout);

    for id in ["presets/blog", "home", "presets/agency", "about"] {
        store.save(DocumentKind::Layout, id, &layout).unwrap();
    }

    assert_eq!(
        store.list_ids(DocumentKind::Layout, "presets/").unwrap(),
        vec!["presets/agency".to_string(), "presets/blog".to_string()]
    );
    assert_eq!(store.list_ids(DocumentKind::Layout, "").unwrap().len(), 4);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteDocumentStore::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        StoreError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn connection_missing_documents_table_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let err = SqliteDocumentStore::try_new(&conn).err().unwrap();
    assert!(matches!(err, StoreError::MissingRequiredTable("documents")));
}
