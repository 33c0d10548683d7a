use persondb_core::db::migrations::latest_version;
use persondb_core::db::{close_db, connect, open_db, open_db_in_memory, ping, DbError, StoreUri};
use persondb_core::{NewPerson, PersonRepository, SqlitePersonRepository};
use rusqlite::Connection;

#[test]
fn in_memory_store_is_migrated_and_alive() {
    let conn = connect(&StoreUri::Memory).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "documents");
    ping(&conn).unwrap();
}

#[test]
fn file_store_keeps_documents_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let uri = StoreUri::parse(&format!(
        "sqlite://{}",
        dir.path().join("learn-mongodb.db").display()
    ))
    .unwrap();

    let id = {
        let conn = connect(&uri).unwrap();
        let repo = SqlitePersonRepository::new(&conn);
        let saved = repo.create_person(&NewPerson::new("Rick")).unwrap();
        drop(repo);
        close_db(conn).unwrap();
        saved.id
    };

    let conn = connect(&uri).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let repo = SqlitePersonRepository::new(&conn);
    assert_eq!(repo.find_by_id(id).unwrap().unwrap().name, "Rick");
}

#[test]
fn unreachable_store_reports_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing_parent = dir.path().join("no-such-dir").join("people.db");

    let err = connect(&StoreUri::file(&missing_parent)).unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
}

#[test]
fn store_with_newer_layout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reopening_in_memory_yields_an_empty_store() {
    let first = open_db_in_memory().unwrap();
    SqlitePersonRepository::new(&first)
        .create_person(&NewPerson::new("Jerry"))
        .unwrap();

    let second = open_db_in_memory().unwrap();
    let found = SqlitePersonRepository::new(&second)
        .find_by_name("Jerry")
        .unwrap();
    assert!(found.is_empty());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
