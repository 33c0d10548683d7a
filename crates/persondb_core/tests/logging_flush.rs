use persondb_core::db::{close_db, connect, StoreUri};
use persondb_core::{flush_logging, init_logging, LogSettings};
use std::fs;
use std::path::Path;

#[test]
fn flushed_log_contains_connection_events() {
    let dir = tempfile::tempdir().unwrap();
    let settings = LogSettings::new("info", dir.path().join("logs")).unwrap();
    init_logging(&settings).unwrap();

    let conn = connect(&StoreUri::Memory).unwrap();
    close_db(conn).unwrap();
    flush_logging();

    let contents = read_logs(&settings.dir);
    assert!(contents.contains("event=db_connect"), "log was: {contents}");
    assert!(contents.contains("connection successful"));
    assert!(contents.contains("event=db_close"));
}

fn read_logs(dir: &Path) -> String {
    let mut contents = String::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_file() {
            contents.push_str(&fs::read_to_string(path).unwrap());
        }
    }
    contents
}
