use persondb_core::db::open_db_in_memory;
use persondb_core::store::{Collection, Filter, FindOptions, Projection, SortSpec};
use persondb_core::{
    NewPerson, PersonRepository, PersonService, RepoError, SqlitePersonRepository, StoreError,
};
use rusqlite::Connection;
use serde_json::json;
use std::thread;
use std::time::Duration;

fn seed_burrito_fans(service: &PersonService<SqlitePersonRepository<'_>>) {
    let people = [
        NewPerson::new("Zed").with_age(41).with_foods(["burrito"]),
        NewPerson::new("Amy").with_age(22).with_foods(["sushi", "burrito"]),
        NewPerson::new("Mo").with_age(35).with_foods(["burrito", "tea"]),
        NewPerson::new("Bea").with_age(29).with_foods(["pasta"]),
    ];
    service.create_many_people(&people).unwrap();
}

#[test]
fn query_chain_filters_sorts_limits_and_hides_age() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));
    seed_burrito_fans(&service);

    let docs = service.query_chain().unwrap();

    let names: Vec<_> = docs.iter().map(|doc| doc["name"].clone()).collect();
    assert_eq!(names, vec![json!("Amy"), json!("Mo")]);
    for doc in &docs {
        assert!(!doc.contains_key("age"));
        assert!(doc.contains_key("id"));
        assert!(doc["favoriteFoods"]
            .as_array()
            .unwrap()
            .contains(&json!("burrito")));
    }
}

#[test]
fn query_chain_with_no_matches_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));
    service.create_person(&NewPerson::new("Bea")).unwrap();

    assert!(service.query_chain().unwrap().is_empty());
}

#[test]
fn query_rejects_malformed_field_names_as_read_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);

    let err = repo
        .query(
            &Filter::all().eq("name') OR 1=1 --", "x"),
            &FindOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Read(StoreError::InvalidField(_))));

    let err = repo
        .query(
            &Filter::all(),
            &FindOptions::default().projection(Projection::exclude(["a.b"])),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Read(StoreError::InvalidField(_))));
}

#[test]
fn descending_sort_and_scalar_equality() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));
    seed_burrito_fans(&service);
    let repo = SqlitePersonRepository::new(&conn);

    let docs = repo
        .query(
            &Filter::all(),
            &FindOptions::default()
                .sort(SortSpec::descending("age"))
                .projection(Projection::include(["age"])),
        )
        .unwrap();
    let ages: Vec<_> = docs.iter().map(|doc| doc["age"].as_i64().unwrap()).collect();
    assert_eq!(ages, vec![41, 35, 29, 22]);
    assert!(docs.iter().all(|doc| doc.len() == 2));

    let exact = repo
        .query(&Filter::all().eq("age", 35), &FindOptions::default())
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0]["name"], json!("Mo"));
}

#[test]
fn collections_do_not_see_each_other() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));
    seed_burrito_fans(&service);

    let pets = Collection::new(&conn, "pets");
    let pet = json!({"id": "pet-1", "name": "Snowball", "favoriteFoods": ["burrito"]});
    pets.insert_one(pet.as_object().unwrap()).unwrap();

    assert_eq!(pets.count(&Filter::all()).unwrap(), 1);
    assert_eq!(service.query_chain().unwrap().len(), 2);
    assert!(matches!(
        pets.insert_one(pet.as_object().unwrap()),
        Err(StoreError::DuplicateId(id)) if id == "pet-1"
    ));
}

#[test]
fn insert_many_rolls_back_when_a_later_document_fails() {
    let conn = open_db_in_memory().unwrap();
    let pets = Collection::new(&conn, "pets");
    let batch: Vec<_> = [
        json!({"id": "pet-1", "name": "Snowball"}),
        json!({"id": "pet-2", "name": "Snuffles"}),
        json!({"id": "pet-1", "name": "Duplicate"}),
    ]
    .iter()
    .map(|doc| doc.as_object().cloned().unwrap())
    .collect();

    assert!(matches!(
        pets.insert_many(&batch),
        Err(StoreError::DuplicateId(_))
    ));
    assert_eq!(pets.count(&Filter::all()).unwrap(), 0);
}

#[test]
fn non_key_constraint_failures_stay_storage_errors() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TEMP TRIGGER pets_read_only BEFORE INSERT ON documents
         WHEN NEW.collection = 'pets'
         BEGIN SELECT RAISE(ABORT, 'pets are read-only'); END;",
    )
    .unwrap();
    let pets = Collection::new(&conn, "pets");
    let pet = json!({"id": "pet-1", "name": "Snowball"});

    assert!(matches!(
        pets.insert_one(pet.as_object().unwrap()),
        Err(StoreError::Sqlite(_))
    ));
}

#[test]
fn timestamps_keep_millisecond_precision() {
    let conn = open_db_in_memory().unwrap();
    let pets = Collection::new(&conn, "pets");
    for id in ["pet-1", "pet-2", "pet-3"] {
        pets.insert_one(json!({"id": id, "name": "Snowball"}).as_object().unwrap())
            .unwrap();
        thread::sleep(Duration::from_millis(5));
    }

    let created = created_at(&conn);
    assert_eq!(created.len(), 3);
    assert!(created.windows(2).all(|pair| pair[0] < pair[1]), "{created:?}");

    let renamed = json!({"id": "pet-1", "name": "Snuffles"});
    assert!(pets.replace_one(renamed.as_object().unwrap()).unwrap());
    let updated_at: i64 = conn
        .query_row(
            "SELECT updated_at FROM documents WHERE collection = 'pets' AND id = 'pet-1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(updated_at > created[0]);
}

fn created_at(conn: &Connection) -> Vec<i64> {
    let mut stmt = conn
        .prepare("SELECT created_at FROM documents WHERE collection = 'pets' ORDER BY rowid;")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}
