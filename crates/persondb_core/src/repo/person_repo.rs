//! Person repository contract and document-store implementation.
//!
//! # Responsibility
//! - Provide typed CRUD over the `people` collection.
//! - Keep document encoding inside the persistence boundary.
//!
//! # Invariants
//! - Ids are generated here, never accepted from callers on create.
//! - Decoded documents are validated; invalid stored state is an error.
//! - `save_person` replaces the whole document (last writer wins).

use crate::model::person::{NewPerson, Person, PersonId, PersonValidationError};
use crate::store::{Collection, Document, FieldUpdate, Filter, FindOptions, StoreError};
use log::debug;
use rusqlite::Connection;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collection holding person documents.
pub const PEOPLE_COLLECTION: &str = "people";

pub(crate) const NAME_FIELD: &str = "name";
pub(crate) const AGE_FIELD: &str = "age";
pub(crate) const FOODS_FIELD: &str = "favoriteFoods";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository failure surfaced to callers.
#[derive(Debug)]
pub enum RepoError {
    Validation(PersonValidationError),
    /// Query failed or the filter was malformed.
    Read(StoreError),
    /// Insert, update or delete failed.
    Write(StoreError),
    /// The operation needed a match and found none.
    NotFound(String),
    /// Caller-supplied id is not a valid person id.
    InvalidId(String),
    InvalidData(String),
}

impl RepoError {
    fn read(err: StoreError) -> Self {
        Self::Read(err)
    }

    fn write(err: StoreError) -> Self {
        Self::Write(err)
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Read(err) => write!(f, "read failed: {err}"),
            Self::Write(err) => write!(f, "write failed: {err}"),
            Self::NotFound(target) => write!(f, "person not found: {target}"),
            Self::InvalidId(raw) => write!(f, "invalid person id `{raw}`"),
            Self::InvalidData(message) => write!(f, "invalid stored person: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::NotFound(_) | Self::InvalidId(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Outcome of a filter delete. Zero is a valid count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: usize,
}

/// Repository interface for person records.
pub trait PersonRepository {
    /// Stores one new person and returns it with its assigned id.
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person>;
    /// Stores all people in input order, or none of them.
    fn create_people(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>>;
    /// Returns the earliest stored person listing `food` as a favorite.
    fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>>;
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Overwrites the stored document with `person`.
    fn save_person(&self, person: &Person) -> RepoResult<()>;
    /// Sets `age` on the first person named `name`; returns the post-image.
    fn set_age_by_name(&self, name: &str, age: i64) -> RepoResult<Person>;
    /// Deletes by id and returns the pre-deletion snapshot.
    fn remove_by_id(&self, id: PersonId) -> RepoResult<Person>;
    fn remove_by_name(&self, name: &str) -> RepoResult<DeleteSummary>;
    /// Runs a composed find; results keep only projected fields.
    fn query(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>>;
}

/// Person repository backed by the embedded document store.
pub struct SqlitePersonRepository<'conn> {
    people: Collection<'conn>,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            people: Collection::new(conn, PEOPLE_COLLECTION),
        }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person> {
        person.validate()?;

        let person = person.clone().into_person();
        self.people
            .insert_one(&encode_person(&person)?)
            .map_err(RepoError::write)?;
        debug!("event=person_create module=repo status=ok id={}", person.id);
        Ok(person)
    }

    fn create_people(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        for person in people {
            person.validate()?;
        }

        let people: Vec<Person> = people.iter().cloned().map(NewPerson::into_person).collect();
        let documents = people
            .iter()
            .map(encode_person)
            .collect::<RepoResult<Vec<_>>>()?;
        self.people
            .insert_many(&documents)
            .map_err(RepoError::write)?;
        Ok(people)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        let documents = self
            .people
            .find(&Filter::all().eq(NAME_FIELD, name), &FindOptions::default())
            .map_err(RepoError::read)?;
        documents.into_iter().map(decode_person).collect()
    }

    fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        self.people
            .find_one(&Filter::all().eq(FOODS_FIELD, food))
            .map_err(RepoError::read)?
            .map(decode_person)
            .transpose()
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.people
            .find_by_id(&id.to_string())
            .map_err(RepoError::read)?
            .map(decode_person)
            .transpose()
    }

    fn save_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        let replaced = self
            .people
            .replace_one(&encode_person(person)?)
            .map_err(RepoError::write)?;
        if !replaced {
            return Err(RepoError::NotFound(format!("id={}", person.id)));
        }
        Ok(())
    }

    fn set_age_by_name(&self, name: &str, age: i64) -> RepoResult<Person> {
        if age < 0 {
            return Err(PersonValidationError::NegativeAge(age).into());
        }

        let updated = self
            .people
            .find_one_and_update(
                &Filter::all().eq(NAME_FIELD, name),
                &[FieldUpdate::set(AGE_FIELD, age)],
            )
            .map_err(RepoError::write)?;
        match updated {
            Some(document) => decode_person(document),
            None => Err(RepoError::NotFound(format!("name={name}"))),
        }
    }

    fn remove_by_id(&self, id: PersonId) -> RepoResult<Person> {
        let removed = self
            .people
            .find_by_id_and_remove(&id.to_string())
            .map_err(RepoError::write)?;
        match removed {
            Some(document) => decode_person(document),
            None => Err(RepoError::NotFound(format!("id={id}"))),
        }
    }

    fn remove_by_name(&self, name: &str) -> RepoResult<DeleteSummary> {
        let deleted_count = self
            .people
            .delete_many(&Filter::all().eq(NAME_FIELD, name))
            .map_err(RepoError::write)?;
        Ok(DeleteSummary { deleted_count })
    }

    fn query(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>> {
        self.people.find(filter, options).map_err(RepoError::read)
    }
}

fn encode_person(person: &Person) -> RepoResult<Document> {
    match serde_json::to_value(person) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(RepoError::InvalidData(format!(
            "person `{}` did not encode as an object",
            person.id
        ))),
        Err(err) => Err(RepoError::Write(StoreError::Serialization(err))),
    }
}

fn decode_person(document: Document) -> RepoResult<Person> {
    let person: Person = serde_json::from_value(Value::Object(document))
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    person
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("person `{}`: {err}", person.id)))?;
    Ok(person)
}
