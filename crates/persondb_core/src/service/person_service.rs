//! Person use-case service.
//!
//! # Responsibility
//! - Expose the named person operations used by hosts (CLI, tests).
//! - Supply the fixed inputs each operation is defined with.
//!
//! # Invariants
//! - Every call returns exactly once with a value or an error.
//! - Service APIs never bypass repository validation.

use crate::model::person::{NewPerson, Person, PersonId};
use crate::repo::person_repo::{
    DeleteSummary, PersonRepository, RepoError, RepoResult, AGE_FIELD, FOODS_FIELD, NAME_FIELD,
};
use crate::store::{Document, Filter, FindOptions, Projection, SortSpec};

/// Food appended by `find_edit_then_save`.
pub const FOOD_TO_ADD: &str = "hamburger";
/// Age assigned by `find_and_update`.
pub const AGE_TO_SET: i64 = 20;
/// Name removed by `remove_many_people`.
pub const NAME_TO_REMOVE: &str = "Mary";
/// Food searched by `query_chain`.
pub const FOOD_TO_SEARCH: &str = "burrito";
/// Maximum results returned by `query_chain`.
pub const QUERY_CHAIN_LIMIT: u32 = 2;

/// Person created by `create_and_save_person`.
pub fn default_person() -> NewPerson {
    NewPerson::new("Beth")
        .with_age(38)
        .with_foods(["peaches", "tacos", "croissants"])
}

/// Seed set used by `create_many_people` hosts.
pub fn sample_people() -> Vec<NewPerson> {
    vec![
        NewPerson::new("Jerry")
            .with_age(39)
            .with_foods(["sandwiches", "chips", "ice cream"]),
        NewPerson::new("Summer")
            .with_age(19)
            .with_foods(["cherries", "pizza", "chocolate"]),
        NewPerson::new("Morty")
            .with_age(17)
            .with_foods(["nachos", "almonds", "soup"]),
    ]
}

/// Parses a caller-supplied person id.
pub fn parse_person_id(raw: &str) -> RepoResult<PersonId> {
    PersonId::parse_str(raw.trim()).map_err(|_| RepoError::InvalidId(raw.to_string()))
}

/// Use-case wrapper for person operations.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves the default person (see [`default_person`]).
    pub fn create_and_save_person(&self) -> RepoResult<Person> {
        self.repo.create_person(&default_person())
    }

    /// Saves one caller-supplied person.
    pub fn create_person(&self, person: &NewPerson) -> RepoResult<Person> {
        self.repo.create_person(person)
    }

    /// Saves all people in input order.
    ///
    /// # Contract
    /// - All-or-nothing: the first invalid or failing entry aborts the batch
    ///   and nothing is stored.
    pub fn create_many_people(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        self.repo.create_people(people)
    }

    /// Returns every person named `name`; no match is an empty list.
    pub fn find_people_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        self.repo.find_by_name(name)
    }

    pub fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        self.repo.find_one_by_food(food)
    }

    /// Looks a person up by id text.
    ///
    /// # Errors
    /// - `InvalidId` when `id` is not a well-formed id. A well-formed id
    ///   with no record yields `Ok(None)`.
    pub fn find_person_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        self.repo.find_by_id(parse_person_id(id)?)
    }

    /// Loads a person, appends [`FOOD_TO_ADD`], and writes the record back.
    ///
    /// # Contract
    /// - Read-modify-write, not atomic. A concurrent write to the same id
    ///   between load and save is overwritten (last writer wins).
    /// - Missing id yields `NotFound`.
    pub fn find_edit_then_save(&self, id: &str) -> RepoResult<Person> {
        let id = parse_person_id(id)?;
        let mut person = self
            .repo
            .find_by_id(id)?
            .ok_or_else(|| RepoError::NotFound(format!("id={id}")))?;

        person.add_favorite_food(FOOD_TO_ADD);
        self.repo.save_person(&person)?;
        Ok(person)
    }

    /// Sets `age` to [`AGE_TO_SET`] on the first person named `name`.
    ///
    /// Returns the record as it is after the update.
    pub fn find_and_update(&self, name: &str) -> RepoResult<Person> {
        self.repo.set_age_by_name(name, AGE_TO_SET)
    }

    /// Deletes by id text and returns the record as it was before deletion.
    pub fn remove_by_id(&self, id: &str) -> RepoResult<Person> {
        self.repo.remove_by_id(parse_person_id(id)?)
    }

    /// Deletes every person named [`NAME_TO_REMOVE`].
    pub fn remove_many_people(&self) -> RepoResult<DeleteSummary> {
        self.repo.remove_by_name(NAME_TO_REMOVE)
    }

    /// Chained query for [`FOOD_TO_SEARCH`].
    pub fn query_chain(&self) -> RepoResult<Vec<Document>> {
        self.query_chain_for(FOOD_TO_SEARCH)
    }

    /// People who like `food`: sorted by name, at most two, without `age`.
    pub fn query_chain_for(&self, food: &str) -> RepoResult<Vec<Document>> {
        let filter = Filter::all().eq(FOODS_FIELD, food);
        let options = FindOptions::default()
            .sort(SortSpec::ascending(NAME_FIELD))
            .limit(QUERY_CHAIN_LIMIT)
            .projection(Projection::exclude([AGE_FIELD]));
        self.repo.query(&filter, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::{default_person, parse_person_id, sample_people};
    use crate::repo::person_repo::{RepoError, AGE_FIELD, FOODS_FIELD, NAME_FIELD};

    #[test]
    fn fixed_inputs_are_valid() {
        assert!(default_person().validate().is_ok());
        let people = sample_people();
        assert_eq!(people.len(), 3);
        assert!(people.iter().all(|person| person.validate().is_ok()));
    }

    #[test]
    fn parse_person_id_rejects_malformed_text() {
        let err = parse_person_id("5f2b").unwrap_err();
        assert!(matches!(err, RepoError::InvalidId(raw) if raw == "5f2b"));
    }

    #[test]
    fn query_field_names_match_person_wire_keys() {
        let person = default_person().into_person();
        let encoded = serde_json::to_value(&person).unwrap();
        let document = encoded.as_object().unwrap();
        for field in [NAME_FIELD, AGE_FIELD, FOODS_FIELD] {
            assert!(document.contains_key(field), "missing wire key {field}");
        }
    }
}
