//! Person domain model.
//!
//! # Responsibility
//! - Define the only record type stored by this crate.
//! - Validate required fields before anything reaches the store.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reused.
//! - `name` is non-empty after trimming.
//! - `favorite_foods` is always present, possibly empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a stored person.
pub type PersonId = Uuid;

/// Field set supplied by callers when creating a person.
///
/// Has no `id`: identity is always assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

impl NewPerson {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            favorite_foods: Vec::new(),
        }
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_foods<I, S>(mut self, foods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorite_foods = foods.into_iter().map(Into::into).collect();
        self
    }

    /// Checks required fields.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is blank.
    /// - `NegativeAge` when `age < 0`.
    /// - `EmptyFood` when any favorite food is blank.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_fields(&self.name, self.age, &self.favorite_foods)
    }

    /// Attaches a freshly generated id.
    pub(crate) fn into_person(self) -> Person {
        Person {
            id: Uuid::new_v4(),
            name: self.name,
            age: self.age,
            favorite_foods: self.favorite_foods,
        }
    }
}

/// Persisted person document.
///
/// Serialized as `{ id, name, age?, favoriteFoods }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

impl Person {
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_fields(&self.name, self.age, &self.favorite_foods)
    }

    /// Appends one food to the end of `favorite_foods`.
    pub fn add_favorite_food(&mut self, food: impl Into<String>) {
        self.favorite_foods.push(food.into());
    }
}

/// Field-level validation failure for person records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    EmptyName,
    NegativeAge(i64),
    EmptyFood { index: usize },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "person name cannot be empty"),
            Self::NegativeAge(age) => write!(f, "person age cannot be negative, got {age}"),
            Self::EmptyFood { index } => {
                write!(f, "favorite food at index {index} cannot be empty")
            }
        }
    }
}

impl Error for PersonValidationError {}

fn validate_fields(
    name: &str,
    age: Option<i64>,
    foods: &[String],
) -> Result<(), PersonValidationError> {
    if name.trim().is_empty() {
        return Err(PersonValidationError::EmptyName);
    }
    if let Some(age) = age.filter(|age| *age < 0) {
        return Err(PersonValidationError::NegativeAge(age));
    }
    if let Some(index) = foods.iter().position(|food| food.trim().is_empty()) {
        return Err(PersonValidationError::EmptyFood { index });
    }
    Ok(())
}
