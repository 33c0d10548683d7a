//! Domain records persisted through the document store.
//!
//! # Invariants
//! - Every stored record carries a store-assigned `PersonId`.

pub mod person;
