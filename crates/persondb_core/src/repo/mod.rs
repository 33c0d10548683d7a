//! Repository layer over the document store.
//!
//! # Responsibility
//! - Expose typed record access while keeping query details in `store`.
//! - Map storage failures onto read/write/not-found semantics.
//!
//! # Invariants
//! - Write paths validate records before touching the store.
//! - Errors are returned to the caller, never logged-and-dropped.

pub mod person_repo;
