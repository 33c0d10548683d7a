//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into named operations.
//! - Keep hosts decoupled from storage details.

pub mod person_service;
